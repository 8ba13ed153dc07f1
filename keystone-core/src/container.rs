//! Container - builds managed references from configuration

use crate::component::Component;
use crate::config::ContainerConfig;
use crate::context::Context;
use crate::descriptor::Descriptor;
use crate::managed::ManagedReferences;
use crate::references::References;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Hosts a set of components described by a [`ContainerConfig`].
///
/// Factories are added first; `build` puts them into the references and then
/// resolves every configured descriptor, which lets the build layer create
/// the components.
pub struct Container {
    config: ContainerConfig,
    factories: Vec<Arc<dyn Component>>,
    references: Arc<ManagedReferences>,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            factories: Vec::new(),
            references: ManagedReferences::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Register a factory component. Takes effect on the next `build`.
    pub fn add_factory(&mut self, factory: Arc<dyn Component>) {
        self.factories.push(factory);
    }

    pub fn references(&self) -> &Arc<ManagedReferences> {
        &self.references
    }

    /// Put the factories and create every configured component
    pub async fn build(&self) -> Result<()> {
        for (index, factory) in self.factories.iter().enumerate() {
            let locator =
                Descriptor::new("keystone", "factory", "default", index.to_string(), "1.0");
            self.references.put(locator.into(), factory.clone()).await?;
        }

        for entry in &self.config.components {
            let component = self
                .references
                .get_one_required(&entry.descriptor.clone().into())
                .await?;
            debug!("Resolved {} as {}", entry.descriptor, component.type_name());
        }

        info!(
            "Container {} built with {} components",
            self.config.name,
            self.references.get_all().len()
        );
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.references.is_open()
    }

    pub async fn open(&self, context: &Context) -> Result<()> {
        info!(trace_id = %context, "Container {} starting", self.config.name);
        self.references.open(context).await
    }

    pub async fn close(&self, context: &Context) -> Result<()> {
        info!(trace_id = %context, "Container {} stopping", self.config.name);
        self.references.close(context).await
    }
}
