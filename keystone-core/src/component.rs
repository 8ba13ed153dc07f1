//! Component capabilities
//!
//! Components are stored as `Arc<dyn Component>`. A component advertises the
//! lifecycle capabilities it supports by overriding the matching `as_*`
//! accessor; the container never guesses.

use crate::{context::Context, locator::Locator, references::References, Result};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A value that can be held by a reference store
pub trait Component: Any + Send + Sync {
    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Name used in diagnostics
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_referenceable(&self) -> Option<&dyn Referenceable> {
        None
    }

    fn as_unreferenceable(&self) -> Option<&dyn Unreferenceable> {
        None
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        None
    }

    fn as_factory(&self) -> Option<&dyn Factory> {
        None
    }
}

impl dyn Component {
    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.type_name())
    }
}

/// Receives the full reference set of its container.
///
/// The references are only borrowed for the duration of the call; resolve
/// dependencies here and keep the resolved components, not the container.
#[async_trait]
pub trait Referenceable: Send + Sync {
    async fn set_references(&self, references: &dyn References) -> Result<()>;
}

/// Releases dependencies obtained in `set_references`
#[async_trait]
pub trait Unreferenceable: Send + Sync {
    async fn unset_references(&self) -> Result<()>;
}

/// Asynchronous open/close lifecycle
#[async_trait]
pub trait Openable: Send + Sync {
    fn is_open(&self) -> bool;

    async fn open(&self, context: &Context) -> Result<()>;

    async fn close(&self, context: &Context) -> Result<()>;
}

/// Creates components on demand
pub trait Factory: Send + Sync {
    /// Returns the registered locator that satisfies the request, if any
    fn can_create(&self, locator: &Locator) -> Option<Locator>;

    fn create(&self, locator: &Locator) -> Result<Arc<dyn Component>>;
}

/// Sets references on every referenceable component, in order.
/// Stops at the first failure.
pub async fn set_references_for(
    references: &dyn References,
    components: &[Arc<dyn Component>],
) -> Result<()> {
    for component in components {
        if let Some(referenceable) = component.as_referenceable() {
            debug!("Setting references on {}", component.type_name());
            referenceable.set_references(references).await?;
        }
    }
    Ok(())
}

/// Unsets references on every unreferenceable component, in order
pub async fn unset_references_for(components: &[Arc<dyn Component>]) -> Result<()> {
    for component in components {
        if let Some(unreferenceable) = component.as_unreferenceable() {
            debug!("Unsetting references on {}", component.type_name());
            unreferenceable.unset_references().await?;
        }
    }
    Ok(())
}

/// Opens every openable component, awaiting each before the next
pub async fn open_all(context: &Context, components: &[Arc<dyn Component>]) -> Result<()> {
    for component in components {
        if let Some(openable) = component.as_openable() {
            debug!(trace_id = %context, "Opening {}", component.type_name());
            openable.open(context).await?;
            metrics::counter!("keystone_components_opened_total").increment(1);
        }
    }
    Ok(())
}

/// Closes every openable component, awaiting each before the next
pub async fn close_all(context: &Context, components: &[Arc<dyn Component>]) -> Result<()> {
    for component in components {
        if let Some(openable) = component.as_openable() {
            debug!(trace_id = %context, "Closing {}", component.type_name());
            openable.close(context).await?;
            metrics::counter!("keystone_components_closed_total").increment(1);
        }
    }
    Ok(())
}

/// True when every openable component reports open
pub fn is_open_all(components: &[Arc<dyn Component>]) -> bool {
    components
        .iter()
        .filter_map(|c| c.as_openable())
        .all(|o| o.is_open())
}
