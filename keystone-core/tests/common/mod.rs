#![allow(dead_code)]

use async_trait::async_trait;
use keystone_core::{
    Component, Context, Descriptor, Factory, KeystoneError, Locator, Openable, Referenceable,
    References, Result, Unreferenceable,
};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of lifecycle calls across components
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Test component with selectable capabilities
pub struct Probe {
    pub name: &'static str,
    log: EventLog,
    referenceable: bool,
    openable: bool,
    fail_open: bool,
    fail_set_references: bool,
    dependency: Option<Locator>,
    open: AtomicBool,
}

impl Probe {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            referenceable: false,
            openable: false,
            fail_open: false,
            fail_set_references: false,
            dependency: None,
            open: AtomicBool::new(false),
        }
    }

    pub fn referenceable(mut self) -> Self {
        self.referenceable = true;
        self
    }

    pub fn openable(mut self) -> Self {
        self.openable = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.openable = true;
        self.fail_open = true;
        self
    }

    pub fn failing_set_references(mut self) -> Self {
        self.referenceable = true;
        self.fail_set_references = true;
        self
    }

    /// Resolve a required dependency inside `set_references`
    pub fn depends_on(mut self, locator: impl Into<Locator>) -> Self {
        self.referenceable = true;
        self.dependency = Some(locator.into());
        self
    }

    pub fn build(self) -> Arc<Probe> {
        Arc::new(self)
    }

    pub fn is_opened(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Component for Probe {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_referenceable(&self) -> Option<&dyn Referenceable> {
        if self.referenceable {
            Some(self)
        } else {
            None
        }
    }

    fn as_unreferenceable(&self) -> Option<&dyn Unreferenceable> {
        if self.referenceable {
            Some(self)
        } else {
            None
        }
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        if self.openable {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Referenceable for Probe {
    async fn set_references(&self, references: &dyn References) -> Result<()> {
        if self.fail_set_references {
            return Err(anyhow::anyhow!("{} refused references", self.name).into());
        }
        if let Some(dependency) = &self.dependency {
            references.get_one_required(dependency).await?;
        }
        self.log.record(format!("{}.set_references", self.name));
        Ok(())
    }
}

#[async_trait]
impl Unreferenceable for Probe {
    async fn unset_references(&self) -> Result<()> {
        self.log.record(format!("{}.unset_references", self.name));
        Ok(())
    }
}

#[async_trait]
impl Openable for Probe {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open(&self, _context: &Context) -> Result<()> {
        if self.fail_open {
            return Err(anyhow::anyhow!("{} failed to open", self.name).into());
        }
        tokio::task::yield_now().await;
        self.open.store(true, Ordering::SeqCst);
        self.log.record(format!("{}.open", self.name));
        Ok(())
    }

    async fn close(&self, _context: &Context) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        self.log.record(format!("{}.close", self.name));
        Ok(())
    }
}

/// Factory building openable probes, registered as `keystone:logger:<kind>:*:1.0`
pub struct LoggerFactory {
    log: EventLog,
    kind: &'static str,
    product: &'static str,
    fail: bool,
}

impl LoggerFactory {
    pub fn new(log: &EventLog) -> Self {
        Self::producing("logger", "probe", log)
    }

    /// Builds probes named `product` for the given logger kind
    pub fn producing(product: &'static str, kind: &'static str, log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            kind,
            product,
            fail: false,
        }
    }

    pub fn failing(log: &EventLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    pub fn registered(&self) -> Descriptor {
        Descriptor::new("keystone", "logger", self.kind, "*", "1.0")
    }
}

impl Component for LoggerFactory {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_factory(&self) -> Option<&dyn Factory> {
        Some(self)
    }
}

impl Factory for LoggerFactory {
    fn can_create(&self, locator: &Locator) -> Option<Locator> {
        let registered = self.registered();
        match locator.as_descriptor() {
            Some(descriptor) if descriptor.matches(&registered) => Some(registered.into()),
            _ => None,
        }
    }

    fn create(&self, locator: &Locator) -> Result<Arc<dyn Component>> {
        if self.fail {
            return Err(KeystoneError::CreateFailed {
                locator: locator.clone(),
                reason: "logger backend unavailable".to_string(),
            });
        }
        self.log.record(format!("{}.create", self.kind));
        Ok(Probe::new(self.product, &self.log)
            .referenceable()
            .openable()
            .build())
    }
}
