//! Demo components hosted by the container

use async_trait::async_trait;
use keystone_core::{
    Component, ComponentFactory, Context, Descriptor, Openable, Referenceable, References,
    Result, Unreferenceable,
};
use serde_json::json;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

pub fn logger_descriptor() -> Descriptor {
    Descriptor::new("keystone", "logger", "console", "*", "1.0")
}

pub fn counters_descriptor() -> Descriptor {
    Descriptor::new("keystone", "counters", "log", "*", "1.0")
}

/// Factory for every demo component
pub fn default_factory() -> ComponentFactory {
    ComponentFactory::new()
        .with(logger_descriptor(), |_| {
            Ok(Arc::new(ConsoleLogger::default()) as Arc<dyn Component>)
        })
        .with(counters_descriptor(), |_| {
            Ok(Arc::new(LogCounters::default()) as Arc<dyn Component>)
        })
}

/// Writes messages through tracing.
///
/// Logging does not depend on the open state: components closed after the
/// logger still flush their output through it.
#[derive(Default)]
pub struct ConsoleLogger {
    open: AtomicBool,
    lines: AtomicU64,
}

impl ConsoleLogger {
    pub fn log(&self, source: &str, message: &str) {
        info!(source, "{}", message);
        self.lines.fetch_add(1, Ordering::SeqCst);
    }

    pub fn lines_written(&self) -> u64 {
        self.lines.load(Ordering::SeqCst)
    }
}

impl Component for ConsoleLogger {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        Some(self)
    }
}

#[async_trait]
impl Openable for ConsoleLogger {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open(&self, _context: &Context) -> Result<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self, _context: &Context) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Counts named events and dumps them to the logger on close
#[derive(Default)]
pub struct LogCounters {
    logger: Mutex<Option<Arc<dyn Component>>>,
    counters: Mutex<BTreeMap<String, u64>>,
    open: AtomicBool,
}

impl LogCounters {
    pub fn increment(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|p| p.into_inner());
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    fn dump(&self) {
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        let logger = self.logger.lock().unwrap_or_else(|p| p.into_inner()).clone();

        if let Some(logger) = logger {
            if let Some(logger) = logger.downcast_ref::<ConsoleLogger>() {
                logger.log("counters", &json!({ "counters": counters }).to_string());
            }
        }
    }
}

impl Component for LogCounters {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_referenceable(&self) -> Option<&dyn Referenceable> {
        Some(self)
    }

    fn as_unreferenceable(&self) -> Option<&dyn Unreferenceable> {
        Some(self)
    }

    fn as_openable(&self) -> Option<&dyn Openable> {
        Some(self)
    }
}

#[async_trait]
impl Referenceable for LogCounters {
    async fn set_references(&self, references: &dyn References) -> Result<()> {
        let logger = references
            .get_one_required(&Descriptor::new("*", "logger", "*", "*", "*").into())
            .await?;
        *self.logger.lock().unwrap_or_else(|p| p.into_inner()) = Some(logger);
        Ok(())
    }
}

#[async_trait]
impl Unreferenceable for LogCounters {
    async fn unset_references(&self) -> Result<()> {
        self.logger.lock().unwrap_or_else(|p| p.into_inner()).take();
        Ok(())
    }
}

#[async_trait]
impl Openable for LogCounters {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open(&self, _context: &Context) -> Result<()> {
        self.open.store(true, Ordering::SeqCst);
        self.increment("counters.opened");
        Ok(())
    }

    async fn close(&self, _context: &Context) -> Result<()> {
        self.increment("counters.closed");
        self.dump();
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}
