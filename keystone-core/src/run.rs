//! Run decorator - opens and closes openable components

use crate::component::{close_all, open_all, Component};
use crate::context::Context;
use crate::decorator::{pending_components, ReferencesDecorator};
use crate::locator::Locator;
use crate::references::References;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// While open, every openable component is open. Components put while open
/// are opened before `put` returns; removed ones are closed before
/// `remove`/`remove_all` return.
pub struct RunReferencesDecorator<N> {
    base: ReferencesDecorator<N>,
    opened: AtomicBool,
}

impl<N: References> RunReferencesDecorator<N> {
    pub fn new(next: N, top: Weak<dyn References>) -> Self {
        Self {
            base: ReferencesDecorator::new(next, top),
            opened: AtomicBool::new(false),
        }
    }

    pub fn next(&self) -> &N {
        self.base.next()
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// Open components in insertion order, each awaited before the next
    pub async fn open(&self, context: &Context) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let top = self.base.top()?;
        let mut opened: Vec<Arc<dyn Component>> = Vec::new();
        loop {
            let pending = pending_components(top.get_all(), &opened);
            if pending.is_empty() {
                break;
            }
            open_all(context, &pending).await?;
            opened.extend(pending);
        }

        self.opened.store(true, Ordering::SeqCst);
        debug!(trace_id = %context, "Opened {} components", opened.len());
        Ok(())
    }

    pub async fn close(&self, context: &Context) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        let components = self.base.top()?.get_all();
        close_all(context, &components).await?;

        self.opened.store(false, Ordering::SeqCst);
        debug!(trace_id = %context, "Closed {} components", components.len());
        Ok(())
    }
}

#[async_trait]
impl<N: References> References for RunReferencesDecorator<N> {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.base.put(locator, component.clone()).await?;

        if self.is_open() {
            open_all(&Context::empty(), std::slice::from_ref(&component)).await?;
        }
        Ok(())
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        let component = self.base.remove(locator).await?;

        if self.is_open() {
            if let Some(component) = &component {
                close_all(&Context::empty(), std::slice::from_ref(component)).await?;
            }
        }
        Ok(component)
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        let components = self.base.remove_all(locator).await?;

        if self.is_open() {
            close_all(&Context::empty(), &components).await?;
        }
        Ok(components)
    }

    fn get_all_locators(&self) -> Vec<Locator> {
        self.base.get_all_locators()
    }

    fn get_all(&self) -> Vec<Arc<dyn Component>> {
        self.base.get_all()
    }

    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>> {
        self.base.find(locator, required).await
    }
}
