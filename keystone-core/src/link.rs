//! Link decorator - pushes the reference set into referenceable components

use crate::component::{set_references_for, unset_references_for, Component};
use crate::context::Context;
use crate::decorator::{pending_components, ReferencesDecorator};
use crate::locator::Locator;
use crate::references::References;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// While open, every referenceable component receives the `top` references:
/// all at once on `open`, and one at a time as they are put.
pub struct LinkReferencesDecorator<N> {
    base: ReferencesDecorator<N>,
    opened: AtomicBool,
}

impl<N: References> LinkReferencesDecorator<N> {
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

    /// Set references on every held component. The flag flips only after all
    /// succeeded, so a failed open can be retried.
    pub async fn open(&self, context: &Context) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let top = self.base.top()?;
        // Linking may build new components through lookups; keep going until
        // nothing unlinked is left.
        let mut linked: Vec<Arc<dyn Component>> = Vec::new();
        loop {
            let pending = pending_components(top.get_all(), &linked);
            if pending.is_empty() {
                break;
            }
            set_references_for(top.as_ref(), &pending).await?;
            linked.extend(pending);
        }

        self.opened.store(true, Ordering::SeqCst);
        debug!(trace_id = %context, "Linked {} components", linked.len());
        Ok(())
    }

    pub async fn close(&self, context: &Context) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        let components = self.base.top()?.get_all();
        unset_references_for(&components).await?;

        self.opened.store(false, Ordering::SeqCst);
        debug!(trace_id = %context, "Unlinked {} components", components.len());
        Ok(())
    }
}

#[async_trait]
impl<N: References> References for LinkReferencesDecorator<N> {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.base.put(locator, component.clone()).await?;

        if self.is_open() {
            if let Some(referenceable) = component.as_referenceable() {
                let top = self.base.top()?;
                referenceable.set_references(top.as_ref()).await?;
            }
        }
        Ok(())
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        let component = self.base.remove(locator).await?;

        if self.is_open() {
            if let Some(component) = &component {
                unset_references_for(std::slice::from_ref(component)).await?;
            }
        }
        Ok(component)
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        let components = self.base.remove_all(locator).await?;

        if self.is_open() {
            unset_references_for(&components).await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Referenceable, Unreferenceable};
    use crate::references::ReferenceStore;
    use std::any::Any;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Linked {
        set_calls: AtomicUsize,
        unset_calls: AtomicUsize,
    }

    impl Component for Linked {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_referenceable(&self) -> Option<&dyn Referenceable> {
            Some(self)
        }

        fn as_unreferenceable(&self) -> Option<&dyn Unreferenceable> {
            Some(self)
        }
    }

    #[async_trait]
    impl Referenceable for Linked {
        async fn set_references(&self, _references: &dyn References) -> Result<()> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl Unreferenceable for Linked {
        async fn unset_references(&self) -> Result<()> {
            self.unset_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn decorator() -> Arc<LinkReferencesDecorator<ReferenceStore>> {
        Arc::new_cyclic(|top: &Weak<LinkReferencesDecorator<ReferenceStore>>| {
            LinkReferencesDecorator::new(ReferenceStore::new(), top.clone())
        })
    }

    #[tokio::test]
    async fn test_open_links_once() {
        let references = decorator();
        let component = Arc::new(Linked::default());
        references.put("A".into(), component.clone()).await.unwrap();
        assert_eq!(component.set_calls.load(Ordering::SeqCst), 0);

        let context = Context::empty();
        references.open(&context).await.unwrap();
        references.open(&context).await.unwrap();
        assert!(references.is_open());
        assert_eq!(component.set_calls.load(Ordering::SeqCst), 1);

        references.close(&context).await.unwrap();
        references.close(&context).await.unwrap();
        assert!(!references.is_open());
        assert_eq!(component.unset_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_put_and_remove_while_open() {
        let references = decorator();
        references.open(&Context::empty()).await.unwrap();

        let component = Arc::new(Linked::default());
        references.put("B".into(), component.clone()).await.unwrap();
        assert_eq!(component.set_calls.load(Ordering::SeqCst), 1);

        references.remove(&"B".into()).await.unwrap();
        assert_eq!(component.unset_calls.load(Ordering::SeqCst), 1);
    }
}
