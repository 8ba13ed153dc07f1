//! References decorator - common base for the lifecycle layers

use crate::component::Component;
use crate::locator::Locator;
use crate::references::References;
use crate::{KeystoneError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// Wraps the next store in the chain and keeps a non-owning handle to the
/// outermost one.
///
/// Every operation delegates verbatim to `next`. Layers that add side effects
/// embed this type and use `top` to dispatch them against the fully decorated
/// view of the container.
pub struct ReferencesDecorator<N> {
    next: N,
    top: Weak<dyn References>,
}

impl<N: References> ReferencesDecorator<N> {
    pub fn new(next: N, top: Weak<dyn References>) -> Self {
        Self { next, top }
    }

    pub fn next(&self) -> &N {
        &self.next
    }

    /// Outermost store of the chain
    pub fn top(&self) -> Result<Arc<dyn References>> {
        self.top.upgrade().ok_or(KeystoneError::ContainerReleased)
    }
}

#[async_trait]
impl<N: References> References for ReferencesDecorator<N> {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.next.put(locator, component).await
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        self.next.remove(locator).await
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        self.next.remove_all(locator).await
    }

    fn get_all_locators(&self) -> Vec<Locator> {
        self.next.get_all_locators()
    }

    fn get_all(&self) -> Vec<Arc<dyn Component>> {
        self.next.get_all()
    }

    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>> {
        self.next.find(locator, required).await
    }
}

/// Components from `all` that are not in `done`, by identity
pub(crate) fn pending_components(
    all: Vec<Arc<dyn Component>>,
    done: &[Arc<dyn Component>],
) -> Vec<Arc<dyn Component>> {
    all.into_iter()
        .filter(|c| !done.iter().any(|d| same_component(c, d)))
        .collect()
}

pub(crate) fn same_component(a: &Arc<dyn Component>, b: &Arc<dyn Component>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
}
