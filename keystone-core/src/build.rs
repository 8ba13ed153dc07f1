//! Build decorator - creates missing components through registered factories

use crate::component::Component;
use crate::decorator::ReferencesDecorator;
use crate::locator::{Locator, LocatorMatcher};
use crate::references::References;
use crate::{KeystoneError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tracing::debug;

/// On a lookup miss, asks the factories held in the store (in insertion
/// order) to create a matching component. The first factory that can create
/// one wins; the new component is put through `top` so the outer layers link
/// and open it.
pub struct BuildReferencesDecorator<N> {
    base: ReferencesDecorator<N>,
    matcher: Arc<dyn LocatorMatcher>,
}

impl<N: References> BuildReferencesDecorator<N> {
    pub fn new(next: N, top: Weak<dyn References>, matcher: Arc<dyn LocatorMatcher>) -> Self {
        Self {
            base: ReferencesDecorator::new(next, top),
            matcher,
        }
    }

    pub fn next(&self) -> &N {
        self.base.next()
    }

    /// First stored factory that can create the locator, with the locator
    /// it registered for the request
    pub fn find_factory(&self, locator: &Locator) -> Option<(Arc<dyn Component>, Locator)> {
        self.base.get_all().into_iter().find_map(|component| {
            let registered = component.as_factory()?.can_create(locator)?;
            Some((component, registered))
        })
    }

    /// Create a component for the locator and register it, if any factory can.
    /// The component is stored under the query clarified by the factory's
    /// registered locator.
    pub async fn create(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        if !self.matcher.is_constructible(locator) {
            return Ok(None);
        }

        let Some((factory, registered)) = self.find_factory(locator) else {
            return Ok(None);
        };
        let Some(factory) = factory.as_factory() else {
            return Ok(None);
        };

        let component = factory.create(locator)?;
        let stored = locator.clarify(&registered);
        debug!("Created {} for {} as {}", component.type_name(), locator, stored);
        metrics::counter!("keystone_components_created_total").increment(1);

        self.base.top()?.put(stored, component.clone()).await?;
        Ok(Some(component))
    }
}

#[async_trait]
impl<N: References> References for BuildReferencesDecorator<N> {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.base.put(locator, component).await
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        self.base.remove(locator).await
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        self.base.remove_all(locator).await
    }

    fn get_all_locators(&self) -> Vec<Locator> {
        self.base.get_all_locators()
    }

    fn get_all(&self) -> Vec<Arc<dyn Component>> {
        self.base.get_all()
    }

    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>> {
        let mut components = self.base.find(locator, false).await?;

        if components.is_empty() {
            if let Some(component) = self.create(locator).await? {
                components.push(component);
            }
        }

        if required && components.is_empty() {
            return Err(KeystoneError::ReferenceNotFound(locator.clone()));
        }
        Ok(components)
    }
}
