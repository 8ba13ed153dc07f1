//! Factories - registries of component constructors

use crate::component::{Component, Factory};
use crate::locator::{DescriptorMatcher, Locator, LocatorMatcher};
use crate::{KeystoneError, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Constructor = Arc<dyn Fn(&Locator) -> Result<Arc<dyn Component>> + Send + Sync>;

struct Registration {
    locator: Locator,
    constructor: Constructor,
}

/// Ordered list of (locator, constructor) registrations.
///
/// The first registration whose locator matches the request is used.
pub struct ComponentFactory {
    registrations: Vec<Registration>,
    matcher: Arc<dyn LocatorMatcher>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::with_matcher(Arc::new(DescriptorMatcher))
    }

    pub fn with_matcher(matcher: Arc<dyn LocatorMatcher>) -> Self {
        Self {
            registrations: Vec::new(),
            matcher,
        }
    }

    pub fn register<F>(&mut self, locator: impl Into<Locator>, constructor: F)
    where
        F: Fn(&Locator) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            locator: locator.into(),
            constructor: Arc::new(constructor),
        });
    }

    /// Builder-style `register`
    pub fn with<F>(mut self, locator: impl Into<Locator>, constructor: F) -> Self
    where
        F: Fn(&Locator) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        self.register(locator, constructor);
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn registration(&self, locator: &Locator) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| self.matcher.matches(locator, &r.locator))
    }
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locators: Vec<String> = self
            .registrations
            .iter()
            .map(|r| r.locator.to_string())
            .collect();
        f.debug_struct("ComponentFactory")
            .field("registrations", &locators)
            .finish()
    }
}

impl Factory for ComponentFactory {
    fn can_create(&self, locator: &Locator) -> Option<Locator> {
        self.registration(locator).map(|r| r.locator.clone())
    }

    fn create(&self, locator: &Locator) -> Result<Arc<dyn Component>> {
        let registration =
            self.registration(locator)
                .ok_or_else(|| KeystoneError::CreateFailed {
                    locator: locator.clone(),
                    reason: "no matching registration".to_string(),
                })?;
        (registration.constructor)(locator)
    }
}

impl Component for ComponentFactory {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_factory(&self) -> Option<&dyn Factory> {
        Some(self)
    }
}

/// Ordered group of factories; the first one that can create wins
#[derive(Default)]
pub struct CompositeFactory {
    factories: Vec<Arc<dyn Factory>>,
}

impl CompositeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, factory: Arc<dyn Factory>) {
        self.factories.push(factory);
    }

    pub fn remove(&mut self, factory: &Arc<dyn Factory>) {
        self.factories.retain(|f| {
            !std::ptr::eq(Arc::as_ptr(f) as *const u8, Arc::as_ptr(factory) as *const u8)
        });
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Factory for CompositeFactory {
    fn can_create(&self, locator: &Locator) -> Option<Locator> {
        self.factories.iter().find_map(|f| f.can_create(locator))
    }

    fn create(&self, locator: &Locator) -> Result<Arc<dyn Component>> {
        match self.factories.iter().find(|f| f.can_create(locator).is_some()) {
            Some(factory) => factory.create(locator),
            None => Err(KeystoneError::CreateFailed {
                locator: locator.clone(),
                reason: "no factory can create it".to_string(),
            }),
        }
    }
}

impl Component for CompositeFactory {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_factory(&self) -> Option<&dyn Factory> {
        Some(self)
    }
}
