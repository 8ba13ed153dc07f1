//! Reference store - ordered (locator, component) pairs

use crate::component::Component;
use crate::locator::{DescriptorMatcher, Locator, LocatorMatcher};
use crate::{KeystoneError, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored (locator, component) pair
#[derive(Debug, Clone)]
pub struct Reference {
    locator: Locator,
    component: Arc<dyn Component>,
}

impl Reference {
    pub fn new(locator: Locator, component: Arc<dyn Component>) -> Self {
        Self { locator, component }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }
}

/// Element of a flat construction list: locators at even indexes,
/// components at odd ones
#[derive(Debug, Clone)]
pub enum Tuple {
    Locator(Locator),
    Component(Arc<dyn Component>),
}

impl From<Locator> for Tuple {
    fn from(locator: Locator) -> Self {
        Tuple::Locator(locator)
    }
}

impl From<Arc<dyn Component>> for Tuple {
    fn from(component: Arc<dyn Component>) -> Self {
        Tuple::Component(component)
    }
}

/// Pair up a flat tuple list
pub fn pair_tuples(tuples: Vec<Tuple>) -> Result<Vec<Reference>> {
    if tuples.len() % 2 != 0 {
        return Err(KeystoneError::InvalidTuples(format!(
            "expected locator/component pairs, got {} values",
            tuples.len()
        )));
    }

    let mut references = Vec::with_capacity(tuples.len() / 2);
    let mut iter = tuples.into_iter();
    while let (Some(locator), Some(component)) = (iter.next(), iter.next()) {
        match (locator, component) {
            (Tuple::Locator(locator), Tuple::Component(component)) => {
                references.push(Reference::new(locator, component));
            }
            _ => {
                return Err(KeystoneError::InvalidTuples(format!(
                    "pair {} is not a locator followed by a component",
                    references.len()
                )));
            }
        }
    }
    Ok(references)
}

/// Locator-based component lookup.
///
/// Lookups are asynchronous because a decorated store may create, link and
/// open a component while resolving a query.
#[async_trait]
pub trait References: Send + Sync {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()>;

    /// Remove the first component matching the locator
    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>>;

    /// Remove every component matching the locator
    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>>;

    fn get_all_locators(&self) -> Vec<Locator>;

    fn get_all(&self) -> Vec<Arc<dyn Component>>;

    /// Every component matching the locator; `required` turns an empty
    /// result into `ReferenceNotFound`
    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>>;

    async fn get_optional(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        self.find(locator, false).await
    }

    async fn get_required(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        self.find(locator, true).await
    }

    async fn get_one_optional(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        let components = self.find(locator, false).await?;
        Ok(components.into_iter().next())
    }

    async fn get_one_required(&self, locator: &Locator) -> Result<Arc<dyn Component>> {
        let components = self.find(locator, true).await?;
        components
            .into_iter()
            .next()
            .ok_or_else(|| KeystoneError::ReferenceNotFound(locator.clone()))
    }
}

/// Bare in-memory store, insertion ordered, no side effects
pub struct ReferenceStore {
    references: RwLock<Vec<Reference>>,
    matcher: Arc<dyn LocatorMatcher>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::with_matcher(Arc::new(DescriptorMatcher))
    }

    pub fn with_matcher(matcher: Arc<dyn LocatorMatcher>) -> Self {
        Self {
            references: RwLock::new(Vec::new()),
            matcher,
        }
    }

    pub fn from_tuples(tuples: Vec<Tuple>) -> Result<Self> {
        let store = Self::new();
        store.write().extend(pair_tuples(tuples)?);
        Ok(store)
    }

    pub fn matcher(&self) -> &Arc<dyn LocatorMatcher> {
        &self.matcher
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert(&self, reference: Reference) {
        self.write().push(reference);
    }

    // A poisoned lock only means a panic happened mid-push; the Vec is still valid.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Reference>> {
        self.references
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Reference>> {
        self.references
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl References for ReferenceStore {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.insert(Reference::new(locator, component));
        Ok(())
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        let mut references = self.write();
        let position = references
            .iter()
            .position(|r| self.matcher.matches(locator, &r.locator));
        Ok(position.map(|index| references.remove(index).component))
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        let mut references = self.write();
        let mut removed = Vec::new();
        references.retain(|r| {
            if self.matcher.matches(locator, &r.locator) {
                removed.push(r.component.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    fn get_all_locators(&self) -> Vec<Locator> {
        self.read().iter().map(|r| r.locator.clone()).collect()
    }

    fn get_all(&self) -> Vec<Arc<dyn Component>> {
        self.read().iter().map(|r| r.component.clone()).collect()
    }

    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>> {
        let components: Vec<Arc<dyn Component>> = self
            .read()
            .iter()
            .filter(|r| self.matcher.matches(locator, &r.locator))
            .map(|r| r.component.clone())
            .collect();

        if required && components.is_empty() {
            return Err(KeystoneError::ReferenceNotFound(locator.clone()));
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use std::any::Any;

    struct Plain(&'static str);

    impl Component for Plain {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn plain(name: &'static str) -> Arc<dyn Component> {
        Arc::new(Plain(name))
    }

    fn name_of(component: &Arc<dyn Component>) -> &'static str {
        component.downcast_ref::<Plain>().map(|p| p.0).unwrap_or("?")
    }

    #[tokio::test]
    async fn test_put_and_find() {
        let store = ReferenceStore::new();
        store.put("A".into(), plain("a1")).await.unwrap();
        store.put("B".into(), plain("b")).await.unwrap();
        store.put("A".into(), plain("a2")).await.unwrap();

        let found = store.get_optional(&"A".into()).await.unwrap();
        let names: Vec<_> = found.iter().map(name_of).collect();
        assert_eq!(names, vec!["a1", "a2"]);

        let one = store.get_one_required(&"A".into()).await.unwrap();
        assert_eq!(name_of(&one), "a1");
        assert_eq!(store.get_all_locators().len(), 3);
    }

    #[tokio::test]
    async fn test_required_lookup_fails_when_missing() {
        let store = ReferenceStore::new();
        let err = store.get_one_required(&"missing".into()).await.unwrap_err();
        assert!(matches!(err, KeystoneError::ReferenceNotFound(_)));
        assert!(store.get_one_optional(&"missing".into()).await.unwrap().is_none());
        assert!(store.get_optional(&"missing".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_takes_first_match_only() {
        let store = ReferenceStore::new();
        store.put("A".into(), plain("a1")).await.unwrap();
        store.put("A".into(), plain("a2")).await.unwrap();

        let removed = store.remove(&"A".into()).await.unwrap().unwrap();
        assert_eq!(name_of(&removed), "a1");
        assert_eq!(store.len(), 1);
        assert!(store.remove(&"B".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_all_with_wildcard() {
        let store = ReferenceStore::new();
        let logger = Descriptor::new("pip", "logger", "console", "default", "1.0");
        let counters = Descriptor::new("pip", "counters", "log", "default", "1.0");
        store.put(logger.into(), plain("logger")).await.unwrap();
        store.put(counters.into(), plain("counters")).await.unwrap();
        store.put("key".into(), plain("keyed")).await.unwrap();

        let pattern: Locator = Descriptor::new("pip", "*", "*", "*", "*").into();
        let removed = store.remove_all(&pattern).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.get_optional(&pattern).await.unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_tuples_rejects_odd_length() {
        let tuples = vec![Tuple::Locator("A".into())];
        assert!(matches!(
            ReferenceStore::from_tuples(tuples),
            Err(KeystoneError::InvalidTuples(_))
        ));

        let tuples = vec![
            Tuple::Locator("A".into()),
            Tuple::Component(plain("a")),
            Tuple::Locator("B".into()),
            Tuple::Component(plain("b")),
        ];
        let store = ReferenceStore::from_tuples(tuples).unwrap();
        assert_eq!(store.len(), 2);
    }
}
