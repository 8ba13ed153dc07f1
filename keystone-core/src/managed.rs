//! Managed references - the composition root of the decorator chain

use crate::build::BuildReferencesDecorator;
use crate::component::Component;
use crate::context::Context;
use crate::link::LinkReferencesDecorator;
use crate::locator::{DescriptorMatcher, Locator, LocatorMatcher};
use crate::references::{pair_tuples, Reference, ReferenceStore, References, Tuple};
use crate::run::RunReferencesDecorator;
use crate::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::{info, warn};

type Chain =
    RunReferencesDecorator<LinkReferencesDecorator<BuildReferencesDecorator<ReferenceStore>>>;

/// Reference container that creates, links and opens its components.
///
/// Lookups and mutations flow Run -> Link -> Build -> store. Every layer's
/// `top` is a weak handle to this instance, so side effects always see the
/// fully decorated view.
///
/// Components are never closed implicitly: call [`close`](Self::close) (or use
/// [`run_scoped`](Self::run_scoped)) before dropping an open container.
pub struct ManagedReferences {
    chain: Chain,
}

impl ManagedReferences {
    /// Empty container with the default descriptor matcher
    pub fn new() -> Arc<Self> {
        Self::build(Arc::new(DescriptorMatcher), Vec::new())
    }

    /// Container pre-populated from alternating locator/component values
    pub fn from_tuples(tuples: Vec<Tuple>) -> Result<Arc<Self>> {
        Self::with_matcher(Arc::new(DescriptorMatcher), tuples)
    }

    pub fn with_matcher(
        matcher: Arc<dyn LocatorMatcher>,
        tuples: Vec<Tuple>,
    ) -> Result<Arc<Self>> {
        Ok(Self::build(matcher, pair_tuples(tuples)?))
    }

    fn build(matcher: Arc<dyn LocatorMatcher>, initial: Vec<Reference>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<ManagedReferences>| {
            let top: Weak<dyn References> = me.clone();
            let store = ReferenceStore::with_matcher(matcher.clone());
            for reference in initial {
                store.insert(reference);
            }
            let build = BuildReferencesDecorator::new(store, top.clone(), matcher);
            let link = LinkReferencesDecorator::new(build, top.clone());
            let run = RunReferencesDecorator::new(link, top);
            Self { chain: run }
        })
    }

    fn link(&self) -> &LinkReferencesDecorator<BuildReferencesDecorator<ReferenceStore>> {
        self.chain.next()
    }

    fn store(&self) -> &ReferenceStore {
        self.link().next().next()
    }

    /// Open only when both linking and running are open
    pub fn is_open(&self) -> bool {
        self.link().is_open() && self.chain.is_open()
    }

    /// Link every component, then open them
    pub async fn open(&self, context: &Context) -> Result<()> {
        info!(trace_id = %context, "Opening managed references");
        self.link().open(context).await?;
        self.chain.open(context).await?;
        info!(
            trace_id = %context,
            "Managed references opened ({} components)",
            self.store().len()
        );
        Ok(())
    }

    /// Close every component, then withdraw their references
    pub async fn close(&self, context: &Context) -> Result<()> {
        info!(trace_id = %context, "Closing managed references");
        self.chain.close(context).await?;
        self.link().close(context).await?;
        info!(trace_id = %context, "Managed references closed");
        Ok(())
    }

    /// Open, run `f`, and close again regardless of the outcome.
    ///
    /// The error of `f` (or of `open`) wins over a close error.
    pub async fn run_scoped<F, Fut, T>(self: &Arc<Self>, context: &Context, f: F) -> Result<T>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = match self.open(context).await {
            Ok(()) => f(self.clone()).await,
            Err(err) => Err(err),
        };

        match (result, self.close(context).await) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!("Close after failure also failed: {}", close_err);
                Err(err)
            }
        }
    }
}

impl Drop for ManagedReferences {
    fn drop(&mut self) {
        if self.link().is_open() || self.chain.is_open() {
            warn!("Managed references dropped while open; components were not closed");
        }
    }
}

#[async_trait]
impl References for ManagedReferences {
    async fn put(&self, locator: Locator, component: Arc<dyn Component>) -> Result<()> {
        self.chain.put(locator, component).await
    }

    async fn remove(&self, locator: &Locator) -> Result<Option<Arc<dyn Component>>> {
        self.chain.remove(locator).await
    }

    async fn remove_all(&self, locator: &Locator) -> Result<Vec<Arc<dyn Component>>> {
        self.chain.remove_all(locator).await
    }

    fn get_all_locators(&self) -> Vec<Locator> {
        self.chain.get_all_locators()
    }

    fn get_all(&self) -> Vec<Arc<dyn Component>> {
        self.chain.get_all()
    }

    async fn find(&self, locator: &Locator, required: bool) -> Result<Vec<Arc<dyn Component>>> {
        self.chain.find(locator, required).await
    }
}
