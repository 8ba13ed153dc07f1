//! Locators and the strategy used to compare them

use crate::descriptor::Descriptor;
use std::fmt;

/// Key used to find a component in a reference store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Typed descriptor, eligible for auto-creation
    Descriptor(Descriptor),
    /// Opaque key without type information
    Key(String),
}

impl Locator {
    pub fn as_descriptor(&self) -> Option<&Descriptor> {
        match self {
            Locator::Descriptor(descriptor) => Some(descriptor),
            Locator::Key(_) => None,
        }
    }

    /// Locator to store a built component under: the query with its
    /// wildcards filled from the factory's registered descriptor.
    /// Keys and mixed pairs keep the query as is.
    pub fn clarify(&self, registered: &Locator) -> Locator {
        match (self, registered) {
            (Locator::Descriptor(query), Locator::Descriptor(registered)) => {
                Locator::Descriptor(query.clarify(registered))
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Descriptor(descriptor) => write!(f, "{}", descriptor),
            Locator::Key(key) => write!(f, "{}", key),
        }
    }
}

impl From<Descriptor> for Locator {
    fn from(descriptor: Descriptor) -> Self {
        Locator::Descriptor(descriptor)
    }
}

impl From<String> for Locator {
    fn from(key: String) -> Self {
        Locator::Key(key)
    }
}

impl From<&str> for Locator {
    fn from(key: &str) -> Self {
        Locator::Key(key.to_string())
    }
}

/// Strategy deciding how locators compare and which ones can be auto-created
pub trait LocatorMatcher: Send + Sync + fmt::Debug {
    /// Whether a stored locator satisfies the query
    fn matches(&self, query: &Locator, stored: &Locator) -> bool;

    /// Whether the locator carries enough type information for a factory
    fn is_constructible(&self, locator: &Locator) -> bool;
}

/// Keys compare by equality, descriptors by wildcard match.
/// Only descriptors are constructible.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorMatcher;

impl LocatorMatcher for DescriptorMatcher {
    fn matches(&self, query: &Locator, stored: &Locator) -> bool {
        match (query, stored) {
            (Locator::Descriptor(query), Locator::Descriptor(stored)) => query.matches(stored),
            (Locator::Key(query), Locator::Key(stored)) => query == stored,
            _ => false,
        }
    }

    fn is_constructible(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::Descriptor(_))
    }
}
