//! Keystone Core Library
//!
//! Managed references for microservice components: a locator-based reference
//! store wrapped in decorators that auto-create, link and open components.

pub mod build;
pub mod component;
pub mod config;
pub mod container;
pub mod context;
pub mod decorator;
pub mod descriptor;
pub mod factory;
pub mod link;
pub mod locator;
pub mod managed;
pub mod observability;
pub mod operations;
pub mod references;
pub mod run;

pub use build::BuildReferencesDecorator;
pub use component::{
    close_all, is_open_all, open_all, set_references_for, unset_references_for, Component,
    Factory, Openable, Referenceable, Unreferenceable,
};
pub use config::{
    load_config, load_config_from_toml, AppConfig, ComponentEntry, ConfigError, ContainerConfig,
    LoggingConfig, ObservabilityConfig, ServiceConfig,
};
pub use container::Container;
pub use context::Context;
pub use decorator::ReferencesDecorator;
pub use descriptor::Descriptor;
pub use factory::{ComponentFactory, CompositeFactory};
pub use link::LinkReferencesDecorator;
pub use locator::{DescriptorMatcher, Locator, LocatorMatcher};
pub use managed::ManagedReferences;
pub use observability::{init_observability, ObservabilityGuard, LIFECYCLE_COUNTERS};
pub use operations::{install_panic_hook, shutdown_signal};
pub use references::{Reference, ReferenceStore, References, Tuple};
pub use run::RunReferencesDecorator;

/// Error type for Keystone
#[derive(Debug, thiserror::Error)]
pub enum KeystoneError {
    #[error("Reference not found: {0}")]
    ReferenceNotFound(Locator),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid reference tuples: {0}")]
    InvalidTuples(String),

    #[error("Failed to create component {locator}: {reason}")]
    CreateFailed { locator: Locator, reason: String },

    #[error("Managed references were released")]
    ContainerReleased,

    #[error(transparent)]
    Component(#[from] anyhow::Error),
}

impl KeystoneError {
    /// Errors caused by the caller's query rather than a component
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            KeystoneError::ReferenceNotFound(_) | KeystoneError::InvalidDescriptor(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KeystoneError>;
