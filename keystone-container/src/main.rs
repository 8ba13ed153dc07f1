//! Keystone Container - hosts configured components in managed references
//!
//! Loads configuration, creates the components through factories, opens them
//! and keeps them running until Ctrl-C.

mod components;

use components::{default_factory, logger_descriptor, ConsoleLogger, LogCounters};
use keystone_core::{
    init_observability, install_panic_hook, load_config, shutdown_signal, Container, Context,
    Descriptor, Locator, References,
};
use std::sync::Arc;
use tracing::{debug, error, info};

const SERVICE_NAME: &str = "keystone-container";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_panic_hook();

    let config = load_config(SERVICE_NAME)?;
    let observability = init_observability(&config)?;

    info!("Starting {}...", config.service.name);

    let mut container = Container::new(config.container.clone());
    container.add_factory(Arc::new(default_factory()));
    container.build().await?;

    let context = Context::new();
    if let Err(err) = container.open(&context).await {
        error!("Failed to open container {}: {}", container.name(), err);
        container.close(&context).await?;
        return Err(err.into());
    }

    record_startup(&container).await;
    info!("Container {} is running", container.name());

    shutdown_signal().await;

    container.close(&context).await?;
    record_shutdown(&container).await;
    if let Some(snapshot) = observability.metrics_snapshot() {
        debug!("Final metrics:\n{}", snapshot);
    }
    info!("Container {} stopped", container.name());
    Ok(())
}

async fn record_startup(container: &Container) {
    let query: Locator = Descriptor::new("*", "counters", "*", "*", "*").into();
    match container.references().get_one_optional(&query).await {
        Ok(Some(counters)) => {
            if let Some(counters) = counters.downcast_ref::<LogCounters>() {
                counters.increment("container.started");
            }
        }
        Ok(None) => {}
        Err(err) => error!("Counters lookup failed: {}", err),
    }
}

async fn record_shutdown(container: &Container) {
    let query: Locator = logger_descriptor().into();
    if let Ok(Some(logger)) = container.references().get_one_optional(&query).await {
        if let Some(logger) = logger.downcast_ref::<ConsoleLogger>() {
            info!("Console logger wrote {} lines", logger.lines_written());
        }
    }
}
