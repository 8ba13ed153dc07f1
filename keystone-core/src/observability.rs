//! Observability utilities: logging and lifecycle metrics.

use crate::config::{AppConfig, ObservabilityConfig};
use anyhow::Context as _;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Counters recorded by the lifecycle decorators
pub const LIFECYCLE_COUNTERS: [(&str, &str); 3] = [
    (
        "keystone_components_created_total",
        "Components built by factories on lookup misses",
    ),
    (
        "keystone_components_opened_total",
        "Components opened by the run decorator",
    ),
    (
        "keystone_components_closed_total",
        "Components closed by the run decorator",
    ),
];

/// Keeps the metrics exporter alive; aborts it on drop
#[derive(Default)]
pub struct ObservabilityGuard {
    metrics: Option<PrometheusHandle>,
    exporter: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ObservabilityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservabilityGuard")
            .field("metrics", &self.metrics.is_some())
            .field("exporter", &self.exporter)
            .finish()
    }
}

impl ObservabilityGuard {
    /// Current metrics in Prometheus text format, when metrics are enabled
    pub fn metrics_snapshot(&self) -> Option<String> {
        self.metrics.as_ref().map(|handle| handle.render())
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(task) = self.exporter.take() {
            task.abort();
        }
    }
}

/// Install the tracing subscriber and, when enabled, the Prometheus exporter.
/// Must run inside a tokio runtime.
pub fn init_observability(config: &AppConfig) -> anyhow::Result<ObservabilityGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer: Box<dyn Layer<_> + Send + Sync> = if config.observability.log_json {
        fmt::layer()
            .json()
            .with_target(false)
            .with_thread_ids(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    let guard = if config.observability.metrics_enabled {
        install_metrics(&config.observability)?
    } else {
        ObservabilityGuard::default()
    };

    info!("Observability initialized for {}", config.service.name);
    Ok(guard)
}

fn install_metrics(config: &ObservabilityConfig) -> anyhow::Result<ObservabilityGuard> {
    let bind = metrics_addr(config)?;
    let (recorder, exporter) = PrometheusBuilder::new().with_http_listener(bind).build()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| anyhow::anyhow!("a metrics recorder is already installed"))?;

    for (name, description) in LIFECYCLE_COUNTERS {
        metrics::describe_counter!(name, description);
    }

    let exporter = tokio::spawn(async move {
        if let Err(err) = exporter.await {
            warn!("Metrics exporter stopped: {}", err);
        }
    });
    info!("Metrics exporter listening on {}", bind);

    Ok(ObservabilityGuard {
        metrics: Some(handle),
        exporter: Some(exporter),
    })
}

fn metrics_addr(config: &ObservabilityConfig) -> anyhow::Result<SocketAddr> {
    config
        .metrics_bind
        .parse()
        .with_context(|| format!("invalid metrics_bind '{}'", config.metrics_bind))
}
