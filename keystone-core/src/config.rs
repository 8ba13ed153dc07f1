//! Configuration management for Keystone services

use crate::descriptor::Descriptor;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub container: ContainerConfig,
}

impl AppConfig {
    fn apply_service_name(&mut self, service_name: &str) {
        if self.service.name.trim().is_empty() {
            self.service.name = service_name.to_string();
        }
        if self.container.name.trim().is_empty() {
            self.container.name = self.service.name.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_json: bool,
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_json: false,
            metrics_enabled: false,
            metrics_bind: default_metrics_bind(),
        }
    }
}

fn default_metrics_bind() -> String {
    "127.0.0.1:9000".to_string()
}

/// Components a container resolves at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentEntry {
    pub descriptor: Descriptor,
}

pub fn load_config(service_name: &str) -> ConfigResult<AppConfig> {
    let paths = config_paths(service_name);
    load_config_from_paths(service_name, &paths)
}

fn load_config_from_paths(service_name: &str, paths: &[PathBuf]) -> ConfigResult<AppConfig> {
    let builder = paths.iter().fold(Config::builder(), |builder, path| {
        builder.add_source(File::from(path.as_path()).required(false))
    });
    finish(builder, service_name)
}

/// Load configuration from TOML text, with the same environment overrides
/// as `load_config`
pub fn load_config_from_toml(service_name: &str, toml: &str) -> ConfigResult<AppConfig> {
    let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
    finish(builder, service_name)
}

fn finish(builder: ConfigBuilder<DefaultState>, service_name: &str) -> ConfigResult<AppConfig> {
    let settings = builder
        .add_source(
            Environment::with_prefix("KEYSTONE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let mut config: AppConfig = settings.try_deserialize()?;
    config.apply_service_name(service_name);
    Ok(config)
}

fn config_paths(service_name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let env = std::env::var("KEYSTONE_ENV").unwrap_or_else(|_| "development".to_string());

    paths.push(PathBuf::from("config/default.toml"));
    paths.push(PathBuf::from(format!("config/{}.toml", env)));
    paths.push(PathBuf::from(format!("config/{}.toml", service_name)));

    if let Ok(explicit) = std::env::var("KEYSTONE_CONFIG") {
        paths.push(PathBuf::from(explicit));
    }

    paths
}
