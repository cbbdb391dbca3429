//! Application configuration.
//!
//! Aggregates the store connections and sync options into a single Config
//! struct that can be loaded from YAML files or environment variables.

use serde::Deserialize;

use crate::sync::SyncOptions;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "starsync.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "STARSYNC_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "STARSYNC";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "STARSYNC_LOG";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Unknown analytical backend: {0} (expected sqlite or postgres)")]
    UnknownBackend(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// ERP transactional database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationalConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for OperationalConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/erp".to_string(),
            max_connections: 5,
        }
    }
}

/// Analytical store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyticalBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl std::str::FromStr for AnalyticalBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(AnalyticalBackend::Sqlite),
            "postgres" | "postgresql" => Ok(AnalyticalBackend::Postgres),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Star-schema warehouse and watermark table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalyticalConfig {
    /// `sqlite` or `postgres`.
    pub backend: String,
    pub url: String,
    pub max_connections: u32,
}

impl Default for AnalyticalConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            url: "sqlite:starsync.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl AnalyticalConfig {
    pub fn backend(&self) -> Result<AnalyticalBackend, ConfigError> {
        self.backend.parse()
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub operational: OperationalConfig,
    pub analytical: AnalyticalConfig,
    pub sync: SyncOptions,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `starsync.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix and `__`
    ///    separator, e.g. `STARSYNC__SYNC__RUN_TIMEOUT_SECS=600`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.analytical.backend()?;
        let month = self.sync.calendar.fiscal_year_start_month;
        if !(1..=12).contains(&month) {
            return Err(ConfigError::Invalid(format!(
                "sync.calendar.fiscal_year_start_month must be 1-12, got {month}"
            )));
        }
        if self.sync.calendar.start > self.sync.calendar.end {
            return Err(ConfigError::Invalid(
                "sync.calendar.start is after sync.calendar.end".to_string(),
            ));
        }
        if self.sync.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sync.run_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
