//! Configuration module for workshop-service.

use crate::error::WorkshopError;
use crate::models::Currency;
use serde::Deserialize;
use service_core::retry::RetryConfig;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkshopConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Only required for the Postgres store.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Retry policy for store transactions that fail with a conflict.
///
/// Every quote and order creation increments the same yearly counter row, so
/// concurrent creations conflict with each other and need several attempts.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_service_name() -> String {
    "workshop-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency() -> String {
    crate::models::DEFAULT_CURRENCY.to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    8
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    1000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            otlp_endpoint: None,
            database: DatabaseConfig::default(),
            retry: RetrySettings::default(),
            default_currency: default_currency(),
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            ..RetryConfig::default()
        }
    }
}

impl WorkshopConfig {
    /// Load from `workshop.{toml,yaml,json}` and `WORKSHOP__*` variables.
    pub fn load() -> Result<Self, WorkshopError> {
        let config: Self = service_core::config::load("workshop", "WORKSHOP")?;
        config.currency().map_err(|e| {
            WorkshopError::Config(anyhow::anyhow!("Invalid default_currency: {}", e))
        })?;
        Ok(config)
    }

    /// The configured default currency, parsed.
    pub fn currency(&self) -> Result<Currency, WorkshopError> {
        Currency::parse(&self.default_currency)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from(&self.retry)
    }

    /// Connection string for the Postgres store.
    pub fn database_url(&self) -> Result<&str, WorkshopError> {
        self.database
            .url
            .as_deref()
            .ok_or_else(|| WorkshopError::Config(anyhow::anyhow!("database.url is required")))
    }
}
