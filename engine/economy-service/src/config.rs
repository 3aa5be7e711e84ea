//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use auto_lock_scheduler::SchedulerConfig;
use budget_ledger::LedgerConfig;
use pricing_engine::PricingConfig;
use team_store::StoreConfig;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pricing: PricingConfig,

    pub ledger: LedgerConfig,

    pub scheduler: SchedulerConfig,

    pub store: StoreConfig,

    /// Service-level configuration
    pub service: ServiceSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// JSON file with races, assets and league policies loaded at startup
    pub seed_file: Option<PathBuf>,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { seed_file: None, shutdown_timeout_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Load configuration from an optional TOML file and the environment.
///
/// Without a file each component reads its own environment keys. With a file,
/// nested keys can be overridden as `ECONOMY__LEDGER__STARTING_BUDGET`.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => ServiceConfig {
            pricing: PricingConfig::from_env().context("Invalid pricing configuration")?,
            ledger: LedgerConfig::from_env().context("Invalid ledger configuration")?,
            scheduler: SchedulerConfig::from_env().context("Invalid scheduler configuration")?,
            store: StoreConfig::from_env().context("Invalid store configuration")?,
            ..ServiceConfig::default()
        },
    };

    load_from_env(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    tracing::debug!("Loading configuration from file: {:?}", path);
    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("ECONOMY").prefix_separator("__").separator("__"))
        .build()
        .with_context(|| format!("Failed to read configuration file {:?}", path))?
        .try_deserialize()
        .with_context(|| format!("Invalid configuration in {:?}", path))
}

/// Service-level environment overrides
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    if let Ok(level) = std::env::var("ECONOMY_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("ECONOMY_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(seed) = std::env::var("ECONOMY_SEED_FILE") {
        config.service.seed_file = Some(PathBuf::from(seed));
    }

    if let Ok(timeout) = std::env::var("ECONOMY_SHUTDOWN_TIMEOUT_SECS") {
        config.service.shutdown_timeout_secs =
            timeout.parse().context("ECONOMY_SHUTDOWN_TIMEOUT_SECS must be a number of seconds")?;
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    config.pricing.validate().context("Invalid pricing configuration")?;
    config.ledger.validate().context("Invalid ledger configuration")?;
    config.scheduler.validate().context("Invalid scheduler configuration")?;
    config.store.validate().context("Invalid store configuration")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use team_store::StoreBackend;

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("economy.toml");
        std::fs::write(
            &path,
            r#"
[ledger]
starting_budget = 1200

[scheduler]
interval_secs = 300

[store]
backend = "file"
data_dir = "/var/lib/economy"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.ledger.starting_budget, 1200);
        assert_eq!(config.ledger.team_size, 5);
        assert_eq!(config.scheduler.interval_secs, 300);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.pricing.max_price, 500);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_log_format_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());
    }
}
