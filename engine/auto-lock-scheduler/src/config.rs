//! Configuration for the AutoLockScheduler

use crate::error::SchedulerError;
use crate::{DEFAULT_HORIZON_SECS, DEFAULT_INTERVAL_SECS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the AutoLockScheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between runs
    pub interval_secs: u64,

    /// How far ahead of now a qualifying session may start and still be picked up
    pub horizon_secs: u64,

    /// Retry behaviour for every store call
    pub retry: RetryPolicy,
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Delay before the second attempt; grows linearly after that
    pub backoff_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            horizon_secs: DEFAULT_HORIZON_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 500 }
    }
}

impl RetryPolicy {
    /// Delay before `attempt` (1-based) is retried
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.horizon_secs as i64)
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, SchedulerError> {
        let mut config = Self::default();

        if let Some(secs) = env_parse("AUTO_LOCK_INTERVAL_SECS")? {
            config.interval_secs = secs;
        }
        if let Some(secs) = env_parse("AUTO_LOCK_HORIZON_SECS")? {
            config.horizon_secs = secs;
        }
        if let Some(attempts) = env_parse("AUTO_LOCK_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = env_parse("AUTO_LOCK_BACKOFF_MS")? {
            config.retry.backoff_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, SchedulerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::Config(format!("Failed to read {}: {}", path, e)))?;
        let config: SchedulerConfig =
            toml::from_str(&content).map_err(|e| SchedulerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.interval_secs == 0 {
            return Err(SchedulerError::Config("interval_secs must be greater than 0".to_string()));
        }
        if self.horizon_secs == 0 {
            return Err(SchedulerError::Config("horizon_secs must be greater than 0".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SchedulerError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, SchedulerError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| SchedulerError::Config(format!("Invalid {}", key))),
        Err(_) => Ok(None),
    }
}
