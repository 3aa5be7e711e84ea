//! Configuration for the storage layer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Which store implementation to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

impl std::str::FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(StoreError::config(format!("Unknown store backend: {}", other))),
        }
    }
}

/// Configuration for the storage layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Base directory for the file-backed store
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::Memory, data_dir: PathBuf::from("./data") }
    }
}

impl StoreConfig {
    /// File-backed configuration rooted at `data_dir`
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self { backend: StoreBackend::File, data_dir: data_dir.into() }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Ok(dir) = std::env::var("STORE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn teams_dir(&self) -> PathBuf {
        self.data_dir.join("teams")
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::File && self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::config("data_dir is required for the file store"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("file".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_empty_data_dir_rejected_for_file_store() {
        let config = StoreConfig::file("");
        assert!(config.validate().is_err());
        assert!(StoreConfig::default().validate().is_ok());
    }
}
