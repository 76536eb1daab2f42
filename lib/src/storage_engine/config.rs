// lib/src/storage_engine/config.rs

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIRECTORY: &str = "/tmp/prescriptions_data";

/// Enum for the supported storage engine types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngineType {
    Sled,
    InMemory,
}

impl FromStr for StorageEngineType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "memory" | "inmemory" | "in-memory" => Ok(StorageEngineType::InMemory),
            _ => Err(anyhow::anyhow!("Unknown storage engine type: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageEngineType::Sled => f.write_str("sled"),
            StorageEngineType::InMemory => f.write_str("memory"),
        }
    }
}

/// Where and how records are stored. Mirrors the `storage:` section of the
/// service configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_storage_engine_type")]
    pub storage_engine_type: String,
}

fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}

fn default_storage_engine_type() -> String {
    StorageEngineType::Sled.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_directory: default_data_directory(),
            storage_engine_type: default_storage_engine_type(),
        }
    }
}

impl StorageConfig {
    pub fn engine_type(&self) -> anyhow::Result<StorageEngineType> {
        self.storage_engine_type.parse()
    }
}
