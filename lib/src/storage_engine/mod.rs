// lib/src/storage_engine/mod.rs

pub mod config;
pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;
pub mod storage_utils;
pub mod user_storage;

pub use config::{StorageConfig, StorageEngineType, DEFAULT_DATA_DIRECTORY};
pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::{open_sled_db, SledPrescriptionStorage};
pub use storage_engine::{PrescriptionFilter, PrescriptionStore, SortDirection};
pub use user_storage::{SledUserStorage, UserDirectory};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// The two collaborators the prescription service reads and writes through.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserDirectory>,
    pub prescriptions: Arc<dyn PrescriptionStore>,
}

/// Creates the storage engines selected by the configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Storage> {
    match config.engine_type()? {
        StorageEngineType::Sled => {
            let db_path = config.data_directory.join("sled");
            let db = open_sled_db(&db_path)
                .with_context(|| format!("Failed to open Sled database at {}", db_path.display()))?;
            let users = SledUserStorage::new(&db)?;
            let prescriptions = SledPrescriptionStorage::new(&db, users.clone())?;
            info!("Using Sled storage at {}", db_path.display());
            Ok(Storage {
                users: Arc::new(users),
                prescriptions: Arc::new(prescriptions),
            })
        }
        StorageEngineType::InMemory => {
            // Records are lost when the process exits.
            let storage = InMemoryStorage::new();
            info!("Using in-memory storage");
            Ok(Storage {
                users: Arc::new(storage.clone()),
                prescriptions: Arc::new(storage),
            })
        }
    }
}
