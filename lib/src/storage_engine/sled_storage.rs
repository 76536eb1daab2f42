// lib/src/storage_engine/sled_storage.rs

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sled::{Db, Tree};
use tracing::{debug, error, info};
use uuid::Uuid;

use models::errors::{RecordError, RecordResult};
use models::medical::{NewPrescription, PopulatedPrescription, Population, Prescription};

use super::storage_engine::{PrescriptionFilter, PrescriptionStore, SortDirection};
use super::storage_utils::{decode_record, encode_record, populate, populate_all, sort_by_created_at};
use super::user_storage::SledUserStorage;

/// Opens (creating if needed) the Sled database under `path`.
pub fn open_sled_db(path: &Path) -> RecordResult<Db> {
    if !path.exists() {
        info!("Creating database directory at {:?}", path);
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        error!("Path {:?} exists but is not a directory", path);
        return Err(RecordError::StorageError(format!("Path {:?} is not a directory", path)));
    }

    let db = sled::Config::new().path(path).open().map_err(|e| {
        error!("Failed to open Sled database at {:?}: {}", path, e);
        RecordError::StorageError(format!("Failed to open Sled database at {:?}: {}", path, e))
    })?;
    info!("Opened Sled database at {:?}", path);
    Ok(db)
}

/// Sled-backed prescription store. Populates references through the users tree
/// of the same database.
#[derive(Clone)]
pub struct SledPrescriptionStorage {
    tree: Tree,
    users: SledUserStorage,
}

impl SledPrescriptionStorage {
    /// Opens the Sled tree named "prescriptions".
    pub fn new(db: &Db, users: SledUserStorage) -> RecordResult<Self> {
        let tree = db.open_tree("prescriptions")?;
        Ok(Self { tree, users })
    }

    fn put(&self, prescription: &Prescription) -> RecordResult<()> {
        let bytes = encode_record(prescription)?;
        self.tree.insert(prescription.id.as_bytes(), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl PrescriptionStore for SledPrescriptionStorage {
    async fn create(&self, prescription: NewPrescription) -> RecordResult<Prescription> {
        let record = prescription.into_prescription(Uuid::new_v4(), Utc::now());
        self.put(&record)?;
        self.tree.flush_async().await?;
        debug!("Stored prescription {}", record.id);
        Ok(record)
    }

    async fn find_by_id(&self, id: &Uuid) -> RecordResult<Option<Prescription>> {
        match self.tree.get(id.as_bytes())? {
            Some(value_ivec) => Ok(Some(decode_record(&value_ivec)?)),
            None => Ok(None),
        }
    }

    async fn find_populated(
        &self,
        id: &Uuid,
        population: &Population,
    ) -> RecordResult<Option<PopulatedPrescription>> {
        match self.find_by_id(id).await? {
            Some(record) => Ok(Some(populate(record, &self.users, population).await?)),
            None => Ok(None),
        }
    }

    async fn find(
        &self,
        filter: PrescriptionFilter,
        population: &Population,
        sort: SortDirection,
    ) -> RecordResult<Vec<PopulatedPrescription>> {
        let mut records = Vec::new();
        for item in self.tree.iter() {
            let (_key_ivec, value_ivec) = item?;
            let record: Prescription = decode_record(&value_ivec)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        sort_by_created_at(&mut records, sort);
        populate_all(records, &self.users, population).await
    }

    async fn save(&self, prescription: &Prescription) -> RecordResult<Prescription> {
        let mut record = prescription.clone();
        record.updated_at = Utc::now();
        self.put(&record)?;
        self.tree.flush_async().await?;
        debug!("Saved prescription {}", record.id);
        Ok(record)
    }

    async fn delete(&self, id: &Uuid) -> RecordResult<()> {
        if self.tree.remove(id.as_bytes())?.is_none() {
            return Err(RecordError::NotFound(*id));
        }
        self.tree.flush_async().await?;
        debug!("Removed prescription {}", id);
        Ok(())
    }
}
