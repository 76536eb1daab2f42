// lib/src/storage_engine/inmemory_storage.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::errors::{RecordError, RecordResult};
use models::medical::{NewPrescription, PopulatedPrescription, Population, Prescription, User};

use super::storage_engine::{PrescriptionFilter, PrescriptionStore, SortDirection};
use super::storage_utils::{populate, populate_all, sort_by_created_at};
use super::user_storage::UserDirectory;

/// Keeps users and prescriptions in process memory. Nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    prescriptions: Arc<RwLock<HashMap<Uuid, Prescription>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored prescriptions.
    pub async fn prescription_count(&self) -> usize {
        self.prescriptions.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryStorage {
    async fn add_user(&self, user: &User) -> RecordResult<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> RecordResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

#[async_trait]
impl PrescriptionStore for InMemoryStorage {
    async fn create(&self, prescription: NewPrescription) -> RecordResult<Prescription> {
        let record = prescription.into_prescription(Uuid::new_v4(), Utc::now());
        self.prescriptions.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &Uuid) -> RecordResult<Option<Prescription>> {
        Ok(self.prescriptions.read().await.get(id).cloned())
    }

    async fn find_populated(
        &self,
        id: &Uuid,
        population: &Population,
    ) -> RecordResult<Option<PopulatedPrescription>> {
        match self.find_by_id(id).await? {
            Some(record) => Ok(Some(populate(record, self, population).await?)),
            None => Ok(None),
        }
    }

    async fn find(
        &self,
        filter: PrescriptionFilter,
        population: &Population,
        sort: SortDirection,
    ) -> RecordResult<Vec<PopulatedPrescription>> {
        let mut records: Vec<Prescription> = {
            let guard = self.prescriptions.read().await;
            guard.values().filter(|record| filter.matches(record)).cloned().collect()
        };
        sort_by_created_at(&mut records, sort);
        populate_all(records, self, population).await
    }

    async fn save(&self, prescription: &Prescription) -> RecordResult<Prescription> {
        let mut record = prescription.clone();
        record.updated_at = Utc::now();
        self.prescriptions.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &Uuid) -> RecordResult<()> {
        match self.prescriptions.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(RecordError::NotFound(*id)),
        }
    }
}
