// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;
use models::errors::RecordResult;
use models::medical::{NewPrescription, PopulatedPrescription, Population, Prescription};
use uuid::Uuid;

/// Which prescriptions a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionFilter {
    All,
    Patient(Uuid),
    Doctor(Uuid),
}

impl PrescriptionFilter {
    pub fn matches(&self, record: &Prescription) -> bool {
        match self {
            PrescriptionFilter::All => true,
            PrescriptionFilter::Patient(id) => record.patient_id == *id,
            PrescriptionFilter::Doctor(id) => record.doctor_id == *id,
        }
    }
}

/// Ordering of a listing by `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[async_trait]
pub trait PrescriptionStore: Send + Sync + 'static {
    /// Persists a new prescription, assigning its id and timestamps.
    async fn create(&self, prescription: NewPrescription) -> RecordResult<Prescription>;
    /// Retrieves the raw record.
    async fn find_by_id(&self, id: &Uuid) -> RecordResult<Option<Prescription>>;
    /// Retrieves the record with its user references expanded.
    async fn find_populated(
        &self,
        id: &Uuid,
        population: &Population,
    ) -> RecordResult<Option<PopulatedPrescription>>;
    /// Lists matching records, expanded and ordered by `created_at`.
    async fn find(
        &self,
        filter: PrescriptionFilter,
        population: &Population,
        sort: SortDirection,
    ) -> RecordResult<Vec<PopulatedPrescription>>;
    /// Writes the record back, refreshing `updated_at`, and returns what was stored.
    async fn save(&self, prescription: &Prescription) -> RecordResult<Prescription>;
    /// Removes the record. Fails with `RecordError::NotFound` if it is absent.
    async fn delete(&self, id: &Uuid) -> RecordResult<()>;
}
