// lib/src/storage_engine/storage_utils.rs

use bincode::{
    config::{self, BigEndian, Configuration, Fixint},
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{de::DeserializeOwned, Serialize};

use models::errors::RecordResult;
use models::medical::{PopulatedPrescription, Population, Prescription};

use super::storage_engine::SortDirection;
use super::user_storage::UserDirectory;

/// Provides a standard bincode configuration.
fn bincode_config() -> Configuration<BigEndian, Fixint> {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

/// Serializes a stored record to bytes using bincode.
pub fn encode_record<T: Serialize>(record: &T) -> RecordResult<Vec<u8>> {
    Ok(encode_to_vec(record, bincode_config())?)
}

/// Deserializes bytes written by `encode_record`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> RecordResult<T> {
    let (record, _) = decode_from_slice(bytes, bincode_config())?;
    Ok(record)
}

/// Orders records by creation time. Ties fall back to the id so listings are stable.
pub fn sort_by_created_at(records: &mut [Prescription], direction: SortDirection) {
    records.sort_by(|a, b| {
        let ordering = a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Expands the patient and doctor references of `record` from the user directory.
pub async fn populate(
    record: Prescription,
    users: &dyn UserDirectory,
    population: &Population,
) -> RecordResult<PopulatedPrescription> {
    let patient = users.get_user_by_id(&record.patient_id).await?;
    let doctor = users.get_user_by_id(&record.doctor_id).await?;
    Ok(PopulatedPrescription::from_record(
        record,
        patient.as_ref(),
        doctor.as_ref(),
        population,
    ))
}

/// Expands every record in order.
pub async fn populate_all(
    records: Vec<Prescription>,
    users: &dyn UserDirectory,
    population: &Population,
) -> RecordResult<Vec<PopulatedPrescription>> {
    let mut populated = Vec::with_capacity(records.len());
    for record in records {
        populated.push(populate(record, users, population).await?);
    }
    Ok(populated)
}
