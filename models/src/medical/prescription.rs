// models/src/medical/prescription.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::user::{User, UserField, UserSummary};

/// One entry of a prescription's medicine list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// A stored prescription. `patient_id` and `doctor_id` reference user ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields handed to the store when creating a prescription. The store assigns
/// the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrescription {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub instructions: String,
}

impl NewPrescription {
    pub fn into_prescription(self, id: Uuid, now: DateTime<Utc>) -> Prescription {
        Prescription {
            id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            diagnosis: self.diagnosis,
            medicines: self.medicines,
            instructions: self.instructions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client payload for writing a prescription. `patient_id` is still the raw
/// string the client sent; a missing one is reported as an unknown patient.
/// `null` in any field reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medicines: Vec<Medicine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: String,
}

impl PrescriptionDraft {
    pub fn authored_by(self, patient_id: Uuid, doctor_id: Uuid) -> NewPrescription {
        NewPrescription {
            patient_id,
            doctor_id,
            diagnosis: self.diagnosis,
            medicines: self.medicines,
            instructions: self.instructions,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update of the mutable prescription fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionUpdate {
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub medicines: Option<Vec<Medicine>>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl PrescriptionUpdate {
    /// Applies the update in place.
    ///
    /// A text field is replaced only by a non-empty value: an empty string
    /// keeps the stored text, so it cannot be cleared through this path.
    /// A supplied medicine list always replaces the stored one, even when empty.
    pub fn apply_to(self, record: &mut Prescription) {
        if let Some(diagnosis) = self.diagnosis.filter(|value| !value.is_empty()) {
            record.diagnosis = diagnosis;
        }
        if let Some(medicines) = self.medicines {
            record.medicines = medicines;
        }
        if let Some(instructions) = self.instructions.filter(|value| !value.is_empty()) {
            record.instructions = instructions;
        }
    }
}

/// Which user fields to expand for each reference of a prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub patient: &'static [UserField],
    pub doctor: &'static [UserField],
}

/// A prescription with its user references expanded into display fields.
///
/// A reference whose user no longer exists populates to `null`. The raw ids
/// stay available for authorization but are not serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedPrescription {
    pub id: Uuid,
    #[serde(rename = "patientId")]
    pub patient: Option<UserSummary>,
    #[serde(rename = "doctorId")]
    pub doctor: Option<UserSummary>,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub patient_ref: Uuid,
    #[serde(skip)]
    pub doctor_ref: Uuid,
}

impl PopulatedPrescription {
    pub fn from_record(
        record: Prescription,
        patient: Option<&User>,
        doctor: Option<&User>,
        population: &Population,
    ) -> Self {
        PopulatedPrescription {
            id: record.id,
            patient: patient.map(|user| UserSummary::project(user, population.patient)),
            doctor: doctor.map(|user| UserSummary::project(user, population.doctor)),
            diagnosis: record.diagnosis,
            medicines: record.medicines,
            instructions: record.instructions,
            created_at: record.created_at,
            updated_at: record.updated_at,
            patient_ref: record.patient_id,
            doctor_ref: record.doctor_id,
        }
    }
}
