// models/src/medical/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

// --- DTO for seeding a user into the directory ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Fixed id for the user; a fresh one is assigned when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
}

// --- Stored User Struct ---
// `doctor_id` and `patient_id` are human-facing display codes, not references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub specialization: Option<String>,
    pub contact: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new `User` from a `NewUser` DTO, assigning its id.
    pub fn from_new_user(new_user: NewUser) -> Self {
        User {
            id: new_user.id.unwrap_or_else(Uuid::new_v4),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            age: new_user.age,
            gender: new_user.gender,
            specialization: new_user.specialization,
            contact: new_user.contact,
            doctor_id: new_user.doctor_id,
            patient_id: new_user.patient_id,
            created_at: Utc::now(),
        }
    }
}

/// A user profile field that can be selected when populating a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Name,
    Email,
    Age,
    Gender,
    Specialization,
    Contact,
    DoctorId,
    PatientId,
}

/// The selected display fields of a referenced user.
///
/// Only the fields requested by the population (and present on the user) are
/// emitted; `id` is always included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl UserSummary {
    /// Projects `user` onto the given field selection.
    pub fn project(user: &User, fields: &[UserField]) -> Self {
        let mut summary = UserSummary {
            id: user.id,
            ..Default::default()
        };
        for field in fields {
            match field {
                UserField::Name => summary.name = Some(user.name.clone()),
                UserField::Email => summary.email = Some(user.email.clone()),
                UserField::Age => summary.age = user.age,
                UserField::Gender => summary.gender = user.gender.clone(),
                UserField::Specialization => summary.specialization = user.specialization.clone(),
                UserField::Contact => summary.contact = user.contact.clone(),
                UserField::DoctorId => summary.doctor_id = user.doctor_id.clone(),
                UserField::PatientId => summary.patient_id = user.patient_id.clone(),
            }
        }
        summary
    }
}
