// models/src/lib.rs

//! Domain types shared by the prescriptions workspace: users and their roles,
//! the acting user of a request, prescriptions and the populated views
//! returned to clients.

pub mod errors;
pub mod identifiers;
pub mod medical;

pub use errors::{RecordError, RecordResult};
pub use identifiers::parse_record_id;
pub use medical::{
    Actor, Medicine, NewPrescription, NewUser, PopulatedPrescription, Population, Prescription,
    PrescriptionDraft, PrescriptionUpdate, Role, User, UserField, UserSummary,
};
