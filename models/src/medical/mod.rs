// models/src/medical/mod.rs

pub mod prescription;
pub mod role;
pub mod user;

pub use prescription::{
    Medicine, NewPrescription, PopulatedPrescription, Population, Prescription, PrescriptionDraft,
    PrescriptionUpdate,
};
pub use role::{Actor, Role};
pub use user::{NewUser, User, UserField, UserSummary};
