// lib/src/lib.rs

//! Storage engines for users and prescriptions, and the access-controlled
//! prescription service built on top of them.

pub mod errors;
pub mod payload;
pub mod prescription_service;
pub mod storage_engine;

pub use crate::errors::{AccessError, AccessResult};
pub use crate::payload::Payload;
pub use crate::prescription_service::{PrescriptionService, CREATED_POPULATION, LISTED_POPULATION};
pub use crate::storage_engine::{
    create_storage, InMemoryStorage, PrescriptionFilter, PrescriptionStore, SledPrescriptionStorage,
    SledUserStorage, SortDirection, Storage, StorageConfig, StorageEngineType, UserDirectory,
};
