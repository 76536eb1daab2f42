// lib/src/errors.rs

use models::errors::RecordError;
use thiserror::Error;

/// Outcome of an access-controlled prescription operation.
///
/// The message carried by every variant but `Storage` is safe
/// to show to the caller. `Storage` wraps an internal fault whose detail must
/// stay server-side.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The actor's role may not perform the operation.
    #[error("{0}")]
    Forbidden(&'static str),
    /// The actor is authenticated but does not own the record.
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    /// The request body could not be read as the expected payload.
    #[error("{0}")]
    InvalidPayload(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] RecordError),
}

pub type AccessResult<T> = std::result::Result<T, AccessError>;
