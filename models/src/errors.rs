// models/src/errors.rs

pub use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Storage error: {0}")]
    StorageError(String), // General storage operation error

    #[error("record with identifier {0} was not found")]
    NotFound(uuid::Uuid),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sled-errors")]
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[cfg(feature = "bincode-errors")]
    #[error(transparent)]
    BincodeDecode(#[from] bincode::error::DecodeError),
    #[cfg(feature = "bincode-errors")]
    #[error(transparent)]
    BincodeEncode(#[from] bincode::error::EncodeError),
}

/// A type alias for a `Result` that returns a `RecordError` on failure.
pub type RecordResult<T> = Result<T, RecordError>;
