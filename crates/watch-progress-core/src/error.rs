use thiserror::Error;

/// Failures raised by a storage backend.
///
/// The progress store never hands these to its callers; they are logged and
/// the operation degrades to a no-op or an empty read.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
