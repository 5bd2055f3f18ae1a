//! Retrieval-layer errors.

use palace_core::error::PalaceError;
use palace_storage::StorageError;

/// Errors raised by the keyword/vector retrieval operators.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The query embedding's dimension doesn't match a candidate shard's
    /// stored embedding. Fatal per §4.4: silently truncating or padding
    /// vectors would produce meaningless similarity scores.
    #[error("embedding dimension mismatch: query has {expected}, shard has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

impl From<RetrievalError> for PalaceError {
    fn from(e: RetrievalError) -> Self {
        let message = e.to_string();
        match e {
            RetrievalError::Storage(e) => e.into(),
            RetrievalError::DimensionMismatch { .. } => PalaceError::Fatal(message),
        }
    }
}
