//! Storage error types, and their translation to [`palace_core::error::PalaceError`].

use palace_core::error::PalaceError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g., "shard", "edge", "focus").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The database has not been initialized.
    #[error("database not initialized: {reason}")]
    NotInitialized {
        /// Why the database is considered uninitialized.
        reason: String,
    },

    /// A validation constraint was violated.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Adding a `blocked-by` edge would create a cycle (invariant 8).
    #[error("adding this edge would create a cycle")]
    CycleDetected,

    /// A precondition failed: already in_progress/closed/approved, identical
    /// content, snapshot collision, move into own descendant, type mismatch.
    #[error("conflicting state: {0}")]
    Conflict(String),

    /// The database is locked by another process.
    #[error("database locked: {0}")]
    DatabaseLocked(String),

    /// Failed to establish or maintain a database connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A transaction operation failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A schema migration failed.
    #[error("migration {name} failed: {reason}")]
    Migration {
        /// Name of the migration that failed.
        name: String,
        /// Underlying error description.
        reason: String,
    },

    /// Dangling parent FK, missing snapshot shard, or other state that
    /// should be impossible but was observed on read.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    /// A raw SQLite query error.
    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry (e.g., database locked, connection errors).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseLocked(_) | Self::Connection(_) | Self::Transaction(_)
        )
    }
}

/// Translates a storage-layer error into the cross-cutting taxonomy (§7).
/// This is the boundary where `rusqlite`/`serde_json` errors stop being
/// visible to callers outside this crate.
impl From<StorageError> for PalaceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity, id } => PalaceError::NotFound(format!("{entity} {id}")),
            StorageError::Validation { message } => PalaceError::InvalidInput(message),
            StorageError::CycleDetected => PalaceError::ConflictState("cycle detected".into()),
            StorageError::Conflict(msg) => PalaceError::ConflictState(msg),
            StorageError::Inconsistent(msg) => PalaceError::Inconsistent(msg),
            StorageError::NotInitialized { reason } => PalaceError::Unavailable(reason),
            StorageError::DatabaseLocked(msg) => PalaceError::Unavailable(msg),
            StorageError::Connection(msg) => PalaceError::Unavailable(msg),
            StorageError::Transaction(msg) => PalaceError::Unavailable(msg),
            StorageError::Migration { name, reason } => {
                PalaceError::Fatal(format!("migration {name}: {reason}"))
            }
            StorageError::Query(e) => PalaceError::Unavailable(e.to_string()),
            StorageError::Serialization(e) => PalaceError::InvalidInput(e.to_string()),
            StorageError::Internal(msg) => PalaceError::Fatal(msg),
        }
    }
}
