//! The shared error taxonomy surfaced by every layer (§7).

use thiserror::Error;

/// The six error kinds the system distinguishes, independent of what
/// produced them. Storage, retrieval and provider errors are translated
/// into one of these at their crate boundary so the CLI layer only ever
/// matches on this enum.
#[derive(Debug, Error)]
pub enum PalaceError {
    /// Shard, edge, version, focus or config missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Precondition failed: already in_progress, already closed, already
    /// approved, circular dependency, identical content, snapshot
    /// collision, cannot move into own descendant, content type mismatch.
    #[error("conflicting state: {0}")]
    ConflictState(String),

    /// Malformed id, unknown edge/doc type, missing required flag,
    /// priority/depth out of range, bad metadata JSON.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Database unreachable, or embedding/generation provider down or over quota.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Pointer-block JSON parse error, dangling parent FK, missing snapshot shard.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    /// Dimension mismatch, schema mismatch.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl PalaceError {
    /// Exit-status-relevant classification: NotFound/ConflictState/InvalidInput
    /// are user errors surfaced with a one-line message and no retry (§7).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PalaceError::NotFound(_) | PalaceError::ConflictState(_) | PalaceError::InvalidInput(_)
        )
    }
}

impl From<crate::validation::ValidationError> for PalaceError {
    fn from(e: crate::validation::ValidationError) -> Self {
        PalaceError::InvalidInput(e.to_string())
    }
}

impl From<crate::metadata::MetadataError> for PalaceError {
    fn from(e: crate::metadata::MetadataError) -> Self {
        match e {
            crate::metadata::MetadataError::PathNotFound => PalaceError::NotFound(e.to_string()),
            crate::metadata::MetadataError::TooLarge => PalaceError::InvalidInput(e.to_string()),
            crate::metadata::MetadataError::NotAnObject => PalaceError::InvalidInput(e.to_string()),
        }
    }
}

impl From<crate::pointer_block::PointerBlockError> for PalaceError {
    fn from(e: crate::pointer_block::PointerBlockError) -> Self {
        PalaceError::Inconsistent(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_classified() {
        assert!(PalaceError::NotFound("x".into()).is_user_error());
        assert!(PalaceError::ConflictState("x".into()).is_user_error());
        assert!(PalaceError::InvalidInput("x".into()).is_user_error());
        assert!(!PalaceError::Unavailable("x".into()).is_user_error());
        assert!(!PalaceError::Inconsistent("x".into()).is_user_error());
        assert!(!PalaceError::Fatal("x".into()).is_user_error());
    }

    #[test]
    fn validation_error_maps_to_invalid_input() {
        let e: PalaceError = crate::validation::ValidationError::TitleRequired.into();
        assert!(matches!(e, PalaceError::InvalidInput(_)));
    }
}
