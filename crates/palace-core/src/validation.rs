//! Shard validation -- structural checks surfaced as `InvalidInput` (§7.3).

use thiserror::Error;

use crate::shard::Shard;

/// A structural defect in a shard, caught before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title exceeds maximum length of {0} characters")]
    TitleTooLong(usize),

    #[error("priority {0} out of range (expected 0-4)")]
    InvalidPriority(i32),

    #[error("id '{0}' is malformed (expected <prefix>-<hash>)")]
    MalformedId(String),

    #[error("project is required")]
    ProjectRequired,

    #[error("metadata value at '{0}' is not valid JSON")]
    InvalidMetadata(String),

    #[error("closed shard missing closed_at timestamp")]
    ClosedWithoutTimestamp,

    #[error("open shard has a closed_at timestamp")]
    NotClosedWithTimestamp,

    #[error("shard_type is an empty custom value")]
    EmptyShardType,
}

const MAX_TITLE_LEN: usize = 500;

/// Validates a shard's structural invariants ahead of a create/update.
///
/// This does not check cross-shard invariants (parent existence, cycle
/// freedom, snapshot chains) -- those require storage access and are
/// enforced at the storage boundary instead.
pub fn validate(shard: &Shard) -> Result<(), ValidationError> {
    if shard.title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if shard.title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong(MAX_TITLE_LEN));
    }
    if shard.project.trim().is_empty() {
        return Err(ValidationError::ProjectRequired);
    }
    if !(0..=4).contains(&shard.priority) {
        return Err(ValidationError::InvalidPriority(shard.priority));
    }
    if !shard.shard_type.is_valid() {
        return Err(ValidationError::EmptyShardType);
    }
    if !shard.id.is_empty() && !is_well_formed_id(&shard.id) {
        return Err(ValidationError::MalformedId(shard.id.clone()));
    }
    if !shard.metadata.is_object() && !shard.metadata.is_null() {
        return Err(ValidationError::InvalidMetadata("$".into()));
    }
    match (shard.is_closed(), shard.closed_at.is_some()) {
        (true, false) => return Err(ValidationError::ClosedWithoutTimestamp),
        (false, true) => return Err(ValidationError::NotClosedWithTimestamp),
        _ => {}
    }
    Ok(())
}

/// An id is `<prefix>-<hash>`: one non-empty ascii-alphanumeric prefix, a
/// single hyphen, and a non-empty base36 (or `<id>-v<N>` snapshot) suffix.
fn is_well_formed_id(id: &str) -> bool {
    let Some((prefix, suffix)) = id.split_once('-') else {
        return false;
    };
    if prefix.is_empty() || suffix.is_empty() {
        return false;
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    suffix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::ShardBuilder;
    use serde_json::json;

    fn valid_shard() -> Shard {
        ShardBuilder::new("palace", "A title").id("pf-ab12cd").build()
    }

    #[test]
    fn accepts_valid_shard() {
        assert!(validate(&valid_shard()).is_ok());
    }

    #[test]
    fn rejects_empty_title() {
        let mut s = valid_shard();
        s.title = "  ".into();
        assert_eq!(validate(&s), Err(ValidationError::TitleRequired));
    }

    #[test]
    fn rejects_title_too_long() {
        let mut s = valid_shard();
        s.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(validate(&s), Err(ValidationError::TitleTooLong(MAX_TITLE_LEN)));
    }

    #[test]
    fn rejects_empty_project() {
        let mut s = valid_shard();
        s.project = String::new();
        assert_eq!(validate(&s), Err(ValidationError::ProjectRequired));
    }

    #[test]
    fn rejects_out_of_range_priority() {
        let mut s = valid_shard();
        s.priority = 7;
        assert_eq!(validate(&s), Err(ValidationError::InvalidPriority(7)));
    }

    #[test]
    fn rejects_malformed_id() {
        let mut s = valid_shard();
        s.id = "not_an_id".into();
        assert!(matches!(validate(&s), Err(ValidationError::MalformedId(_))));
    }

    #[test]
    fn accepts_snapshot_id() {
        let mut s = valid_shard();
        s.id = "pf-ab12cd-v3".into();
        assert!(validate(&s).is_ok());
    }

    #[test]
    fn rejects_empty_custom_shard_type() {
        let mut s = valid_shard();
        s.shard_type = crate::enums::ShardType::Custom(String::new());
        assert_eq!(validate(&s), Err(ValidationError::EmptyShardType));
    }

    #[test]
    fn rejects_non_object_metadata() {
        let mut s = valid_shard();
        s.metadata = json!("not an object");
        assert!(matches!(validate(&s), Err(ValidationError::InvalidMetadata(_))));
    }

    #[test]
    fn rejects_closed_without_timestamp() {
        let mut s = valid_shard();
        s.status = crate::enums::Status::Closed;
        assert_eq!(validate(&s), Err(ValidationError::ClosedWithoutTimestamp));
    }

    #[test]
    fn rejects_open_with_timestamp() {
        let mut s = valid_shard();
        s.closed_at = Some(chrono::Utc::now());
        assert_eq!(validate(&s), Err(ValidationError::NotClosedWithTimestamp));
    }
}
