//! Filter composition for `list-shards` and the retrieval layer.

use chrono::{DateTime, Utc};

use crate::enums::{ShardType, Status};

/// Filter accepted by `list-shards` (§4.1).
///
/// `project` is required by the store; everything else narrows the result
/// set. Set-valued fields use overlap (OR) semantics. Ordering defaults to
/// newest-first; pagination is `limit`/`offset`.
#[derive(Debug, Clone)]
pub struct ShardFilter {
    pub project: String,
    pub types: Vec<ShardType>,
    pub statuses: Vec<Status>,
    /// Overlap semantics: a shard matches if it has any of these labels.
    pub labels: Vec<String>,
    pub creator: Option<String>,
    pub keyword: Option<String>,
    pub since: Option<DateTime<Utc>>,
    /// Restrict to shards with no parent (roots).
    pub parent_null: Option<bool>,
    pub parent_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ShardFilter {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            types: Vec::new(),
            statuses: Vec::new(),
            labels: Vec::new(),
            creator: None,
            keyword: None,
            since: None,
            parent_null: None,
            parent_id: None,
            limit: None,
            offset: None,
        }
    }

    pub fn with_type(mut self, t: ShardType) -> Self {
        self.types.push(t);
        self
    }

    pub fn with_status(mut self, s: Status) -> Self {
        self.statuses.push(s);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filters accepted by retrieval operators on top of [`ShardFilter`]'s scope
/// (§4.4): type/label/status narrowing, a `since` floor, and a minimum
/// similarity floor for the vector path.
#[derive(Debug, Clone)]
pub struct RetrievalFilter {
    pub project: String,
    pub types: Vec<ShardType>,
    pub labels: Vec<String>,
    pub statuses: Vec<Status>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
    pub min_similarity: f32,
}

impl RetrievalFilter {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            types: Vec::new(),
            labels: Vec::new(),
            statuses: Vec::new(),
            since: None,
            limit: 10,
            min_similarity: 0.30,
        }
    }
}
