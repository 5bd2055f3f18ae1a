//! Shard -- the central domain record of the context palace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{ShardType, Status};

fn is_zero_priority(_p: &i32) -> bool {
    false
}

fn is_empty_metadata(v: &Value) -> bool {
    matches!(v, Value::Object(m) if m.is_empty())
}

/// A uniquely identified record forming the unit of storage and retrieval
/// (§3). `parent` is a self-reference used by the memory hierarchy and by
/// epics; which relation it expresses is discriminated by `shard_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,

    #[serde(rename = "type", default, skip_serializing_if = "ShardType::is_default")]
    pub shard_type: ShardType,

    #[serde(default, skip_serializing_if = "Status::is_default")]
    pub status: Status,

    /// Priority 0-4, lower is more urgent. No skip: 0 is a valid, meaningful value.
    #[serde(default, skip_serializing_if = "is_zero_priority")]
    pub priority: i32,

    #[serde(default)]
    pub creator: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,

    /// Nested string->JSON mapping, queried by containment (§4.3).
    #[serde(default, skip_serializing_if = "is_empty_metadata")]
    pub metadata: Value,

    /// Fixed-dim float vector used by the vector retrieval operator (§4.4).
    /// Never round-tripped through the text CLI surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Default for Shard {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            project: String::new(),
            title: String::new(),
            content: String::new(),
            shard_type: ShardType::Task,
            status: Status::Open,
            priority: 0,
            creator: String::new(),
            owner: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            closed_by: None,
            closed_reason: None,
            metadata: Value::Object(Default::default()),
            embedding: None,
            parent: None,
        }
    }
}

impl Shard {
    /// Status transitions are monotonic except `reopen` (invariant 2), which
    /// also clears the closed_* triple.
    pub fn reopen(&mut self) {
        self.status = Status::Open;
        self.closed_at = None;
        self.closed_by = None;
        self.closed_reason = None;
    }

    pub fn close(&mut self, closed_by: impl Into<String>, reason: Option<String>) {
        self.status = Status::Closed;
        self.closed_at = Some(Utc::now());
        self.closed_by = Some(closed_by.into());
        self.closed_reason = reason;
    }

    pub fn is_closed(&self) -> bool {
        self.status == Status::Closed
    }

    /// Whether this shard is excluded from `next`'s candidate pool (§4.9):
    /// epics are containers, not actionable work, and messages/memories are
    /// not task-shaped at all.
    pub fn excluded_from_next(&self) -> bool {
        self.shard_type.excluded_from_next()
    }
}

/// Builder for constructing a [`Shard`] with a fluent API.
pub struct ShardBuilder {
    shard: Shard,
}

impl ShardBuilder {
    pub fn new(project: impl Into<String>, title: impl Into<String>) -> Self {
        let mut shard = Shard::default();
        shard.project = project.into();
        shard.title = title.into();
        Self { shard }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.shard.id = id.into();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.shard.content = content.into();
        self
    }

    pub fn shard_type(mut self, t: ShardType) -> Self {
        self.shard.shard_type = t;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.shard.status = status;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.shard.priority = priority;
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.shard.creator = creator.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.shard.owner = Some(owner.into());
        self
    }

    pub fn created_at(mut self, t: DateTime<Utc>) -> Self {
        self.shard.created_at = t;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.shard.metadata = metadata;
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.shard.embedding = Some(embedding);
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.shard.parent = Some(parent.into());
        self
    }

    pub fn build(self) -> Shard {
        self.shard
    }
}
