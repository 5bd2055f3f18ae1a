//! Edge — a typed directed relation between two shards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::EdgeType;

/// `(from, to, edge_type, metadata, created_at)` with primary key `(from, to, edge_type)`.
///
/// Deleting either endpoint cascades the edge. Edge types are open
/// vocabulary; `blocked-by`, `child-of`, `previous-version`, `implements`,
/// `has-artifact`, `references` and `replies-to` carry behavior in the core
/// engines (see [`EdgeType`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,

    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Type-specific edge data, e.g. `{"summary": "..."}` on a `child-of`
    /// edge or `{"change_summary", "changed_by", "changed_at"}` on a
    /// `previous-version` edge.
    #[serde(default)]
    pub metadata: Value,

    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type,
            metadata: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reads the `summary` field carried by `child-of` and `previous-version`
    /// edges, if present.
    pub fn summary(&self) -> Option<&str> {
        self.metadata.get("summary").and_then(Value::as_str)
    }
}

/// Counts for edges into and out of a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EdgeCounts {
    pub outgoing: i64,
    pub incoming: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edge_serde_roundtrip() {
        let edge = Edge::new("pf-abc", "pf-def", EdgeType::BlockedBy);
        let json = serde_json::to_string(&edge).unwrap();
        assert!(json.contains(r#""type":"blocked-by""#));

        let back: Edge = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edge_type, EdgeType::BlockedBy);
        assert_eq!(back.from, "pf-abc");
    }

    #[test]
    fn edge_summary_reads_metadata() {
        let edge = Edge::new("pf-a", "pf-b", EdgeType::ChildOf)
            .with_metadata(json!({"summary": "when the user asks about auth"}));
        assert_eq!(edge.summary(), Some("when the user asks about auth"));
    }

    #[test]
    fn edge_summary_absent_is_none() {
        let edge = Edge::new("pf-a", "pf-b", EdgeType::References);
        assert_eq!(edge.summary(), None);
    }

    #[test]
    fn custom_edge_type_roundtrip() {
        let edge = Edge::new("pf-a", "pf-b", EdgeType::Custom("depends-on".into()));
        let json = serde_json::to_string(&edge).unwrap();
        let back: Edge = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edge_type, EdgeType::Custom("depends-on".into()));
    }
}
