//! Label and read-receipt types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A label (tag) on a shard, set-semantics.
///
/// Labels prefixed `kind:` carry workflow meaning (e.g. `kind:epic`);
/// labels prefixed `to:`/`cc:` carry messaging routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub shard_id: String,
    pub label: String,
}

impl Label {
    /// Strips the `kind:` prefix, if present.
    pub fn kind_value(label: &str) -> Option<&str> {
        label.strip_prefix("kind:")
    }

    /// Strips a `to:`/`cc:` routing prefix, if present.
    pub fn routing_value(label: &str) -> Option<(&'static str, &str)> {
        if let Some(rest) = label.strip_prefix("to:") {
            Some(("to", rest))
        } else {
            label.strip_prefix("cc:").map(|rest| ("cc", rest))
        }
    }
}

/// Per-agent read state for message shards: `(shard_id, agent_id, read_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub shard_id: String,
    pub agent_id: String,
    pub read_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_serde() {
        let l = Label {
            shard_id: "pf-abc".into(),
            label: "kind:epic".into(),
        };
        let json = serde_json::to_string(&l).unwrap();
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, "kind:epic");
    }

    #[test]
    fn kind_value_strips_prefix() {
        assert_eq!(Label::kind_value("kind:epic"), Some("epic"));
        assert_eq!(Label::kind_value("tech-debt"), None);
    }

    #[test]
    fn routing_value_strips_prefix() {
        assert_eq!(Label::routing_value("to:alice"), Some(("to", "alice")));
        assert_eq!(Label::routing_value("cc:bob"), Some(("cc", "bob")));
        assert_eq!(Label::routing_value("kind:epic"), None);
    }

    #[test]
    fn read_receipt_serde_roundtrip() {
        let r = ReadReceipt {
            shard_id: "pf-msg1".into(),
            agent_id: "alice".into(),
            read_at: Utc::now(),
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: ReadReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent_id, "alice");
    }
}
