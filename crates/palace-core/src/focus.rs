//! Focus — the (project, agent)-scoped pointer to an active epic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `(project, agent) -> (epic_id, set_at, note?)`, at most one row per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    pub project: String,
    pub agent: String,
    pub epic_id: String,
    pub set_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
