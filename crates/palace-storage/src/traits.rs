//! Storage and Transaction traits -- the public API for shard persistence.
//!
//! Consumers depend on these traits rather than on concrete implementations so
//! that alternative backends (mocks, proxies, etc.) can be substituted.

use chrono::{DateTime, Utc};
use serde_json::Value;

use palace_core::edge::{Edge, EdgeCounts};
use palace_core::enums::EdgeType;
use palace_core::filter::ShardFilter;
use palace_core::focus::Focus;
use palace_core::label::ReadReceipt;
use palace_core::shard::Shard;

use crate::error::Result;

// ---------------------------------------------------------------------------
// View / helper types
// ---------------------------------------------------------------------------

/// Typed partial-update struct for shards.
///
/// Only `Some` fields are applied; `None` fields are left unchanged. This
/// avoids an untyped `map[string]interface{}` update payload.
#[derive(Debug, Clone, Default)]
pub struct ShardUpdates {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<palace_core::enums::Status>,
    pub priority: Option<i32>,
    pub owner: Option<Option<String>>,
    pub metadata: Option<Value>,
    pub embedding: Option<Option<Vec<f32>>>,
    pub parent: Option<Option<String>>,
    pub closed_at: Option<Option<DateTime<Utc>>>,
    pub closed_by: Option<Option<String>>,
    pub closed_reason: Option<Option<String>>,
}

/// Aggregate statistics about the shard database.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Statistics {
    pub total_shards: i64,
    pub open_shards: i64,
    pub closed_shards: i64,
    pub in_progress_shards: i64,

    /// Breakdown by shard type: `(type_name, count)`.
    pub by_type: Vec<(String, i64)>,
    /// Breakdown by project: `(project, count)`.
    pub by_project: Vec<(String, i64)>,
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Primary storage interface for shard persistence (§4.1).
pub trait Storage: Send + Sync {
    // -- Shard CRUD ------------------------------------------------------

    fn create_shard(&self, shard: &Shard) -> Result<()>;
    fn get_shard(&self, id: &str) -> Result<Shard>;
    fn update_shard(&self, id: &str, updates: &ShardUpdates) -> Result<()>;
    fn delete_shard(&self, id: &str) -> Result<()>;
    fn list_shards(&self, filter: &ShardFilter) -> Result<Vec<Shard>>;

    // -- Edges -------------------------------------------------------------

    fn add_edge(&self, edge: &Edge) -> Result<()>;
    fn remove_edge(&self, from: &str, to: &str, edge_type: &EdgeType) -> Result<()>;
    fn list_edges(&self, shard_id: &str) -> Result<Vec<Edge>>;
    fn edge_counts(&self, shard_id: &str) -> Result<EdgeCounts>;
    fn shards_via_edge(&self, shard_id: &str, edge_type: &EdgeType, reverse: bool) -> Result<Vec<Shard>>;

    // -- Labels --------------------------------------------------------------

    fn add_label(&self, shard_id: &str, label: &str) -> Result<()>;
    fn remove_label(&self, shard_id: &str, label: &str) -> Result<()>;
    fn get_labels(&self, shard_id: &str) -> Result<Vec<String>>;

    // -- Read receipts ---------------------------------------------------

    fn mark_read(&self, shard_id: &str, agent_id: &str) -> Result<()>;
    fn get_read_receipts(&self, shard_id: &str) -> Result<Vec<ReadReceipt>>;

    // -- Focus ---------------------------------------------------------------

    fn set_focus(&self, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()>;
    fn clear_focus(&self, project: &str, agent: &str) -> Result<()>;
    fn get_focus(&self, project: &str, agent: &str) -> Result<Option<Focus>>;

    // -- Retrieval primitives --------------------------------------------

    fn keyword_search(&self, project: &str, query: &str, limit: usize) -> Result<Vec<Shard>>;
    fn shards_with_embedding(&self, project: &str) -> Result<Vec<Shard>>;

    // -- Configuration -------------------------------------------------------

    fn set_config(&self, key: &str, value: &str) -> Result<()>;
    fn get_config(&self, key: &str) -> Result<String>;
    fn get_all_config(&self) -> Result<std::collections::HashMap<String, String>>;

    // -- Statistics ------------------------------------------------------

    fn get_statistics(&self, project: &str) -> Result<Statistics>;

    // -- Transactions --------------------------------------------------------

    /// Executes a closure within a database transaction.
    ///
    /// If the closure returns `Ok`, the transaction is committed.
    /// If it returns `Err` or panics, the transaction is rolled back.
    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Transaction trait
// ---------------------------------------------------------------------------

/// Subset of [`Storage`] methods available inside a transaction.
///
/// All operations share a single database connection and are committed or
/// rolled back atomically.
pub trait Transaction {
    fn create_shard(&self, shard: &Shard) -> Result<()>;
    fn get_shard(&self, id: &str) -> Result<Shard>;
    fn update_shard(&self, id: &str, updates: &ShardUpdates) -> Result<()>;
    fn delete_shard(&self, id: &str) -> Result<()>;
    fn list_shards(&self, filter: &ShardFilter) -> Result<Vec<Shard>>;

    fn add_edge(&self, edge: &Edge) -> Result<()>;
    fn remove_edge(&self, from: &str, to: &str, edge_type: &EdgeType) -> Result<()>;

    fn add_label(&self, shard_id: &str, label: &str) -> Result<()>;
    fn remove_label(&self, shard_id: &str, label: &str) -> Result<()>;
    fn get_labels(&self, shard_id: &str) -> Result<Vec<String>>;

    fn set_focus(&self, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()>;
    fn clear_focus(&self, project: &str, agent: &str) -> Result<()>;

    fn set_config(&self, key: &str, value: &str) -> Result<()>;
    fn get_config(&self, key: &str) -> Result<String>;
}
