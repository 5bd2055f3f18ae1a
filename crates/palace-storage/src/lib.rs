//! Storage backend for the context palace.
//!
//! Provides the [`Storage`] trait and a SQLite implementation ([`SqliteStore`]).

pub mod error;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::{ShardUpdates, Statistics, Storage, Transaction};

// ---------------------------------------------------------------------------
// Storage trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use palace_core::edge::{Edge, EdgeCounts};
use palace_core::enums::EdgeType;
use palace_core::filter::ShardFilter;
use palace_core::focus::Focus;
use palace_core::label::ReadReceipt;
use palace_core::shard::Shard;

use crate::error::Result;

impl Storage for SqliteStore {
    fn create_shard(&self, shard: &Shard) -> Result<()> {
        self.create_shard_impl(shard)
    }

    fn get_shard(&self, id: &str) -> Result<Shard> {
        self.get_shard_impl(id)
    }

    fn update_shard(&self, id: &str, updates: &ShardUpdates) -> Result<()> {
        self.update_shard_impl(id, updates)
    }

    fn delete_shard(&self, id: &str) -> Result<()> {
        self.delete_shard_impl(id)
    }

    fn list_shards(&self, filter: &ShardFilter) -> Result<Vec<Shard>> {
        self.list_shards_impl(filter)
    }

    fn add_edge(&self, edge: &Edge) -> Result<()> {
        self.add_edge_impl(edge)
    }

    fn remove_edge(&self, from: &str, to: &str, edge_type: &EdgeType) -> Result<()> {
        self.remove_edge_impl(from, to, edge_type)
    }

    fn list_edges(&self, shard_id: &str) -> Result<Vec<Edge>> {
        self.list_edges_impl(shard_id)
    }

    fn edge_counts(&self, shard_id: &str) -> Result<EdgeCounts> {
        self.edge_counts_impl(shard_id)
    }

    fn shards_via_edge(&self, shard_id: &str, edge_type: &EdgeType, reverse: bool) -> Result<Vec<Shard>> {
        self.shards_via_edge_impl(shard_id, edge_type, reverse)
    }

    fn add_label(&self, shard_id: &str, label: &str) -> Result<()> {
        self.add_label_impl(shard_id, label)
    }

    fn remove_label(&self, shard_id: &str, label: &str) -> Result<()> {
        self.remove_label_impl(shard_id, label)
    }

    fn get_labels(&self, shard_id: &str) -> Result<Vec<String>> {
        self.get_labels_impl(shard_id)
    }

    fn mark_read(&self, shard_id: &str, agent_id: &str) -> Result<()> {
        self.mark_read_impl(shard_id, agent_id)
    }

    fn get_read_receipts(&self, shard_id: &str) -> Result<Vec<ReadReceipt>> {
        self.get_read_receipts_impl(shard_id)
    }

    fn set_focus(&self, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()> {
        self.set_focus_impl(project, agent, epic_id, note)
    }

    fn clear_focus(&self, project: &str, agent: &str) -> Result<()> {
        self.clear_focus_impl(project, agent)
    }

    fn get_focus(&self, project: &str, agent: &str) -> Result<Option<Focus>> {
        self.get_focus_impl(project, agent)
    }

    fn keyword_search(&self, project: &str, query: &str, limit: usize) -> Result<Vec<Shard>> {
        self.keyword_search_impl(project, query, limit)
    }

    fn shards_with_embedding(&self, project: &str) -> Result<Vec<Shard>> {
        self.shards_with_embedding_impl(project)
    }

    fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.set_config_impl(key, value)
    }

    fn get_config(&self, key: &str) -> Result<String> {
        self.get_config_impl(key)
    }

    fn get_all_config(&self) -> Result<HashMap<String, String>> {
        self.get_all_config_impl()
    }

    fn get_statistics(&self, project: &str) -> Result<Statistics> {
        self.get_statistics_impl(project)
    }

    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()> {
        self.run_in_transaction_impl(f)
    }
}
