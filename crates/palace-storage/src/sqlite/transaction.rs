//! Transaction wrapper for [`SqliteStore`].

use rusqlite::Connection;

use palace_core::edge::Edge;
use palace_core::enums::EdgeType;
use palace_core::filter::ShardFilter;
use palace_core::shard::Shard;

use crate::error::{Result, StorageError};
use crate::sqlite::config;
use crate::sqlite::edges;
use crate::sqlite::focus;
use crate::sqlite::labels;
use crate::sqlite::shards;
use crate::sqlite::store::SqliteStore;
use crate::traits::{ShardUpdates, Transaction};

/// A thin wrapper around a SQLite connection that is inside a transaction.
///
/// The [`SqliteTx`] holds a reference to the connection (which already has an
/// active transaction via `BEGIN IMMEDIATE`, see §5's concurrency note). It
/// implements [`Transaction`] by delegating to the same connection-level
/// helpers used by [`SqliteStore`].
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Transaction for SqliteTx<'_> {
    fn create_shard(&self, shard: &Shard) -> Result<()> {
        if let Some(parent) = &shard.parent {
            edges::ensure_parent_exists_on_conn(self.conn, parent)?;
        }
        shards::insert_shard_on_conn(self.conn, shard)
    }

    fn get_shard(&self, id: &str) -> Result<Shard> {
        shards::get_shard_on_conn(self.conn, id)
    }

    fn update_shard(&self, id: &str, updates: &ShardUpdates) -> Result<()> {
        shards::update_shard_on_conn(self.conn, id, updates)
    }

    fn delete_shard(&self, id: &str) -> Result<()> {
        shards::delete_shard_on_conn(self.conn, id)
    }

    fn list_shards(&self, filter: &ShardFilter) -> Result<Vec<Shard>> {
        shards::list_shards_on_conn(self.conn, filter)
    }

    fn add_edge(&self, edge: &Edge) -> Result<()> {
        edges::add_edge_on_conn(self.conn, edge)
    }

    fn remove_edge(&self, from: &str, to: &str, edge_type: &EdgeType) -> Result<()> {
        edges::remove_edge_on_conn(self.conn, from, to, edge_type)
    }

    fn add_label(&self, shard_id: &str, label: &str) -> Result<()> {
        labels::add_label_on_conn(self.conn, shard_id, label)
    }

    fn remove_label(&self, shard_id: &str, label: &str) -> Result<()> {
        labels::remove_label_on_conn(self.conn, shard_id, label)
    }

    fn get_labels(&self, shard_id: &str) -> Result<Vec<String>> {
        labels::get_labels_on_conn(self.conn, shard_id)
    }

    fn set_focus(&self, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()> {
        focus::set_focus_on_conn(self.conn, project, agent, epic_id, note)
    }

    fn clear_focus(&self, project: &str, agent: &str) -> Result<()> {
        focus::clear_focus_on_conn(self.conn, project, agent)
    }

    fn set_config(&self, key: &str, value: &str) -> Result<()> {
        config::set_config_on_conn(self.conn, key, value)
    }

    fn get_config(&self, key: &str) -> Result<String> {
        config::get_config_on_conn(self.conn, key)
    }
}

impl SqliteStore {
    /// Runs a closure inside a `BEGIN IMMEDIATE` transaction, committing on
    /// `Ok` and rolling back on `Err` or panic (§5).
    pub fn run_in_transaction_impl(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        let sqlite_tx = SqliteTx { conn: &conn };
        match f(&sqlite_tx) {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::shard::ShardBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn transaction_commit() {
        let store = test_store();

        store
            .run_in_transaction_impl(&|tx| {
                let shard = ShardBuilder::new("palace", "In transaction").id("pf-tx1").build();
                tx.create_shard(&shard)?;
                tx.add_label("pf-tx1", "transacted")?;
                Ok(())
            })
            .unwrap();

        let shard = store.get_shard_impl("pf-tx1").unwrap();
        assert_eq!(shard.title, "In transaction");
        let labels = store.get_labels_impl("pf-tx1").unwrap();
        assert_eq!(labels, vec!["transacted"]);
    }

    #[test]
    fn transaction_rollback_on_error() {
        let store = test_store();

        let result = store.run_in_transaction_impl(&|tx| {
            let shard = ShardBuilder::new("palace", "Should rollback").id("pf-tx2").build();
            tx.create_shard(&shard)?;
            Err(StorageError::Internal("forced rollback".into()))
        });

        assert!(result.is_err());
        let err = store.get_shard_impl("pf-tx2").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn transaction_with_edge() {
        let store = test_store();

        store
            .run_in_transaction_impl(&|tx| {
                let parent = ShardBuilder::new("palace", "Parent").id("pf-txp1").build();
                let child = ShardBuilder::new("palace", "Child").id("pf-txc1").build();
                tx.create_shard(&parent)?;
                tx.create_shard(&child)?;
                tx.add_edge(&Edge::new("pf-txc1", "pf-txp1", EdgeType::BlockedBy))?;
                Ok(())
            })
            .unwrap();

        let edges = store.list_edges_impl("pf-txc1").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "pf-txp1");
    }
}
