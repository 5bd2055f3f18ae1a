//! Label and read-receipt CRUD for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, params};

use palace_core::label::ReadReceipt;

use crate::error::Result;
use crate::sqlite::shards::format_datetime;
use crate::sqlite::store::SqliteStore;

pub(crate) fn add_label_on_conn(conn: &Connection, shard_id: &str, label: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO labels (shard_id, label) VALUES (?1, ?2)",
        params![shard_id, label],
    )?;
    Ok(())
}

pub(crate) fn remove_label_on_conn(conn: &Connection, shard_id: &str, label: &str) -> Result<()> {
    // Set semantics: removing an absent label is a no-op, not an error.
    conn.execute(
        "DELETE FROM labels WHERE shard_id = ?1 AND label = ?2",
        params![shard_id, label],
    )?;
    Ok(())
}

pub(crate) fn get_labels_on_conn(conn: &Connection, shard_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT label FROM labels WHERE shard_id = ?1 ORDER BY label")?;
    let rows = stmt.query_map(params![shard_id], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(crate) fn mark_read_on_conn(conn: &Connection, shard_id: &str, agent_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO read_receipts (shard_id, agent_id, read_at) VALUES (?1, ?2, ?3)",
        params![shard_id, agent_id, format_datetime(&Utc::now())],
    )?;
    Ok(())
}

pub(crate) fn get_read_receipts_on_conn(conn: &Connection, shard_id: &str) -> Result<Vec<ReadReceipt>> {
    let mut stmt = conn.prepare(
        "SELECT shard_id, agent_id, read_at FROM read_receipts WHERE shard_id = ?1",
    )?;
    let rows = stmt.query_map(params![shard_id], |row| {
        let read_at: String = row.get("read_at")?;
        Ok(ReadReceipt {
            shard_id: row.get("shard_id")?,
            agent_id: row.get("agent_id")?,
            read_at: crate::sqlite::shards::parse_datetime(&read_at),
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

impl SqliteStore {
    pub fn add_label_impl(&self, shard_id: &str, label: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        add_label_on_conn(&conn, shard_id, label)
    }

    pub fn remove_label_impl(&self, shard_id: &str, label: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        remove_label_on_conn(&conn, shard_id, label)
    }

    pub fn get_labels_impl(&self, shard_id: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        get_labels_on_conn(&conn, shard_id)
    }

    pub fn mark_read_impl(&self, shard_id: &str, agent_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        mark_read_on_conn(&conn, shard_id, agent_id)
    }

    pub fn get_read_receipts_impl(&self, shard_id: &str) -> Result<Vec<ReadReceipt>> {
        let conn = self.lock_conn()?;
        get_read_receipts_on_conn(&conn, shard_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::shard::ShardBuilder;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let shard = ShardBuilder::new("palace", "T").id("pf-l1").build();
        store.create_shard_impl(&shard).unwrap();
        store
    }

    #[test]
    fn add_and_list_labels() {
        let store = seeded_store();
        store.add_label_impl("pf-l1", "kind:epic").unwrap();
        assert_eq!(store.get_labels_impl("pf-l1").unwrap(), vec!["kind:epic"]);
    }

    #[test]
    fn remove_absent_label_is_noop() {
        let store = seeded_store();
        store.remove_label_impl("pf-l1", "nope").unwrap();
    }

    #[test]
    fn mark_read_then_list_receipt() {
        let store = seeded_store();
        store.mark_read_impl("pf-l1", "alice").unwrap();
        let receipts = store.get_read_receipts_impl("pf-l1").unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].agent_id, "alice");
    }
}
