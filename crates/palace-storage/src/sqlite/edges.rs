//! Edge CRUD operations and `blocked-by` cycle detection for [`SqliteStore`].

use std::collections::{HashSet, VecDeque};

use rusqlite::{Connection, params};

use palace_core::edge::{Edge, EdgeCounts};
use palace_core::enums::EdgeType;

use crate::error::{Result, StorageError};
use crate::sqlite::shards::{get_shard_on_conn, parse_datetime, scan_shard, SHARD_COLUMNS_PREFIXED};
use crate::sqlite::store::SqliteStore;
use palace_core::shard::Shard;

pub(crate) fn add_edge_on_conn(conn: &Connection, edge: &Edge) -> Result<()> {
    if edge.edge_type == EdgeType::BlockedBy {
        detect_cycle(conn, &edge.from, &edge.to)?;
    }

    let metadata_str = serde_json::to_string(&edge.metadata)?;
    conn.execute(
        r#"INSERT OR REPLACE INTO edges ("from", "to", type, metadata, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![
            edge.from,
            edge.to,
            edge.edge_type.as_str(),
            metadata_str,
            edge.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub(crate) fn remove_edge_on_conn(
    conn: &Connection,
    from: &str,
    to: &str,
    edge_type: &EdgeType,
) -> Result<()> {
    let affected = conn.execute(
        r#"DELETE FROM edges WHERE "from" = ?1 AND "to" = ?2 AND type = ?3"#,
        params![from, to, edge_type.as_str()],
    )?;
    if affected == 0 {
        return Err(StorageError::not_found("edge", format!("{from} -> {to} ({})", edge_type.as_str())));
    }
    Ok(())
}

pub(crate) fn list_edges_on_conn(conn: &Connection, shard_id: &str) -> Result<Vec<Edge>> {
    let mut stmt = conn.prepare(
        r#"SELECT "from", "to", type, metadata, created_at FROM edges
           WHERE "from" = ?1 OR "to" = ?1"#,
    )?;
    let rows = stmt.query_map(params![shard_id], |row| {
        let metadata_str: String = row.get("metadata")?;
        let created_at: String = row.get("created_at")?;
        Ok(Edge {
            from: row.get("from")?,
            to: row.get("to")?,
            edge_type: EdgeType::from(row.get::<_, String>("type")?.as_str()),
            metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
            created_at: parse_datetime(&created_at),
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(crate) fn edge_counts_on_conn(conn: &Connection, shard_id: &str) -> Result<EdgeCounts> {
    let outgoing: i64 = conn.query_row(
        r#"SELECT COUNT(*) FROM edges WHERE "from" = ?1"#,
        params![shard_id],
        |r| r.get(0),
    )?;
    let incoming: i64 = conn.query_row(
        r#"SELECT COUNT(*) FROM edges WHERE "to" = ?1"#,
        params![shard_id],
        |r| r.get(0),
    )?;
    Ok(EdgeCounts { outgoing, incoming })
}

/// Returns shards reachable from `shard_id` via outgoing edges of `edge_type`.
pub(crate) fn shards_via_edge_on_conn(
    conn: &Connection,
    shard_id: &str,
    edge_type: &EdgeType,
    reverse: bool,
) -> Result<Vec<Shard>> {
    let sql = if reverse {
        format!(
            r#"SELECT {SHARD_COLUMNS_PREFIXED} FROM shards
               INNER JOIN edges e ON shards.id = e."from"
               WHERE e."to" = ?1 AND e.type = ?2"#
        )
    } else {
        format!(
            r#"SELECT {SHARD_COLUMNS_PREFIXED} FROM shards
               INNER JOIN edges e ON shards.id = e."to"
               WHERE e."from" = ?1 AND e.type = ?2"#
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![shard_id, edge_type.as_str()], scan_shard)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Detects whether adding an edge `from -(blocked-by)-> to` would create a
/// cycle. BFS from `to` through the `blocked-by` graph looking for `from`.
fn detect_cycle(conn: &Connection, from: &str, to: &str) -> Result<()> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(to.to_string());

    while let Some(current) = queue.pop_front() {
        if current == from {
            return Err(StorageError::CycleDetected);
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        let mut stmt = conn.prepare_cached(
            r#"SELECT "to" FROM edges WHERE "from" = ?1 AND type = 'blocked-by'"#,
        )?;
        let rows = stmt.query_map(params![current], |row| row.get::<_, String>(0))?;
        for row in rows {
            let next = row?;
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }
    Ok(())
}

/// Ensures `parent` exists before wiring a shard to it (invariant 3).
pub(crate) fn ensure_parent_exists_on_conn(conn: &Connection, parent: &str) -> Result<()> {
    get_shard_on_conn(conn, parent).map(|_| ())
}

impl SqliteStore {
    pub fn add_edge_impl(&self, edge: &Edge) -> Result<()> {
        let conn = self.lock_conn()?;
        add_edge_on_conn(&conn, edge)
    }

    pub fn remove_edge_impl(&self, from: &str, to: &str, edge_type: &EdgeType) -> Result<()> {
        let conn = self.lock_conn()?;
        remove_edge_on_conn(&conn, from, to, edge_type)
    }

    pub fn list_edges_impl(&self, shard_id: &str) -> Result<Vec<Edge>> {
        let conn = self.lock_conn()?;
        list_edges_on_conn(&conn, shard_id)
    }

    pub fn edge_counts_impl(&self, shard_id: &str) -> Result<EdgeCounts> {
        let conn = self.lock_conn()?;
        edge_counts_on_conn(&conn, shard_id)
    }

    pub fn shards_via_edge_impl(&self, shard_id: &str, edge_type: &EdgeType, reverse: bool) -> Result<Vec<Shard>> {
        let conn = self.lock_conn()?;
        shards_via_edge_on_conn(&conn, shard_id, edge_type, reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::shard::ShardBuilder;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for id in ["pf-a1", "pf-b1", "pf-c1"] {
            let shard = ShardBuilder::new("palace", id).id(id).build();
            store.create_shard_impl(&shard).unwrap();
        }
        store
    }

    #[test]
    fn add_and_list_edge() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::References)).unwrap();
        let edges = store.list_edges_impl("pf-a1").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "pf-b1");
    }

    #[test]
    fn remove_missing_edge_is_not_found() {
        let store = seeded_store();
        let err = store.remove_edge_impl("pf-a1", "pf-b1", &EdgeType::References).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn direct_cycle_is_rejected() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::BlockedBy)).unwrap();
        let err = store.add_edge_impl(&Edge::new("pf-b1", "pf-a1", EdgeType::BlockedBy)).unwrap_err();
        assert!(matches!(err, StorageError::CycleDetected));
    }

    #[test]
    fn transitive_cycle_is_rejected() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::BlockedBy)).unwrap();
        store.add_edge_impl(&Edge::new("pf-b1", "pf-c1", EdgeType::BlockedBy)).unwrap();
        let err = store.add_edge_impl(&Edge::new("pf-c1", "pf-a1", EdgeType::BlockedBy)).unwrap_err();
        assert!(matches!(err, StorageError::CycleDetected));
    }

    #[test]
    fn non_blocking_edge_types_allow_cycles() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::References)).unwrap();
        store.add_edge_impl(&Edge::new("pf-b1", "pf-a1", EdgeType::References)).unwrap();
        assert_eq!(store.list_edges_impl("pf-a1").unwrap().len(), 2);
    }

    #[test]
    fn edge_counts_tracks_both_directions() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::References)).unwrap();
        let counts = store.edge_counts_impl("pf-b1").unwrap();
        assert_eq!(counts.incoming, 1);
        assert_eq!(counts.outgoing, 0);
    }

    #[test]
    fn shards_via_edge_both_directions() {
        let store = seeded_store();
        store.add_edge_impl(&Edge::new("pf-a1", "pf-b1", EdgeType::BlockedBy)).unwrap();

        let forward = store.shards_via_edge_impl("pf-a1", &EdgeType::BlockedBy, false).unwrap();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].id, "pf-b1");

        let backward = store.shards_via_edge_impl("pf-b1", &EdgeType::BlockedBy, true).unwrap();
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[0].id, "pf-a1");
    }
}
