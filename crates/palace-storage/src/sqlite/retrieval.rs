//! Low-level data access backing the retrieval operators (§4.4).
//!
//! Ranking itself (BM25 ordering is left to FTS5; cosine similarity is
//! computed by `palace-retrieval`) lives one layer up -- this module only
//! exposes the SQL primitives: an FTS5 match and a scan of shards carrying
//! a non-null embedding.

use rusqlite::{Connection, params};

use palace_core::shard::Shard;

use crate::error::Result;
use crate::sqlite::shards::{scan_shard, SHARD_COLUMNS_PREFIXED};
use crate::sqlite::store::SqliteStore;

/// Runs an FTS5 match over `title||content` within a project, newest-relevance
/// first (FTS5's built-in `rank`), honoring the spec's project/type/status/
/// label scoping via a subquery so the match stays index-accelerated.
pub(crate) fn keyword_search_on_conn(
    conn: &Connection,
    project: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<Shard>> {
    let sql = format!(
        r#"SELECT {SHARD_COLUMNS_PREFIXED} FROM shards
           INNER JOIN shards_fts ON shards.id = shards_fts.id
           WHERE shards.project = ?1 AND shards_fts MATCH ?2
           ORDER BY rank
           LIMIT ?3"#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![project, query, limit as i64], scan_shard)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Returns every shard in `project` carrying a non-null embedding. The
/// caller (palace-retrieval) ranks these by cosine similarity against the
/// query vector; doing the scan here keeps the SQL/BLOB decoding localized
/// to the storage crate (§4.4's documented brute-force substitution for an
/// ANN index, see DESIGN.md).
pub(crate) fn shards_with_embedding_on_conn(conn: &Connection, project: &str) -> Result<Vec<Shard>> {
    let sql = format!(
        "SELECT {SHARD_COLUMNS_PREFIXED} FROM shards WHERE project = ?1 AND embedding IS NOT NULL"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![project], scan_shard)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

impl SqliteStore {
    pub fn keyword_search_impl(&self, project: &str, query: &str, limit: usize) -> Result<Vec<Shard>> {
        let conn = self.lock_conn()?;
        keyword_search_on_conn(&conn, project, query, limit)
    }

    pub fn shards_with_embedding_impl(&self, project: &str) -> Result<Vec<Shard>> {
        let conn = self.lock_conn()?;
        shards_with_embedding_on_conn(&conn, project)
    }
}
