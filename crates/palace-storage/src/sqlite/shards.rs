//! Shard CRUD operations for [`SqliteStore`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use palace_core::enums::{ShardType, Status};
use palace_core::filter::ShardFilter;
use palace_core::shard::Shard;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::traits::ShardUpdates;

/// All shard columns in a deterministic order for SELECT queries.
pub(crate) const SHARD_COLUMNS: &str = r#"
    id, project, title, content, type, status, priority, creator, owner,
    created_at, updated_at, closed_at, closed_by, closed_reason, metadata,
    embedding, parent
"#;

pub(crate) const SHARD_COLUMNS_PREFIXED: &str = r#"
    shards.id, shards.project, shards.title, shards.content, shards.type,
    shards.status, shards.priority, shards.creator, shards.owner,
    shards.created_at, shards.updated_at, shards.closed_at, shards.closed_by,
    shards.closed_reason, shards.metadata, shards.embedding, shards.parent
"#;

pub(crate) fn scan_shard(row: &Row<'_>) -> rusqlite::Result<Shard> {
    let metadata_str: String = row.get("metadata")?;
    let embedding_blob: Option<Vec<u8>> = row.get("embedding")?;
    let closed_at_str: Option<String> = row.get("closed_at")?;

    Ok(Shard {
        id: row.get("id")?,
        project: row.get("project")?,
        title: row.get("title")?,
        content: row.get("content")?,
        shard_type: ShardType::from(row.get::<_, String>("type")?.as_str()),
        status: Status::from(row.get::<_, String>("status")?.as_str()),
        priority: row.get("priority")?,
        creator: row.get("creator")?,
        owner: row.get("owner")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        closed_at: closed_at_str.as_deref().map(parse_datetime),
        closed_by: row.get("closed_by")?,
        closed_reason: row.get("closed_reason")?,
        metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
        embedding: embedding_blob.as_deref().map(decode_embedding),
        parent: row.get("parent")?,
    })
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ"))
            .map(|ndt| ndt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    })
}

pub(crate) fn encode_embedding(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub(crate) fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub(crate) fn insert_shard_on_conn(conn: &Connection, shard: &Shard) -> Result<()> {
    let metadata_str = serde_json::to_string(&shard.metadata)?;
    let embedding_blob = shard.embedding.as_deref().map(encode_embedding);

    conn.execute(
        "INSERT INTO shards
         (id, project, title, content, type, status, priority, creator, owner,
          created_at, updated_at, closed_at, closed_by, closed_reason, metadata,
          embedding, parent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            shard.id,
            shard.project,
            shard.title,
            shard.content,
            shard.shard_type.as_str(),
            shard.status.as_str(),
            shard.priority,
            shard.creator,
            shard.owner,
            format_datetime(&shard.created_at),
            format_datetime(&shard.updated_at),
            shard.closed_at.as_ref().map(format_datetime),
            shard.closed_by,
            shard.closed_reason,
            metadata_str,
            embedding_blob,
            shard.parent,
        ],
    )?;
    Ok(())
}

pub(crate) fn get_shard_on_conn(conn: &Connection, id: &str) -> Result<Shard> {
    let sql = format!("SELECT {SHARD_COLUMNS} FROM shards WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_shard)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("shard", id),
            other => StorageError::from(other),
        })
}

pub(crate) fn delete_shard_on_conn(conn: &Connection, id: &str) -> Result<()> {
    let affected = conn.execute("DELETE FROM shards WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(StorageError::not_found("shard", id));
    }
    Ok(())
}

pub(crate) fn update_shard_on_conn(conn: &Connection, id: &str, updates: &ShardUpdates) -> Result<()> {
    let mut shard = get_shard_on_conn(conn, id)?;

    if let Some(title) = &updates.title {
        shard.title = title.clone();
    }
    if let Some(content) = &updates.content {
        shard.content = content.clone();
    }
    if let Some(status) = &updates.status {
        shard.status = status.clone();
    }
    if let Some(priority) = updates.priority {
        shard.priority = priority;
    }
    if let Some(owner) = &updates.owner {
        shard.owner = owner.clone();
    }
    if let Some(metadata) = &updates.metadata {
        shard.metadata = metadata.clone();
    }
    if let Some(embedding) = &updates.embedding {
        shard.embedding = embedding.clone();
    }
    if let Some(parent) = &updates.parent {
        shard.parent = parent.clone();
    }
    if let Some(closed_at) = updates.closed_at {
        shard.closed_at = closed_at;
    }
    if let Some(closed_by) = &updates.closed_by {
        shard.closed_by = closed_by.clone();
    }
    if let Some(closed_reason) = &updates.closed_reason {
        shard.closed_reason = closed_reason.clone();
    }
    shard.updated_at = Utc::now();

    let metadata_str = serde_json::to_string(&shard.metadata)?;
    let embedding_blob = shard.embedding.as_deref().map(encode_embedding);

    conn.execute(
        "UPDATE shards SET title=?2, content=?3, status=?4, priority=?5, owner=?6,
         updated_at=?7, closed_at=?8, closed_by=?9, closed_reason=?10, metadata=?11,
         embedding=?12, parent=?13 WHERE id=?1",
        params![
            id,
            shard.title,
            shard.content,
            shard.status.as_str(),
            shard.priority,
            shard.owner,
            format_datetime(&shard.updated_at),
            shard.closed_at.as_ref().map(format_datetime),
            shard.closed_by,
            shard.closed_reason,
            metadata_str,
            embedding_blob,
            shard.parent,
        ],
    )?;
    Ok(())
}

/// Builds a `WHERE` clause and bound parameters from a [`ShardFilter`].
fn build_filter_clause(filter: &ShardFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut clauses = vec!["project = ?".to_string()];
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(filter.project.clone())];

    if !filter.types.is_empty() {
        let placeholders = vec!["?"; filter.types.len()].join(", ");
        clauses.push(format!("type IN ({placeholders})"));
        for t in &filter.types {
            args.push(Box::new(t.as_str().to_string()));
        }
    }
    if !filter.statuses.is_empty() {
        let placeholders = vec!["?"; filter.statuses.len()].join(", ");
        clauses.push(format!("status IN ({placeholders})"));
        for s in &filter.statuses {
            args.push(Box::new(s.as_str().to_string()));
        }
    }
    if let Some(creator) = &filter.creator {
        clauses.push("creator = ?".to_string());
        args.push(Box::new(creator.clone()));
    }
    if let Some(since) = filter.since {
        clauses.push("created_at >= ?".to_string());
        args.push(Box::new(format_datetime(&since)));
    }
    if let Some(parent_null) = filter.parent_null {
        clauses.push(if parent_null {
            "parent IS NULL".to_string()
        } else {
            "parent IS NOT NULL".to_string()
        });
    }
    if let Some(parent_id) = &filter.parent_id {
        clauses.push("parent = ?".to_string());
        args.push(Box::new(parent_id.clone()));
    }
    if !filter.labels.is_empty() {
        let placeholders = vec!["?"; filter.labels.len()].join(", ");
        clauses.push(format!(
            "id IN (SELECT shard_id FROM labels WHERE label IN ({placeholders}))"
        ));
        for l in &filter.labels {
            args.push(Box::new(l.clone()));
        }
    }
    if let Some(keyword) = &filter.keyword {
        clauses.push(
            "id IN (SELECT id FROM shards_fts WHERE shards_fts MATCH ?)".to_string(),
        );
        args.push(Box::new(keyword.clone()));
    }

    (clauses.join(" AND "), args)
}

pub(crate) fn list_shards_on_conn(conn: &Connection, filter: &ShardFilter) -> Result<Vec<Shard>> {
    let (where_clause, args) = build_filter_clause(filter);
    let mut sql = format!("SELECT {SHARD_COLUMNS} FROM shards WHERE {where_clause} ORDER BY created_at DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
        if let Some(offset) = filter.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), scan_shard)?;
    let mut shards = Vec::new();
    for row in rows {
        shards.push(row?);
    }
    Ok(shards)
}

impl SqliteStore {
    pub fn create_shard_impl(&self, shard: &Shard) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_shard_on_conn(&conn, shard)
    }

    pub fn get_shard_impl(&self, id: &str) -> Result<Shard> {
        let conn = self.lock_conn()?;
        get_shard_on_conn(&conn, id)
    }

    pub fn update_shard_impl(&self, id: &str, updates: &ShardUpdates) -> Result<()> {
        let conn = self.lock_conn()?;
        update_shard_on_conn(&conn, id, updates)
    }

    pub fn delete_shard_impl(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_shard_on_conn(&conn, id)
    }

    pub fn list_shards_impl(&self, filter: &ShardFilter) -> Result<Vec<Shard>> {
        let conn = self.lock_conn()?;
        list_shards_on_conn(&conn, filter)
    }
}
