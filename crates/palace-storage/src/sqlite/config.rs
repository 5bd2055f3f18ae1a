//! Persisted key/value config and schema-bookkeeping metadata for [`SqliteStore`].

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

pub(crate) fn set_config_on_conn(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn get_config_on_conn(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row("SELECT value FROM config WHERE key = ?1", params![key], |row| row.get(0))
        .optional()?
        .ok_or_else(|| StorageError::not_found("config", key))
}

pub(crate) fn get_all_config_on_conn(conn: &Connection) -> Result<std::collections::HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM config")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let mut out = std::collections::HashMap::new();
    for row in rows {
        let (k, v) = row?;
        out.insert(k, v);
    }
    Ok(out)
}

pub(crate) fn set_metadata_on_conn(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn get_metadata_on_conn(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| row.get(0))
        .optional()?
        .ok_or_else(|| StorageError::not_found("metadata", key))
}

impl SqliteStore {
    pub fn set_config_impl(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        set_config_on_conn(&conn, key, value)
    }

    pub fn get_config_impl(&self, key: &str) -> Result<String> {
        let conn = self.lock_conn()?;
        get_config_on_conn(&conn, key)
    }

    pub fn get_all_config_impl(&self) -> Result<std::collections::HashMap<String, String>> {
        let conn = self.lock_conn()?;
        get_all_config_on_conn(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_seeded() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_config_impl("similarity_floor").unwrap(), "0.30");
    }

    #[test]
    fn set_then_get_config() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_config_impl("embedding_dim", "1536").unwrap();
        assert_eq!(store.get_config_impl("embedding_dim").unwrap(), "1536");
    }

    #[test]
    fn missing_config_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get_config_impl("missing").unwrap_err().is_not_found());
    }
}
