//! Focus CRUD for [`SqliteStore`] (§4.9).

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use palace_core::enums::{ShardType, Status};
use palace_core::focus::Focus;

use crate::error::Result;
use crate::sqlite::shards::{format_datetime, get_shard_on_conn, parse_datetime};
use crate::sqlite::store::SqliteStore;

pub(crate) fn set_focus_on_conn(
    conn: &Connection,
    project: &str,
    agent: &str,
    epic_id: &str,
    note: Option<&str>,
) -> Result<()> {
    // Invariant 7: focus epic, if present, must exist and be of type `epic`.
    let epic = get_shard_on_conn(conn, epic_id)?;
    if epic.shard_type != ShardType::Epic {
        return Err(crate::error::StorageError::validation(format!(
            "shard {epic_id} is not an epic"
        )));
    }

    conn.execute(
        "INSERT OR REPLACE INTO focus (project, agent, epic_id, set_at, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project, agent, epic_id, format_datetime(&Utc::now()), note],
    )?;
    Ok(())
}

pub(crate) fn clear_focus_on_conn(conn: &Connection, project: &str, agent: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM focus WHERE project = ?1 AND agent = ?2",
        params![project, agent],
    )?;
    Ok(())
}

/// Reads the focus row for `(project, agent)`. If the pointed-to epic is
/// closed, the row is auto-cleared and `None` is returned (invariant 7).
pub(crate) fn get_focus_on_conn(conn: &Connection, project: &str, agent: &str) -> Result<Option<Focus>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT epic_id, set_at, note FROM focus WHERE project = ?1 AND agent = ?2",
            params![project, agent],
            |row| {
                let note: Option<String> = row.get("note")?;
                Ok((row.get("epic_id")?, row.get("set_at")?, note.unwrap_or_default()))
            },
        )
        .optional()?;

    let Some((epic_id, set_at, note)) = row else {
        return Ok(None);
    };

    let epic = get_shard_on_conn(conn, &epic_id)?;
    if epic.status == Status::Closed {
        clear_focus_on_conn(conn, project, agent)?;
        return Ok(None);
    }

    Ok(Some(Focus {
        project: project.to_string(),
        agent: agent.to_string(),
        epic_id,
        set_at: parse_datetime(&set_at),
        note: if note.is_empty() { None } else { Some(note) },
    }))
}

impl SqliteStore {
    pub fn set_focus_impl(&self, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()> {
        let conn = self.lock_conn()?;
        set_focus_on_conn(&conn, project, agent, epic_id, note)
    }

    pub fn clear_focus_impl(&self, project: &str, agent: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        clear_focus_on_conn(&conn, project, agent)
    }

    pub fn get_focus_impl(&self, project: &str, agent: &str) -> Result<Option<Focus>> {
        let conn = self.lock_conn()?;
        get_focus_on_conn(&conn, project, agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::shard::ShardBuilder;

    fn store_with_epic(status: Status) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut epic = ShardBuilder::new("palace", "Epic").id("pf-e1").shard_type(ShardType::Epic).build();
        epic.status = status;
        store.create_shard_impl(&epic).unwrap();
        store
    }

    #[test]
    fn set_and_get_focus() {
        let store = store_with_epic(Status::Open);
        store.set_focus_impl("palace", "alice", "pf-e1", Some("note")).unwrap();
        let focus = store.get_focus_impl("palace", "alice").unwrap().unwrap();
        assert_eq!(focus.epic_id, "pf-e1");
        assert_eq!(focus.note.as_deref(), Some("note"));
    }

    #[test]
    fn rejects_non_epic_target() {
        let store = SqliteStore::open_in_memory().unwrap();
        let task = ShardBuilder::new("palace", "Task").id("pf-t1").build();
        store.create_shard_impl(&task).unwrap();
        assert!(store.set_focus_impl("palace", "alice", "pf-t1", None).is_err());
    }

    #[test]
    fn closed_epic_auto_clears_focus() {
        let store = store_with_epic(Status::Open);
        store.set_focus_impl("palace", "alice", "pf-e1", None).unwrap();

        // Simulate the epic closing out from under the focus pointer.
        {
            let conn = store.lock_conn().unwrap();
            conn.execute("UPDATE shards SET status = 'closed' WHERE id = 'pf-e1'", []).unwrap();
        }

        let focus = store.get_focus_impl("palace", "alice").unwrap();
        assert!(focus.is_none());
    }
}
