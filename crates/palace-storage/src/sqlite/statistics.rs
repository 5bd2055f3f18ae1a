//! Aggregate project statistics backing the `status` command.

use rusqlite::params;

use crate::error::Result;
use crate::sqlite::store::SqliteStore;
use crate::traits::Statistics;

impl SqliteStore {
    /// Returns aggregate shard counts for a project.
    pub fn get_statistics_impl(&self, project: &str) -> Result<Statistics> {
        let conn = self.lock_conn()?;
        let mut stats = Statistics::default();

        stats.total_shards = conn.query_row(
            "SELECT COUNT(*) FROM shards WHERE project = ?1",
            params![project],
            |row| row.get(0),
        )?;
        stats.open_shards = conn.query_row(
            "SELECT COUNT(*) FROM shards WHERE project = ?1 AND status = 'open'",
            params![project],
            |row| row.get(0),
        )?;
        stats.closed_shards = conn.query_row(
            "SELECT COUNT(*) FROM shards WHERE project = ?1 AND status = 'closed'",
            params![project],
            |row| row.get(0),
        )?;
        stats.in_progress_shards = conn.query_row(
            "SELECT COUNT(*) FROM shards WHERE project = ?1 AND status = 'in_progress'",
            params![project],
            |row| row.get(0),
        )?;

        {
            let mut stmt = conn.prepare(
                "SELECT type, COUNT(*) FROM shards WHERE project = ?1 GROUP BY type ORDER BY COUNT(*) DESC",
            )?;
            let rows = stmt.query_map(params![project], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_type.push(row?);
            }
        }

        {
            let mut stmt =
                conn.prepare("SELECT project, COUNT(*) FROM shards GROUP BY project ORDER BY COUNT(*) DESC")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                stats.by_project.push(row?);
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::enums::Status;
    use palace_core::shard::ShardBuilder;

    #[test]
    fn statistics_count_by_status_and_type() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_shard_impl(&ShardBuilder::new("palace", "Open task").id("pf-s1").build())
            .unwrap();
        store
            .create_shard_impl(
                &ShardBuilder::new("palace", "Closed task")
                    .id("pf-s2")
                    .status(Status::Closed)
                    .build(),
            )
            .unwrap();

        let stats = store.get_statistics_impl("palace").unwrap();
        assert_eq!(stats.total_shards, 2);
        assert_eq!(stats.open_shards, 1);
        assert_eq!(stats.closed_shards, 1);
        assert_eq!(stats.by_project, vec![("palace".to_string(), 2)]);
    }
}
