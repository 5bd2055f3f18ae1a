//! DDL statements and migrations for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format (SQLite has no native
//! datetime type). Booleans are stored as INTEGER (0/1). JSON blobs are TEXT.
//! `shards_fts` is an FTS5 virtual table kept in sync with `shards` by
//! triggers, realizing the tsvector-like keyword index over `title||content`
//! named in the data model (§3).

/// Current schema version. Bumped whenever DDL or migrations change.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Shards table ---------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS shards (
        id            TEXT PRIMARY KEY,
        project       TEXT NOT NULL,
        title         TEXT NOT NULL,
        content       TEXT NOT NULL DEFAULT '',
        type          TEXT NOT NULL DEFAULT 'task',
        status        TEXT NOT NULL DEFAULT 'open',
        priority      INTEGER NOT NULL DEFAULT 0,
        creator       TEXT NOT NULL DEFAULT '',
        owner         TEXT,
        created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        closed_at     TEXT,
        closed_by     TEXT,
        closed_reason TEXT,
        metadata      TEXT NOT NULL DEFAULT '{}',
        embedding     BLOB,
        parent        TEXT REFERENCES shards(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_shards_project ON shards(project)",
    "CREATE INDEX IF NOT EXISTS idx_shards_type ON shards(project, type)",
    "CREATE INDEX IF NOT EXISTS idx_shards_status ON shards(project, status)",
    "CREATE INDEX IF NOT EXISTS idx_shards_creator ON shards(creator)",
    "CREATE INDEX IF NOT EXISTS idx_shards_created_at ON shards(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_shards_parent ON shards(parent)",
    // -- Keyword index (FTS5), synced by triggers ----------------------------
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS shards_fts USING fts5(
        id UNINDEXED,
        title,
        content,
        content='shards',
        content_rowid='rowid'
    )
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS shards_fts_insert AFTER INSERT ON shards BEGIN
        INSERT INTO shards_fts(rowid, id, title, content)
        VALUES (new.rowid, new.id, new.title, new.content);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS shards_fts_delete AFTER DELETE ON shards BEGIN
        INSERT INTO shards_fts(shards_fts, rowid, id, title, content)
        VALUES ('delete', old.rowid, old.id, old.title, old.content);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS shards_fts_update AFTER UPDATE ON shards BEGIN
        INSERT INTO shards_fts(shards_fts, rowid, id, title, content)
        VALUES ('delete', old.rowid, old.id, old.title, old.content);
        INSERT INTO shards_fts(rowid, id, title, content)
        VALUES (new.rowid, new.id, new.title, new.content);
    END
    "#,
    // -- Edges table ----------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS edges (
        "from"     TEXT NOT NULL,
        "to"       TEXT NOT NULL,
        type       TEXT NOT NULL,
        metadata   TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        PRIMARY KEY ("from", "to", type),
        FOREIGN KEY ("from") REFERENCES shards(id) ON DELETE CASCADE,
        FOREIGN KEY ("to") REFERENCES shards(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(\"from\")",
    "CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(\"to\")",
    "CREATE INDEX IF NOT EXISTS idx_edges_to_type ON edges(\"to\", type)",
    // -- Labels table -----------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS labels (
        shard_id TEXT NOT NULL,
        label    TEXT NOT NULL,
        PRIMARY KEY (shard_id, label),
        FOREIGN KEY (shard_id) REFERENCES shards(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_labels_label ON labels(label)",
    // -- Read receipts table ----------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS read_receipts (
        shard_id TEXT NOT NULL,
        agent_id TEXT NOT NULL,
        read_at  TEXT NOT NULL,
        PRIMARY KEY (shard_id, agent_id),
        FOREIGN KEY (shard_id) REFERENCES shards(id) ON DELETE CASCADE
    )
    "#,
    // -- Focus table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS focus (
        project TEXT NOT NULL,
        agent   TEXT NOT NULL,
        epic_id TEXT NOT NULL,
        set_at  TEXT NOT NULL,
        note    TEXT,
        PRIMARY KEY (project, agent),
        FOREIGN KEY (epic_id) REFERENCES shards(id) ON DELETE CASCADE
    )
    "#,
    // -- Config table ---------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS config (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    // -- Metadata table (schema/migration bookkeeping, distinct from per-shard metadata) --
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Default configuration values inserted on first init.
pub const DEFAULT_CONFIG: &[(&str, &str)] = &[("similarity_floor", "0.30"), ("embedding_dim", "768")];

/// Schema migrations applied after initial DDL.
///
/// Each migration is a `(name, sql)` pair. Migrations are tracked in the
/// `metadata` table under the key `migration:<name>` so they run at most once.
pub const MIGRATIONS: &[(&str, &str)] = &[
    // Future migrations go here, e.g.:
    // ("001_add_foo_column", "ALTER TABLE shards ADD COLUMN foo TEXT DEFAULT ''"),
];
