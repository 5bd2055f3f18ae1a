//! Versioned knowledge documents (§4.7).
//!
//! A knowledge shard is its own head: `update`/`append` snapshot the prior
//! content into a new shard id'd `<id>-v<N>` (linked by a `previous-version`
//! edge from the head), then overwrite the head in place. `metadata.version`
//! on the head tracks the current version number.

use chrono::Utc;
use serde_json::json;
use similar::TextDiff;

use palace_core::edge::Edge;
use palace_core::enums::{DocType, EdgeType, ShardType, Status};
use palace_core::error::PalaceError;
use palace_core::filter::ShardFilter;
use palace_core::shard::{Shard, ShardBuilder};
use palace_storage::{ShardUpdates, Storage};

type Result<T> = std::result::Result<T, PalaceError>;

fn require_knowledge(shard: &Shard) -> Result<()> {
    if shard.shard_type != ShardType::Knowledge {
        return Err(PalaceError::InvalidInput(format!("{} is not a knowledge shard", shard.id)));
    }
    Ok(())
}

fn current_version(shard: &Shard) -> u32 {
    shard.metadata.get("version").and_then(|v| v.as_u64()).unwrap_or(1) as u32
}

/// Creates a new knowledge document at version 1.
pub fn create(storage: &dyn Storage, project: &str, title: &str, content: &str, doc_type: DocType, labels: &[String], agent: &str) -> Result<Shard> {
    let prefix = super::prefix_for_project(project);
    let id = super::mint_unique_id(storage, project, &prefix, title, content, agent)?;

    let shard = ShardBuilder::new(project, title)
        .id(id)
        .content(content)
        .shard_type(ShardType::Knowledge)
        .creator(agent)
        .metadata(json!({
            "doc_type": doc_type.as_str(),
            "version": 1,
            "last_change_summary": "Initial document",
            "last_changed_by": agent,
        }))
        .build();
    palace_core::validation::validate(&shard)?;

    storage.run_in_transaction(&|tx| {
        tx.create_shard(&shard)?;
        for label in labels {
            tx.add_label(&shard.id, label)?;
        }
        Ok(())
    })?;

    Ok(shard)
}

/// Every knowledge document head in `project` (snapshots are not listed --
/// they're only reachable through [`history`]/[`version`]).
pub fn list(storage: &dyn Storage, project: &str) -> Result<Vec<Shard>> {
    let all = storage.list_shards(&ShardFilter::for_project(project).with_type(ShardType::Knowledge))?;
    Ok(all.into_iter().filter(|s| s.metadata.get("snapshot_of").is_none()).collect())
}

/// Snapshots the current content into a `<id>-v<N>` shard, then replaces
/// the head's content with `new_content`. Rejects a no-op update (identical
/// content) rather than churning out an empty snapshot, and rejects a
/// closed document (closing freezes its history).
///
/// The snapshot carries the head's metadata as of the version it freezes --
/// including that version's own `last_change_summary` -- so `history` can
/// read each row's summary from its own metadata rather than threading it
/// through separately. The head then gets a fresh `last_change_summary`/
/// `last_changed_by`/`previous_version_id` for the version it just became.
fn update_content(storage: &dyn Storage, id: &str, new_content: String, summary: Option<String>, agent: &str) -> Result<Shard> {
    let head = storage.get_shard(id)?;
    require_knowledge(&head)?;

    if head.status == Status::Closed {
        return Err(PalaceError::ConflictState(format!("{id} is closed; its history is frozen")));
    }
    if head.content == new_content {
        return Err(PalaceError::ConflictState(format!("{id} content is unchanged")));
    }

    let old_version = current_version(&head);
    let snapshot_id = palace_core::idgen::snapshot_id(id, old_version);
    let new_version = old_version + 1;

    if storage.get_shard(&snapshot_id).is_ok() {
        return Err(PalaceError::ConflictState(format!("snapshot {snapshot_id} already exists")));
    }

    let snapshot_metadata = palace_core::metadata::merge(&head.metadata, &json!({"version": old_version, "snapshot_of": id}))?;
    let snapshot = ShardBuilder::new(&head.project, &head.title)
        .id(snapshot_id.clone())
        .content(head.content.clone())
        .shard_type(ShardType::Knowledge)
        .status(Status::Closed)
        .creator(head.creator.clone())
        .metadata(snapshot_metadata)
        .build();

    let changed_at = Utc::now();
    let metadata = palace_core::metadata::merge(
        &head.metadata,
        &json!({
            "version": new_version,
            "updated_at": changed_at,
            "last_change_summary": summary,
            "last_changed_by": agent,
            "previous_version_id": snapshot_id,
        }),
    )?;

    storage.run_in_transaction(&|tx| {
        tx.create_shard(&snapshot)?;
        tx.add_edge(
            &Edge::new(id, snapshot_id.as_str(), EdgeType::PreviousVersion)
                .with_metadata(json!({"change_summary": summary, "changed_by": agent, "changed_at": changed_at})),
        )?;
        tx.update_shard(
            id,
            &ShardUpdates {
                content: Some(new_content.clone()),
                metadata: Some(metadata.clone()),
                ..Default::default()
            },
        )?;
        Ok(())
    })?;

    Ok(storage.get_shard(id)?)
}

/// Replaces a knowledge document's content outright, snapshotting the prior
/// version.
pub fn update(storage: &dyn Storage, id: &str, new_content: &str, summary: Option<String>, agent: &str) -> Result<Shard> {
    update_content(storage, id, new_content.to_string(), summary, agent)
}

/// Appends `text` to a knowledge document's content, snapshotting the prior
/// version.
pub fn append(storage: &dyn Storage, id: &str, text: &str, summary: Option<String>, agent: &str) -> Result<Shard> {
    let head = storage.get_shard(id)?;
    require_knowledge(&head)?;
    let new_content = if head.content.is_empty() { text.to_string() } else { format!("{}\n\n{}", head.content, text) };
    update_content(storage, id, new_content, summary, agent)
}

/// The head plus every snapshot reachable via `previous-version` edges,
/// newest first.
pub fn history(storage: &dyn Storage, id: &str) -> Result<Vec<Shard>> {
    let head = storage.get_shard(id)?;
    require_knowledge(&head)?;

    let mut out = vec![head];
    let mut current_id = id.to_string();
    loop {
        let older = storage.shards_via_edge(&current_id, &EdgeType::PreviousVersion, false)?;
        match older.into_iter().next() {
            Some(snapshot) => {
                current_id = snapshot.id.clone();
                out.push(snapshot);
            }
            None => break,
        }
    }
    Ok(out)
}

/// A specific version of a knowledge document: the head if it matches the
/// head's current version, otherwise the matching snapshot.
pub fn version(storage: &dyn Storage, id: &str, requested: u32) -> Result<Shard> {
    let head = storage.get_shard(id)?;
    require_knowledge(&head)?;
    if current_version(&head) == requested {
        return Ok(head);
    }
    let snapshot_id = palace_core::idgen::snapshot_id(id, requested);
    Ok(storage.get_shard(&snapshot_id)?)
}

/// Unified diff (3 lines of context) between two versions' content. If
/// `from > to`, the pair is silently swapped so the diff always reads
/// forward.
pub fn diff(storage: &dyn Storage, id: &str, from: u32, to: u32) -> Result<String> {
    let (from, to) = if from > to { (to, from) } else { (from, to) };
    let old = version(storage, id, from)?;
    let new = version(storage, id, to)?;

    let text_diff = TextDiff::from_lines(&old.content, &new.content);
    Ok(text_diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("v{from}"), &format!("v{to}"))
        .to_string())
}
