//! Hierarchical agent memory (§4.6): tree/children/path/hot reads and the
//! add-sub/delete/move/promote/sync mutations over memory-type shards.
//!
//! A memory shard's parent is recorded twice -- the `parent` column and a
//! `child-of` edge -- and its content carries a pointer block (§4.5, §9)
//! indexing its direct children for quick in-context browsing. Mutations
//! keep both in lockstep inside a single transaction; `sync` reconciles
//! them if they ever drift.

use std::cell::RefCell;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use palace_core::edge::Edge;
use palace_core::enums::{EdgeType, ShardType};
use palace_core::error::PalaceError;
use palace_core::filter::ShardFilter;
use palace_core::pointer_block::{self, PointerEntry};
use palace_core::shard::{Shard, ShardBuilder};
use palace_storage::{ShardUpdates, Storage};

use crate::providers::EmbeddingProvider;

type Result<T> = std::result::Result<T, PalaceError>;

/// Depth past which `add_sub` logs a warning (not an error -- deep trees
/// are legal, just worth noticing).
const DEPTH_WARNING_THRESHOLD: usize = 6;

/// Hard cap on recursion depth for `tree`, guarding against a cycle that
/// slipped past the store's own detection.
const MAX_TREE_DEPTH: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub shard: Shard,
    pub depth: usize,
    pub child_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildView {
    pub shard: Shard,
    pub child_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotNode {
    pub shard: Shard,
    pub depth: usize,
    pub access_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Drift {
    /// A `child-of` edge exists with no matching pointer entry in the parent.
    MissingPointer { parent: String, child: String },
    /// A pointer entry exists with no matching `child-of` edge.
    StalePointer { parent: String, child: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub drifts: Vec<Drift>,
    pub applied: bool,
}

fn require_memory(shard: &Shard) -> Result<()> {
    if shard.shard_type != ShardType::Memory {
        return Err(PalaceError::InvalidInput(format!("{} is not a memory shard", shard.id)));
    }
    Ok(())
}

fn access_count(shard: &Shard) -> i64 {
    shard.metadata.get("access_count").and_then(|v| v.as_i64()).unwrap_or(0)
}

/// Ancestor chain from the root down to (and including) `id`.
pub fn path(storage: &dyn Storage, id: &str) -> Result<Vec<Shard>> {
    let mut chain = vec![storage.get_shard(id)?];
    loop {
        let current = chain.last().expect("just pushed");
        match &current.parent {
            Some(parent_id) => chain.push(storage.get_shard(parent_id)?),
            None => break,
        }
    }
    chain.reverse();
    Ok(chain)
}

/// Direct children of `parent_id`, each annotated with its own child count.
pub fn children(storage: &dyn Storage, parent_id: &str) -> Result<Vec<ChildView>> {
    let kids = storage.shards_via_edge(parent_id, &EdgeType::ChildOf, false)?;
    let mut out = Vec::with_capacity(kids.len());
    for shard in kids {
        let child_count = storage.shards_via_edge(&shard.id, &EdgeType::ChildOf, false)?.len();
        out.push(ChildView { shard, child_count });
    }
    Ok(out)
}

fn tree_from(storage: &dyn Storage, root: Shard, depth: usize, out: &mut Vec<TreeNode>) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(PalaceError::Inconsistent(format!("memory tree exceeds max depth at {}", root.id)));
    }
    let kids = storage.shards_via_edge(&root.id, &EdgeType::ChildOf, false)?;
    out.push(TreeNode {
        shard: root.clone(),
        depth,
        child_count: kids.len(),
    });
    for kid in kids {
        tree_from(storage, kid, depth + 1, out)?;
    }
    Ok(())
}

/// The full subtree rooted at `root_id`, depth-first, parent before children.
/// With `root_id: None`, every root memory shard (`parent_null`) in `project`.
pub fn tree(storage: &dyn Storage, project: &str, root_id: Option<&str>) -> Result<Vec<TreeNode>> {
    let mut out = Vec::new();
    match root_id {
        Some(id) => {
            let root = storage.get_shard(id)?;
            require_memory(&root)?;
            tree_from(storage, root, 0, &mut out)?;
        }
        None => {
            let filter = ShardFilter {
                parent_null: Some(true),
                ..ShardFilter::for_project(project).with_type(ShardType::Memory)
            };
            for root in storage.list_shards(&filter)? {
                tree_from(storage, root, 0, &mut out)?;
            }
        }
    }
    Ok(out)
}

/// Memory shards whose access count exceeds their parent's, at or below
/// `min_depth`, ordered by access count descending -- "hot" pointers worth
/// promoting or highlighting, per §4.6.
pub fn hot(storage: &dyn Storage, project: &str, min_depth: usize, limit: usize) -> Result<Vec<HotNode>> {
    let nodes = tree(storage, project, None)?;
    let by_id: std::collections::HashMap<&str, &TreeNode> = nodes.iter().map(|n| (n.shard.id.as_str(), n)).collect();

    let mut hot_nodes: Vec<HotNode> = nodes
        .iter()
        .filter(|n| n.depth >= min_depth)
        .filter_map(|n| {
            let my_count = access_count(&n.shard);
            let parent_count = n.shard.parent.as_deref().and_then(|p| by_id.get(p)).map(|p| access_count(&p.shard)).unwrap_or(0);
            if my_count > parent_count {
                Some(HotNode {
                    shard: n.shard.clone(),
                    depth: n.depth,
                    access_count: my_count,
                })
            } else {
                None
            }
        })
        .collect();

    hot_nodes.sort_by(|a, b| b.access_count.cmp(&a.access_count));
    hot_nodes.truncate(limit);
    Ok(hot_nodes)
}

/// Records that `agent` accessed `id`, bumping `metadata.access_count`.
/// Called by recall/show paths that read memory content into an agent's
/// context window; never fails the caller's read on a write race (§9 --
/// access_log races are tolerated, last write wins).
pub fn touch(storage: &dyn Storage, id: &str) -> Result<()> {
    let shard = storage.get_shard(id)?;
    let count = access_count(&shard) + 1;
    let metadata = palace_core::metadata::merge(&shard.metadata, &json!({"access_count": count, "last_accessed": Utc::now()}))?;
    storage.update_shard(id, &ShardUpdates { metadata: Some(metadata), ..Default::default() })?;
    Ok(())
}

/// Creates a root memory shard (no parent, no pointer-block ancestor to
/// update). Embeds `body` the same way [`add_sub`] does: a failed embed call
/// is downgraded to a warning rather than blocking creation.
pub fn create_root(storage: &dyn Storage, embedding: &dyn EmbeddingProvider, project: &str, title: &str, body: &str, agent: &str) -> Result<Shard> {
    let vector = match embedding.embed(body) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "embedding provider unavailable, creating root memory without an embedding");
            None
        }
    };

    let prefix = super::prefix_for_project(project);
    let id = super::mint_unique_id(storage, project, &prefix, title, body, agent)?;
    let mut builder = ShardBuilder::new(project, title).id(id).content(body).shard_type(ShardType::Memory).creator(agent);
    if let Some(v) = vector {
        builder = builder.embedding(v);
    }
    let root = builder.build();
    palace_core::validation::validate(&root)?;
    storage.create_shard(&root)?;
    Ok(root)
}

/// Every root memory shard (no parent) in `project`.
pub fn list_roots(storage: &dyn Storage, project: &str) -> Result<Vec<Shard>> {
    let filter = ShardFilter {
        parent_null: Some(true),
        ..ShardFilter::for_project(project).with_type(ShardType::Memory)
    };
    Ok(storage.list_shards(&filter)?)
}

/// Proposes an AI summary for a prospective sub-entry, for the caller to
/// present to the user before calling [`add_sub`]. Pure w.r.t. storage: no
/// shard is created.
pub fn propose_child_summary(generation: &dyn crate::providers::GenerationProvider, parent_title: &str, child_title: &str, child_body: &str) -> Result<String> {
    let prompt = super::summary::child_summary_prompt(parent_title, child_title, child_body);
    super::summary::summarize(generation, &prompt)
}

/// Creates a memory sub-entry under `parent_id` with an already-resolved
/// `summary`, linking it via both the `parent` column and a `child-of`
/// edge, and appending a pointer entry to the parent's content.
///
/// Embeds `body` before opening the transaction (§5: external I/O never
/// happens inside a write transaction); a failed embed call is downgraded
/// to a logged warning and the child is created with no embedding rather
/// than failing the whole operation.
pub fn add_sub(
    storage: &dyn Storage,
    embedding: &dyn EmbeddingProvider,
    project: &str,
    parent_id: &str,
    title: &str,
    body: &str,
    labels: &[String],
    summary: String,
    agent: &str,
) -> Result<Shard> {
    let parent = storage.get_shard(parent_id)?;
    require_memory(&parent)?;

    let depth = path(storage, parent_id)?.len();
    if depth >= DEPTH_WARNING_THRESHOLD {
        tracing::warn!(parent_id, depth, "memory tree is getting deep");
    }

    let vector = match embedding.embed(body) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "embedding provider unavailable, creating sub-memory without an embedding");
            None
        }
    };

    let prefix = super::prefix_for_project(project);
    let id = super::mint_unique_id(storage, project, &prefix, title, body, agent)?;

    let mut builder = ShardBuilder::new(project, title)
        .id(id)
        .content(body)
        .shard_type(ShardType::Memory)
        .creator(agent)
        .parent(parent_id);
    if let Some(v) = vector {
        builder = builder.embedding(v);
    }
    let child = builder.build();
    let child_id = child.id.clone();
    palace_core::validation::validate(&child)?;

    let result: RefCell<Option<Shard>> = RefCell::new(None);
    storage.run_in_transaction(&|tx| {
        tx.create_shard(&child)?;
        for label in labels {
            tx.add_label(&child.id, label)?;
        }
        tx.add_edge(&Edge::new(parent_id, child.id.as_str(), EdgeType::ChildOf).with_metadata(json!({"summary": summary})))?;

        let new_content = pointer_block::append(
            &parent.content,
            PointerEntry {
                id: child.id.clone(),
                title: child.title.clone(),
                summary: summary.clone(),
            },
        );
        tx.update_shard(parent_id, &ShardUpdates { content: Some(new_content), ..Default::default() })?;

        *result.borrow_mut() = Some(tx.get_shard(&child.id)?);
        Ok(())
    })?;

    result.into_inner().ok_or_else(|| PalaceError::Inconsistent(format!("sub-memory {child_id} vanished after commit")))
}

/// Deletes a memory shard. Refuses if it has children unless `recursive`;
/// otherwise deletes the whole subtree leaves-first. Edge/label/receipt
/// rows cascade at the schema level (`ON DELETE CASCADE`); only the parent's
/// pointer-block entry needs explicit cleanup.
pub fn delete(storage: &dyn Storage, id: &str, recursive: bool) -> Result<()> {
    let shard = storage.get_shard(id)?;
    require_memory(&shard)?;

    let mut descendants = vec![shard.clone()];
    let mut frontier = vec![shard.clone()];
    while let Some(node) = frontier.pop() {
        let kids = storage.shards_via_edge(&node.id, &EdgeType::ChildOf, false)?;
        if !kids.is_empty() && !recursive && node.id == id {
            return Err(PalaceError::ConflictState(format!("{id} has children; pass --recursive to delete them too")));
        }
        for kid in kids {
            descendants.push(kid.clone());
            frontier.push(kid);
        }
    }

    // Leaves first: reverse BFS order is deepest-discovered-last, so
    // reversing the whole list deletes children before their ancestors.
    descendants.reverse();

    storage.run_in_transaction(&|tx| {
        for node in &descendants {
            tx.delete_shard(&node.id)?;
        }
        Ok(())
    })?;

    if let Some(parent_id) = &shard.parent {
        if let Ok(parent) = storage.get_shard(parent_id) {
            let new_content = pointer_block::remove(&parent.content, id);
            if new_content != parent.content {
                storage.update_shard(parent_id, &ShardUpdates { content: Some(new_content), ..Default::default() })?;
            }
        }
    }

    Ok(())
}

/// Forbids moving a shard into itself or one of its own descendants.
fn assert_not_into_descendant(storage: &dyn Storage, id: &str, new_parent_id: &str) -> Result<()> {
    if id == new_parent_id {
        return Err(PalaceError::ConflictState(format!("cannot move {id} into itself")));
    }
    let ancestry = path(storage, new_parent_id)?;
    if ancestry.iter().any(|s| s.id == id) {
        return Err(PalaceError::ConflictState(format!("cannot move {id} into its own descendant {new_parent_id}")));
    }
    Ok(())
}

/// Relocates a memory shard under a new parent (or to the root, with
/// `new_parent_id: None`), preserving the summary carried in the old
/// parent's pointer entry.
pub fn move_shard(storage: &dyn Storage, id: &str, new_parent_id: Option<&str>) -> Result<()> {
    let shard = storage.get_shard(id)?;
    require_memory(&shard)?;

    if let Some(new_parent_id) = new_parent_id {
        let new_parent = storage.get_shard(new_parent_id)?;
        require_memory(&new_parent)?;
        assert_not_into_descendant(storage, id, new_parent_id)?;
    }

    let old_parent_id = shard.parent.clone();
    let old_summary = old_parent_id
        .as_deref()
        .and_then(|p| storage.get_shard(p).ok())
        .map(|p| pointer_block::parse(&p.content))
        .and_then(|parsed| parsed.entries.into_iter().find(|e| e.id == id))
        .map(|e| e.summary)
        .unwrap_or_default();

    storage.run_in_transaction(&|tx| {
        if let Some(old_id) = &old_parent_id {
            tx.remove_edge(old_id, id, &EdgeType::ChildOf)?;
            let old_parent = tx.get_shard(old_id)?;
            let new_content = pointer_block::remove(&old_parent.content, id);
            tx.update_shard(old_id, &ShardUpdates { content: Some(new_content), ..Default::default() })?;
        }

        if let Some(new_id) = new_parent_id {
            tx.add_edge(&Edge::new(new_id, id, EdgeType::ChildOf).with_metadata(json!({"summary": old_summary.clone()})))?;
            let new_parent = tx.get_shard(new_id)?;
            let new_content = pointer_block::append(
                &new_parent.content,
                PointerEntry {
                    id: id.to_string(),
                    title: shard.title.clone(),
                    summary: old_summary.clone(),
                },
            );
            tx.update_shard(new_id, &ShardUpdates { content: Some(new_content), ..Default::default() })?;
        }

        tx.update_shard(
            id,
            &ShardUpdates {
                parent: Some(new_parent_id.map(str::to_string)),
                ..Default::default()
            },
        )?;
        Ok(())
    })?;

    Ok(())
}

/// Moves a memory shard up one level: under its grandparent, or to the
/// root if its parent is already a root. Rejects promoting a root shard
/// (nothing above it to move under).
pub fn promote(storage: &dyn Storage, id: &str) -> Result<Shard> {
    let shard = storage.get_shard(id)?;
    require_memory(&shard)?;

    let Some(parent_id) = &shard.parent else {
        return Err(PalaceError::ConflictState(format!("{id} is already a root memory shard")));
    };
    let parent = storage.get_shard(parent_id)?;
    let grandparent_id = parent.parent;

    move_shard(storage, id, grandparent_id.as_deref())?;
    Ok(storage.get_shard(id)?)
}

/// Compares each memory shard's `child-of` edges against its pointer-block
/// entries and reports drift. With `apply`, heals it: a missing pointer is
/// added back, a stale pointer with no matching edge is dropped.
pub fn sync(storage: &dyn Storage, project: &str, parent_id: Option<&str>, apply: bool) -> Result<SyncReport> {
    let parents: Vec<Shard> = match parent_id {
        Some(id) => vec![storage.get_shard(id)?],
        None => storage.list_shards(&ShardFilter::for_project(project).with_type(ShardType::Memory))?,
    };

    let mut drifts = Vec::new();
    for parent in &parents {
        let edge_children = storage.shards_via_edge(&parent.id, &EdgeType::ChildOf, false)?;
        let parsed = pointer_block::parse(&parent.content);

        let edge_ids: std::collections::HashSet<&str> = edge_children.iter().map(|c| c.id.as_str()).collect();
        let pointer_ids: std::collections::HashSet<&str> = parsed.entries.iter().map(|e| e.id.as_str()).collect();

        for child in &edge_children {
            if !pointer_ids.contains(child.id.as_str()) {
                drifts.push(Drift::MissingPointer { parent: parent.id.clone(), child: child.id.clone() });
            }
        }
        for entry in &parsed.entries {
            if !edge_ids.contains(entry.id.as_str()) {
                drifts.push(Drift::StalePointer { parent: parent.id.clone(), child: entry.id.clone() });
            }
        }

        if apply && !drifts.is_empty() {
            let mut entries: Vec<PointerEntry> = parsed.entries.iter().filter(|e| edge_ids.contains(e.id.as_str())).cloned().collect();
            for child in &edge_children {
                if !entries.iter().any(|e| e.id == child.id) {
                    entries.push(PointerEntry { id: child.id.clone(), title: child.title.clone(), summary: String::new() });
                }
            }
            let new_content = pointer_block::replace_all(&parsed.main_content, &entries);
            if new_content != parent.content {
                storage.update_shard(&parent.id, &ShardUpdates { content: Some(new_content), ..Default::default() })?;
            }
        }
    }

    Ok(SyncReport { drifts, applied: apply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::ScriptedEmbeddingProvider;
    use palace_core::enums::Status;
    use palace_storage::SqliteStore;

    fn store_with_root() -> (SqliteStore, Shard) {
        let store = SqliteStore::open_in_memory().unwrap();
        let root = ShardBuilder::new("palace", "Root memory").id("pf-root").shard_type(ShardType::Memory).build();
        store.create_shard(&root).unwrap();
        (store, root)
    }

    #[test]
    fn add_sub_links_parent_and_child_and_updates_pointer_block() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);

        let child = add_sub(&store, &embed, "palace", "pf-root", "Deploy notes", "deployed v2", &[], "notes on v2 deploy".into(), "alice").unwrap();

        assert_eq!(child.parent.as_deref(), Some("pf-root"));
        assert!(child.embedding.is_some());

        let parent = store.get_shard("pf-root").unwrap();
        let parsed = pointer_block::parse(&parent.content);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].id, child.id);

        let kids = children(&store, "pf-root").unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].shard.id, child.id);
    }

    #[test]
    fn add_sub_survives_embedding_failure() {
        let (store, _root) = store_with_root();
        let mut embed = ScriptedEmbeddingProvider::new(8);
        embed.fail = true;

        let child = add_sub(&store, &embed, "palace", "pf-root", "Deploy notes", "body", &[], "summary".into(), "alice").unwrap();
        assert!(child.embedding.is_none());
    }

    #[test]
    fn add_sub_rejects_non_memory_parent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let task = ShardBuilder::new("palace", "A task").id("pf-task").build();
        store.create_shard(&task).unwrap();
        let embed = ScriptedEmbeddingProvider::new(8);

        let err = add_sub(&store, &embed, "palace", "pf-task", "Child", "body", &[], "s".into(), "alice").unwrap_err();
        assert!(matches!(err, PalaceError::InvalidInput(_)));
    }

    #[test]
    fn delete_leaf_removes_pointer_entry_from_parent() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        delete(&store, &child.id, false).unwrap();

        assert!(store.get_shard(&child.id).is_err());
        let parent = store.get_shard("pf-root").unwrap();
        assert!(pointer_block::parse(&parent.content).entries.is_empty());
    }

    #[test]
    fn delete_with_children_requires_recursive() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        let err = delete(&store, "pf-root", false).unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));

        delete(&store, "pf-root", true).unwrap();
        assert!(store.get_shard("pf-root").is_err());
    }

    #[test]
    fn move_shard_rejects_move_into_own_descendant() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        let err = move_shard(&store, "pf-root", Some(&child.id)).unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));
    }

    #[test]
    fn move_shard_relinks_pointer_blocks() {
        let (store, _root) = store_with_root();
        let other_root = ShardBuilder::new("palace", "Other root").id("pf-other").shard_type(ShardType::Memory).build();
        store.create_shard(&other_root).unwrap();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        move_shard(&store, &child.id, Some("pf-other")).unwrap();

        let old_root = store.get_shard("pf-root").unwrap();
        assert!(pointer_block::parse(&old_root.content).entries.is_empty());
        let new_root = store.get_shard("pf-other").unwrap();
        assert_eq!(pointer_block::parse(&new_root.content).entries.len(), 1);
        let moved = store.get_shard(&child.id).unwrap();
        assert_eq!(moved.parent.as_deref(), Some("pf-other"));
    }

    #[test]
    fn tree_reports_depth_and_child_counts() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();
        add_sub(&store, &embed, "palace", &child.id, "Grandchild", "body", &[], "s".into(), "alice").unwrap();

        let nodes = tree(&store, "palace", None).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].depth, 0);
        assert_eq!(nodes[0].child_count, 1);
    }

    #[test]
    fn hot_surfaces_children_accessed_more_than_their_parent() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        for _ in 0..3 {
            touch(&store, &child.id).unwrap();
        }

        let hot_nodes = hot(&store, "palace", 0, 10).unwrap();
        assert_eq!(hot_nodes.len(), 1);
        assert_eq!(hot_nodes[0].shard.id, child.id);
        assert_eq!(hot_nodes[0].access_count, 3);
    }

    #[test]
    fn sync_detects_and_heals_stale_pointer() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        // Manually drop the edge without touching the pointer block, to simulate drift.
        store.remove_edge("pf-root", &child.id, &EdgeType::ChildOf).unwrap();

        let report = sync(&store, "palace", Some("pf-root"), false).unwrap();
        assert_eq!(report.drifts, vec![Drift::StalePointer { parent: "pf-root".into(), child: child.id.clone() }]);

        let applied = sync(&store, "palace", Some("pf-root"), true).unwrap();
        assert_eq!(applied.drifts.len(), 1);
        let parent = store.get_shard("pf-root").unwrap();
        assert!(pointer_block::parse(&parent.content).entries.is_empty());
    }

    #[test]
    fn path_returns_root_first_chain() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        let chain = path(&store, &child.id).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].id, "pf-root");
        assert_eq!(chain[1].id, child.id);
    }

    #[test]
    fn promote_child_of_root_moves_to_root() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();

        let promoted = promote(&store, &child.id).unwrap();
        assert!(promoted.parent.is_none());
        assert_eq!(promoted.status, Status::Open);
    }

    #[test]
    fn promote_grandchild_moves_under_grandparent_not_root() {
        let (store, _root) = store_with_root();
        let embed = ScriptedEmbeddingProvider::new(8);
        let child = add_sub(&store, &embed, "palace", "pf-root", "Child", "body", &[], "s".into(), "alice").unwrap();
        let grandchild = add_sub(&store, &embed, "palace", &child.id, "Grandchild", "body", &[], "s".into(), "alice").unwrap();

        let promoted = promote(&store, &grandchild.id).unwrap();
        assert_eq!(promoted.parent.as_deref(), Some("pf-root"));

        // the grandchild should now be a direct child of the root, not left
        // dangling under the now-bypassed intermediate parent.
        let root_children = children(&store, "pf-root").unwrap();
        assert!(root_children.iter().any(|c| c.shard.id == grandchild.id));
    }

    #[test]
    fn promote_root_fails() {
        let (store, root) = store_with_root();
        assert!(promote(&store, &root.id).is_err());
    }
}
