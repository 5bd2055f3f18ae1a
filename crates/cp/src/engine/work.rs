//! Work scheduling (§4.9): epics, assign/close, next/board, focus.
//!
//! An epic is a shard of type `epic`; its children are shards with
//! `parent = epic.id` and `type != epic`. Blocking between children is
//! expressed the same way as everywhere else -- a `blocked-by` edge.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

use palace_core::edge::Edge;
use palace_core::enums::{EdgeType, ShardType, Status};
use palace_core::error::PalaceError;
use palace_core::filter::ShardFilter;
use palace_core::focus::Focus;
use palace_core::shard::{Shard, ShardBuilder};
use palace_storage::{ShardUpdates, Storage};

type Result<T> = std::result::Result<T, PalaceError>;

const BOARD_CLOSED_HORIZON_HOURS: i64 = 24;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EpicProgress {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub open_unblocked: i64,
    pub open_blocked: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildRow {
    pub shard: Shard,
    pub kind: String,
    pub unresolved_blockers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseResult {
    pub shard: Shard,
    pub unblocked: Vec<Shard>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardView {
    pub open: Vec<Shard>,
    pub in_progress: Vec<Shard>,
    pub closed: Vec<Shard>,
}

fn require_epic(shard: &Shard) -> Result<()> {
    if shard.shard_type != ShardType::Epic {
        return Err(PalaceError::InvalidInput(format!("{} is not an epic shard", shard.id)));
    }
    Ok(())
}

fn kind_of(labels: &[String]) -> String {
    labels.iter().find_map(|l| l.strip_prefix("kind:")).unwrap_or("task").to_string()
}

/// Blockers of `shard_id` that are not themselves closed.
fn unresolved_blockers(storage: &dyn Storage, shard_id: &str) -> Result<Vec<Shard>> {
    let blockers = storage.shards_via_edge(shard_id, &EdgeType::BlockedBy, false)?;
    Ok(blockers.into_iter().filter(|b| !b.is_closed()).collect())
}

/// Creates an epic, optionally adopting existing shards as children and
/// wiring `blocked-by` edges between adopted shards.
///
/// `order` pairs are `(child_id, blocker_id)`; both ids must appear in
/// `adopt`, self-reference is rejected up front, and the whole thing is one
/// transaction -- a rejected pair (self-reference, or a cycle the store's
/// own `blocked-by` detection catches) leaves no partial adoption behind.
pub fn create(storage: &dyn Storage, project: &str, title: &str, content: &str, adopt: &[String], order: &[(String, String)], agent: &str) -> Result<Shard> {
    for (child, blocker) in order {
        if child == blocker {
            return Err(PalaceError::InvalidInput(format!("{child} cannot block itself")));
        }
        if !adopt.contains(child) || !adopt.contains(blocker) {
            return Err(PalaceError::InvalidInput(format!("blocker pair ({child}, {blocker}) must both appear in the adopted set")));
        }
    }

    let prefix = super::prefix_for_project(project);
    let id = super::mint_unique_id(storage, project, &prefix, title, content, agent)?;
    let epic = ShardBuilder::new(project, title).id(id).content(content).shard_type(ShardType::Epic).creator(agent).build();
    palace_core::validation::validate(&epic)?;

    for child_id in adopt {
        let child = storage.get_shard(child_id)?;
        if child.parent.is_some() {
            return Err(PalaceError::ConflictState(format!("{child_id} already has a parent, cannot adopt into {}", epic.id)));
        }
    }

    storage.run_in_transaction(&|tx| {
        tx.create_shard(&epic)?;
        tx.add_label(&epic.id, "kind:epic")?;
        for child_id in adopt {
            tx.update_shard(child_id, &ShardUpdates { parent: Some(Some(epic.id.clone())), ..Default::default() })?;
        }
        for (child, blocker) in order {
            tx.add_edge(&Edge::new(child.as_str(), blocker.as_str(), EdgeType::BlockedBy))?;
        }
        Ok(())
    })?;

    Ok(epic)
}

/// Direct, non-epic children of `epic_id`: counts of total/completed/
/// in-progress/open-unblocked/open-blocked.
pub fn progress(storage: &dyn Storage, epic_id: &str) -> Result<EpicProgress> {
    let epic = storage.get_shard(epic_id)?;
    require_epic(&epic)?;

    let filter = ShardFilter { parent_id: Some(epic_id.to_string()), ..ShardFilter::for_project(&epic.project) };
    let kids: Vec<Shard> = storage.list_shards(&filter)?.into_iter().filter(|s| s.shard_type != ShardType::Epic).collect();

    let mut out = EpicProgress { total: kids.len() as i64, ..Default::default() };
    for kid in &kids {
        match kid.status {
            Status::Closed => out.completed += 1,
            Status::InProgress => out.in_progress += 1,
            _ => {
                if unresolved_blockers(storage, &kid.id)?.is_empty() {
                    out.open_unblocked += 1;
                } else {
                    out.open_blocked += 1;
                }
            }
        }
    }
    Ok(out)
}

/// Direct children of `epic_id`, ordered in_progress, open, closed, then by
/// priority, then created_at; each annotated with its label-derived `kind`
/// and unresolved blocker ids.
pub fn children(storage: &dyn Storage, epic_id: &str) -> Result<Vec<ChildRow>> {
    let epic = storage.get_shard(epic_id)?;
    require_epic(&epic)?;

    let filter = ShardFilter { parent_id: Some(epic_id.to_string()), ..ShardFilter::for_project(&epic.project) };
    let mut kids: Vec<Shard> = storage.list_shards(&filter)?.into_iter().filter(|s| s.shard_type != ShardType::Epic).collect();

    kids.sort_by_key(|s| (status_rank(s.status.clone()), s.priority, s.created_at));

    let mut out = Vec::with_capacity(kids.len());
    for shard in kids {
        let labels = storage.get_labels(&shard.id)?;
        let blockers = unresolved_blockers(storage, &shard.id)?.into_iter().map(|b| b.id).collect();
        out.push(ChildRow { kind: kind_of(&labels), unresolved_blockers: blockers, shard });
    }
    Ok(out)
}

fn status_rank(status: Status) -> u8 {
    match status {
        Status::InProgress => 0,
        Status::Open => 1,
        Status::Closed => 2,
        Status::Custom(_) => 3,
    }
}

/// Assigns an open, unblocked shard to `agent`, moving it to `in_progress`.
pub fn assign(storage: &dyn Storage, shard_id: &str, agent: &str) -> Result<Shard> {
    let shard = storage.get_shard(shard_id)?;
    if shard.status != Status::Open {
        return Err(PalaceError::ConflictState(format!("{shard_id} is not open")));
    }
    if !unresolved_blockers(storage, shard_id)?.is_empty() {
        return Err(PalaceError::ConflictState(format!("{shard_id} has unresolved blockers")));
    }

    let metadata = palace_core::metadata::merge(&shard.metadata, &json!({"assigned_at": Utc::now()}))?;
    storage.update_shard(
        shard_id,
        &ShardUpdates {
            status: Some(Status::InProgress),
            owner: Some(Some(agent.to_string())),
            metadata: Some(metadata),
            ..Default::default()
        },
    )?;
    Ok(storage.get_shard(shard_id)?)
}

/// Closes a shard (idempotent if already closed), bumps its parent epic's
/// `updated_at`, and returns the shards that became unblocked as a result.
/// The caller decides whether to trigger a linked requirement's
/// auto-transition (§4.8) -- `close` itself only knows about scheduling.
pub fn close(storage: &dyn Storage, shard_id: &str, agent: &str, reason: Option<&str>) -> Result<CloseResult> {
    let mut shard = storage.get_shard(shard_id)?;
    if shard.is_closed() {
        return Ok(CloseResult { shard, unblocked: Vec::new() });
    }

    shard.close(agent, reason.map(str::to_string));
    storage.update_shard(
        shard_id,
        &ShardUpdates {
            status: Some(Status::Closed),
            closed_at: Some(shard.closed_at),
            closed_by: Some(shard.closed_by.clone()),
            closed_reason: Some(shard.closed_reason.clone()),
            ..Default::default()
        },
    )?;

    if let Some(parent_id) = &shard.parent {
        if let Ok(parent) = storage.get_shard(parent_id) {
            if parent.shard_type == ShardType::Epic {
                storage.update_shard(parent_id, &ShardUpdates::default())?;
            }
        }
    }

    let dependents = storage.shards_via_edge(shard_id, &EdgeType::BlockedBy, true)?;
    let mut unblocked = Vec::new();
    for dependent in dependents {
        if dependent.status != Status::Closed && unresolved_blockers(storage, &dependent.id)?.is_empty() {
            unblocked.push(dependent);
        }
    }

    let updated = storage.get_shard(shard_id)?;
    Ok(CloseResult { shard: updated, unblocked })
}

/// Open, unblocked, non-container shards, optionally scoped to an epic,
/// ordered by priority then creation time.
pub fn next(storage: &dyn Storage, project: &str, epic_id: Option<&str>, limit: usize) -> Result<Vec<Shard>> {
    let mut filter = ShardFilter::for_project(project).with_status(Status::Open);
    if let Some(epic_id) = epic_id {
        filter.parent_id = Some(epic_id.to_string());
    }
    let candidates = storage.list_shards(&filter)?;

    let mut out: Vec<Shard> = Vec::new();
    for shard in candidates {
        if shard.excluded_from_next() {
            continue;
        }
        if !unresolved_blockers(storage, &shard.id)?.is_empty() {
            continue;
        }
        out.push(shard);
    }
    out.sort_by_key(|s| (s.priority, s.created_at));
    out.truncate(limit);
    Ok(out)
}

/// Shards grouped by status. In global scope (no epic, no agent), closed
/// shards older than 24h are dropped to keep the view focused; scoped to an
/// epic or agent, every closed shard is included.
pub fn board(storage: &dyn Storage, project: &str, epic_id: Option<&str>, agent: Option<&str>) -> Result<BoardView> {
    let mut filter = ShardFilter::for_project(project);
    if let Some(epic_id) = epic_id {
        filter.parent_id = Some(epic_id.to_string());
    }
    let shards = storage.list_shards(&filter)?;

    let scoped = epic_id.is_some() || agent.is_some();
    let horizon: DateTime<Utc> = Utc::now() - Duration::hours(BOARD_CLOSED_HORIZON_HOURS);

    let mut view = BoardView::default();
    for shard in shards {
        if let Some(agent) = agent {
            if shard.owner.as_deref() != Some(agent) {
                continue;
            }
        }
        match shard.status {
            Status::Open => view.open.push(shard),
            Status::InProgress => view.in_progress.push(shard),
            Status::Closed => {
                if scoped || shard.closed_at.map(|t| t >= horizon).unwrap_or(true) {
                    view.closed.push(shard);
                }
            }
            Status::Custom(_) => {}
        }
    }
    Ok(view)
}

/// Upserts `(project, agent) -> epic`. The epic must exist and be of type
/// `epic`.
pub fn set_focus(storage: &dyn Storage, project: &str, agent: &str, epic_id: &str, note: Option<&str>) -> Result<()> {
    let epic = storage.get_shard(epic_id)?;
    require_epic(&epic)?;
    Ok(storage.set_focus(project, agent, epic_id, note)?)
}

/// Reads the current focus; if the referenced epic is closed, clears the
/// row and reports "no focus" instead.
pub fn get_focus(storage: &dyn Storage, project: &str, agent: &str) -> Result<Option<Focus>> {
    let focus = match storage.get_focus(project, agent)? {
        Some(f) => f,
        None => return Ok(None),
    };

    match storage.get_shard(&focus.epic_id) {
        Ok(epic) if epic.is_closed() => {
            storage.clear_focus(project, agent)?;
            Ok(None)
        }
        Ok(_) => Ok(Some(focus)),
        Err(_) => {
            storage.clear_focus(project, agent)?;
            Ok(None)
        }
    }
}

pub fn clear_focus(storage: &dyn Storage, project: &str, agent: &str) -> Result<bool> {
    let existed = storage.get_focus(project, agent)?.is_some();
    storage.clear_focus(project, agent)?;
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_storage::SqliteStore;

    fn task(store: &SqliteStore, id: &str, project: &str) -> Shard {
        let shard = ShardBuilder::new(project, id).id(id).build();
        store.create_shard(&shard).unwrap();
        shard
    }

    #[test]
    fn create_adopts_children_and_wires_blockers() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");

        let epic = create(&store, "palace", "Launch", "body", &["pf-a".into(), "pf-b".into()], &[("pf-b".into(), "pf-a".into())], "alice").unwrap();

        let a = store.get_shard("pf-a").unwrap();
        let b = store.get_shard("pf-b").unwrap();
        assert_eq!(a.parent.as_deref(), Some(epic.id.as_str()));
        assert_eq!(b.parent.as_deref(), Some(epic.id.as_str()));
        assert_eq!(unresolved_blockers(&store, "pf-b").unwrap().len(), 1);
    }

    #[test]
    fn create_rejects_self_blocking_pair() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        let err = create(&store, "palace", "Launch", "body", &["pf-a".into()], &[("pf-a".into(), "pf-a".into())], "alice").unwrap_err();
        assert!(matches!(err, PalaceError::InvalidInput(_)));
    }

    #[test]
    fn assign_requires_open_and_unblocked() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");
        store.add_edge(&Edge::new("pf-b", "pf-a", EdgeType::BlockedBy)).unwrap();

        let err = assign(&store, "pf-b", "alice").unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));

        let assigned = assign(&store, "pf-a", "alice").unwrap();
        assert_eq!(assigned.status, Status::InProgress);
        assert_eq!(assigned.owner.as_deref(), Some("alice"));
    }

    #[test]
    fn close_reports_newly_unblocked_dependents() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");
        store.add_edge(&Edge::new("pf-b", "pf-a", EdgeType::BlockedBy)).unwrap();

        let result = close(&store, "pf-a", "alice", Some("done")).unwrap();
        assert!(result.shard.is_closed());
        assert_eq!(result.unblocked.len(), 1);
        assert_eq!(result.unblocked[0].id, "pf-b");
    }

    #[test]
    fn close_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        close(&store, "pf-a", "alice", None).unwrap();
        let second = close(&store, "pf-a", "alice", None).unwrap();
        assert!(second.unblocked.is_empty());
    }

    #[test]
    fn next_excludes_blocked_and_container_types() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");
        store.add_edge(&Edge::new("pf-b", "pf-a", EdgeType::BlockedBy)).unwrap();

        let ready = next(&store, "palace", None, 5).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "pf-a");
    }

    #[test]
    fn epic_unblock_propagation_scenario() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");
        let epic = create(&store, "palace", "E", "body", &["pf-a".into(), "pf-b".into()], &[("pf-b".into(), "pf-a".into())], "alice").unwrap();

        let ready = next(&store, "palace", Some(&epic.id), 5).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "pf-a");

        assign(&store, "pf-a", "alice").unwrap();
        let result = close(&store, "pf-a", "alice", None).unwrap();
        assert_eq!(result.unblocked.len(), 1);

        let ready_after = next(&store, "palace", Some(&epic.id), 5).unwrap();
        assert_eq!(ready_after.len(), 1);
        assert_eq!(ready_after[0].id, "pf-b");
    }

    #[test]
    fn focus_auto_clears_when_epic_closes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let epic = create(&store, "palace", "X", "body", &[], &[], "alice").unwrap();

        set_focus(&store, "palace", "alice", &epic.id, Some("sprint 4")).unwrap();
        assert!(get_focus(&store, "palace", "alice").unwrap().is_some());

        close(&store, &epic.id, "alice", None).unwrap();
        assert!(get_focus(&store, "palace", "alice").unwrap().is_none());
    }

    #[test]
    fn clear_focus_reports_whether_one_existed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let epic = create(&store, "palace", "X", "body", &[], &[], "alice").unwrap();
        set_focus(&store, "palace", "alice", &epic.id, None).unwrap();

        assert!(clear_focus(&store, "palace", "alice").unwrap());
        assert!(!clear_focus(&store, "palace", "alice").unwrap());
    }

    #[test]
    fn board_groups_by_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        task(&store, "pf-a", "palace");
        task(&store, "pf-b", "palace");
        close(&store, "pf-b", "alice", None).unwrap();

        let view = board(&store, "palace", None, None).unwrap();
        assert_eq!(view.open.len(), 1);
        assert_eq!(view.closed.len(), 1);
    }
}
