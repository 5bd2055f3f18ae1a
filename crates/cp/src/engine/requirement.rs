//! Requirement lifecycle (§4.8).
//!
//! `status` stays the generic open/in_progress/closed column; the
//! requirement-specific state machine (`draft -> approved -> in_progress ->
//! implemented -> verified`, with `reopen` back to `approved`) lives in
//! `metadata.lifecycle_status` per §9, so the generic store never needs to
//! know about it.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use palace_core::edge::Edge;
use palace_core::enums::{EdgeType, LifecycleStatus, ShardType};
use palace_core::error::PalaceError;
use palace_core::shard::{Shard, ShardBuilder};
use palace_storage::{ShardUpdates, Storage};

type Result<T> = std::result::Result<T, PalaceError>;

fn require_requirement(shard: &Shard) -> Result<()> {
    if shard.shard_type != ShardType::Requirement {
        return Err(PalaceError::InvalidInput(format!("{} is not a requirement shard", shard.id)));
    }
    Ok(())
}

fn lifecycle_status(shard: &Shard) -> LifecycleStatus {
    shard.metadata.get("lifecycle_status").and_then(|v| v.as_str()).map(LifecycleStatus::from).unwrap_or_default()
}

fn set_lifecycle(storage: &dyn Storage, id: &str, status: LifecycleStatus) -> Result<Shard> {
    let shard = storage.get_shard(id)?;
    let metadata = palace_core::metadata::merge(&shard.metadata, &json!({"lifecycle_status": status.as_str()}))?;
    storage.update_shard(id, &ShardUpdates { metadata: Some(metadata), ..Default::default() })?;
    Ok(storage.get_shard(id)?)
}

/// Creates a new requirement in `draft`.
pub fn create(storage: &dyn Storage, project: &str, title: &str, content: &str, priority: i32, category: Option<&str>, agent: &str) -> Result<Shard> {
    let prefix = super::prefix_for_project(project);
    let id = super::mint_unique_id(storage, project, &prefix, title, content, agent)?;

    let mut metadata = json!({"lifecycle_status": LifecycleStatus::Draft.as_str()});
    if let Some(category) = category {
        metadata = palace_core::metadata::merge(&metadata, &json!({"category": category}))?;
    }

    let shard = ShardBuilder::new(project, title)
        .id(id)
        .content(content)
        .shard_type(ShardType::Requirement)
        .priority(priority)
        .creator(agent)
        .metadata(metadata)
        .build();
    palace_core::validation::validate(&shard)?;

    storage.create_shard(&shard)?;
    Ok(shard)
}

/// Every requirement shard in `project`.
pub fn list(storage: &dyn Storage, project: &str) -> Result<Vec<Shard>> {
    let filter = palace_core::filter::ShardFilter::for_project(project).with_type(ShardType::Requirement);
    Ok(storage.list_shards(&filter)?)
}

/// `draft -> approved`.
pub fn approve(storage: &dyn Storage, id: &str) -> Result<Shard> {
    let shard = storage.get_shard(id)?;
    require_requirement(&shard)?;
    let status = lifecycle_status(&shard);
    if !status.can_approve() {
        return Err(PalaceError::ConflictState(format!("{id} is {status}, cannot approve (expected draft)")));
    }
    set_lifecycle(storage, id, LifecycleStatus::Approved)
}

/// `implemented -> verified`. Requires at least one `has-artifact` edge to
/// a `test`-type shard, unless `force` bypasses the check (§4.8: a
/// requirement can be verified without an automated test, but that's an
/// explicit override, not the default path).
pub fn verify(storage: &dyn Storage, id: &str, force: bool) -> Result<Shard> {
    let shard = storage.get_shard(id)?;
    require_requirement(&shard)?;
    let status = lifecycle_status(&shard);
    if !status.can_verify() && !force {
        return Err(PalaceError::ConflictState(format!("{id} is {status}, cannot verify (expected implemented)")));
    }

    if !force {
        let artifacts = storage.shards_via_edge(id, &EdgeType::HasArtifact, false)?;
        let has_test_artifact = artifacts.iter().any(|a| a.shard_type == ShardType::Test);
        if !has_test_artifact {
            return Err(PalaceError::ConflictState(format!("{id} has no test artifact; pass --force to verify without one")));
        }
    }

    set_lifecycle(storage, id, LifecycleStatus::Verified)
}

/// Any non-draft state back to `approved`.
pub fn reopen(storage: &dyn Storage, id: &str, reason: Option<&str>) -> Result<Shard> {
    let shard = storage.get_shard(id)?;
    require_requirement(&shard)?;
    let status = lifecycle_status(&shard);
    if !status.can_reopen() {
        return Err(PalaceError::ConflictState(format!("{id} is draft, cannot reopen")));
    }

    let mut metadata = palace_core::metadata::merge(&shard.metadata, &json!({"lifecycle_status": LifecycleStatus::Approved.as_str()}))?;
    if let Some(reason) = reason {
        metadata = palace_core::metadata::merge(&metadata, &json!({"reopened_reason": reason, "reopened_at": Utc::now()}))?;
    }
    storage.update_shard(id, &ShardUpdates { metadata: Some(metadata), ..Default::default() })?;
    Ok(storage.get_shard(id)?)
}

/// Records that `id` is blocked by `blocker_id`. Cycle freedom is enforced
/// by the store itself (§3 invariant 5); this just forwards the edge.
pub fn link(storage: &dyn Storage, id: &str, blocker_id: &str) -> Result<()> {
    storage.get_shard(id)?;
    storage.get_shard(blocker_id)?;
    Ok(storage.add_edge(&Edge::new(id, blocker_id, EdgeType::BlockedBy))?)
}

pub fn unlink(storage: &dyn Storage, id: &str, blocker_id: &str) -> Result<()> {
    Ok(storage.remove_edge(id, blocker_id, &EdgeType::BlockedBy)?)
}

/// If every task `implements`-linked to `requirement_id` is closed, and the
/// requirement is still `in_progress` or earlier, auto-advances it to
/// `implemented`. Called by `engine::work::close` so finishing the last
/// linked task moves the requirement forward without a separate step.
pub fn maybe_auto_implement(storage: &dyn Storage, requirement_id: &str) -> Result<()> {
    let shard = storage.get_shard(requirement_id)?;
    if shard.shard_type != ShardType::Requirement {
        return Ok(());
    }
    let status = lifecycle_status(&shard);
    if matches!(status, LifecycleStatus::Implemented | LifecycleStatus::Verified) {
        return Ok(());
    }

    let implementers = storage.shards_via_edge(requirement_id, &EdgeType::Implements, true)?;
    if !implementers.is_empty() && implementers.iter().all(|t| t.is_closed()) {
        set_lifecycle(storage, requirement_id, LifecycleStatus::Implemented)?;
    }
    Ok(())
}

/// When an `implements` edge lands on an `approved` requirement, promotes it
/// to `in_progress` -- starting work on a task is itself the signal that the
/// requirement moved past planning. No-op if the requirement isn't a
/// requirement shard or isn't currently `approved`.
pub fn maybe_auto_in_progress(storage: &dyn Storage, requirement_id: &str) -> Result<()> {
    let shard = storage.get_shard(requirement_id)?;
    if shard.shard_type != ShardType::Requirement {
        return Ok(());
    }
    if lifecycle_status(&shard) != LifecycleStatus::Approved {
        return Ok(());
    }
    set_lifecycle(storage, requirement_id, LifecycleStatus::InProgress)?;
    Ok(())
}

/// One row of the requirement dashboard: a requirement's lifecycle state
/// plus the linked-work counts that explain it.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub id: String,
    pub title: String,
    pub lifecycle_status: String,
    pub priority: i32,
    pub category: Option<String>,
    pub linked_task_count: usize,
    pub closed_task_count: usize,
    pub linked_test_count: usize,
    pub unresolved_blocker_ids: Vec<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Per-requirement dashboard: lifecycle status, priority, category, task and
/// test coverage, and unresolved blockers, for every open requirement in
/// `project`. Ordered by priority, then creation time, so the most urgent
/// still-open work sorts first.
pub fn dashboard(storage: &dyn Storage, project: &str) -> Result<Vec<DashboardRow>> {
    let filter = palace_core::filter::ShardFilter::for_project(project).with_type(ShardType::Requirement);
    let mut requirements: Vec<Shard> = storage.list_shards(&filter)?.into_iter().filter(|r| !r.is_closed()).collect();
    requirements.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at.cmp(&b.created_at)));

    let mut rows = Vec::with_capacity(requirements.len());
    for r in &requirements {
        let implementers = storage.shards_via_edge(&r.id, &EdgeType::Implements, true)?;
        let linked_task_count = implementers.iter().filter(|t| t.shard_type == ShardType::Task).count();
        let closed_task_count = implementers.iter().filter(|t| t.shard_type == ShardType::Task && t.is_closed()).count();

        let artifacts = storage.shards_via_edge(&r.id, &EdgeType::HasArtifact, false)?;
        let linked_test_count = artifacts.iter().filter(|a| a.shard_type == ShardType::Test).count();

        let blockers = storage.shards_via_edge(&r.id, &EdgeType::BlockedBy, false)?;
        let unresolved_blocker_ids = blockers.iter().filter(|b| !b.is_closed()).map(|b| b.id.clone()).collect();

        rows.push(DashboardRow {
            id: r.id.clone(),
            title: r.title.clone(),
            lifecycle_status: lifecycle_status(r).as_str().to_string(),
            priority: r.priority,
            category: r.metadata.get("category").and_then(|v| v.as_str()).map(String::from),
            linked_task_count,
            closed_task_count,
            linked_test_count,
            unresolved_blocker_ids,
            created_at: r.created_at,
            updated_at: r.updated_at,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::enums::Status;
    use palace_storage::SqliteStore;

    #[test]
    fn create_starts_in_draft() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "Must support SSO", "body", 1, None, "alice").unwrap();
        assert_eq!(lifecycle_status(&req), LifecycleStatus::Draft);
    }

    #[test]
    fn approve_moves_draft_to_approved() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        let approved = approve(&store, &req.id).unwrap();
        assert_eq!(lifecycle_status(&approved), LifecycleStatus::Approved);
    }

    #[test]
    fn approve_twice_is_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        approve(&store, &req.id).unwrap();
        let err = approve(&store, &req.id).unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));
    }

    #[test]
    fn verify_without_force_requires_implemented_and_test_artifact() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        let err = verify(&store, &req.id, false).unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));
    }

    #[test]
    fn verify_succeeds_with_test_artifact() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        set_lifecycle(&store, &req.id, LifecycleStatus::Implemented).unwrap();

        let test_shard = ShardBuilder::new("palace", "SSO test").id("pf-test1").shard_type(ShardType::Test).status(Status::Closed).build();
        store.create_shard(&test_shard).unwrap();
        store.add_edge(&Edge::new(&req.id, "pf-test1", EdgeType::HasArtifact)).unwrap();

        let verified = verify(&store, &req.id, false).unwrap();
        assert_eq!(lifecycle_status(&verified), LifecycleStatus::Verified);
    }

    #[test]
    fn verify_with_force_bypasses_checks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        let verified = verify(&store, &req.id, true).unwrap();
        assert_eq!(lifecycle_status(&verified), LifecycleStatus::Verified);
    }

    #[test]
    fn reopen_requires_non_draft() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        let err = reopen(&store, &req.id, None).unwrap_err();
        assert!(matches!(err, PalaceError::ConflictState(_)));

        approve(&store, &req.id).unwrap();
        let reopened = reopen(&store, &req.id, Some("needs rework")).unwrap();
        assert_eq!(lifecycle_status(&reopened), LifecycleStatus::Approved);
    }

    #[test]
    fn maybe_auto_implement_advances_when_all_tasks_closed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        set_lifecycle(&store, &req.id, LifecycleStatus::InProgress).unwrap();

        let task = ShardBuilder::new("palace", "Do the work").id("pf-task1").status(Status::Closed).build();
        store.create_shard(&task).unwrap();
        store.add_edge(&Edge::new("pf-task1", &req.id, EdgeType::Implements)).unwrap();

        maybe_auto_implement(&store, &req.id).unwrap();
        let updated = store.get_shard(&req.id).unwrap();
        assert_eq!(lifecycle_status(&updated), LifecycleStatus::Implemented);
    }

    #[test]
    fn maybe_auto_in_progress_promotes_approved_requirement() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();
        approve(&store, &req.id).unwrap();

        let task = ShardBuilder::new("palace", "Do the work").id("pf-task1").build();
        store.create_shard(&task).unwrap();
        store.add_edge(&Edge::new("pf-task1", &req.id, EdgeType::Implements)).unwrap();

        maybe_auto_in_progress(&store, &req.id).unwrap();
        let updated = store.get_shard(&req.id).unwrap();
        assert_eq!(lifecycle_status(&updated), LifecycleStatus::InProgress);
    }

    #[test]
    fn maybe_auto_in_progress_ignores_non_approved_requirement() {
        let store = SqliteStore::open_in_memory().unwrap();
        let req = create(&store, "palace", "T", "body", 1, None, "alice").unwrap();

        maybe_auto_in_progress(&store, &req.id).unwrap();
        let updated = store.get_shard(&req.id).unwrap();
        assert_eq!(lifecycle_status(&updated), LifecycleStatus::Draft);
    }

    #[test]
    fn dashboard_reports_per_requirement_coverage_and_excludes_closed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = create(&store, "palace", "A", "body", 2, None, "alice").unwrap();
        let b = create(&store, "palace", "B", "body", 1, None, "alice").unwrap();
        approve(&store, &a.id).unwrap();

        let task = ShardBuilder::new("palace", "Do the work").id("pf-task1").status(Status::Closed).build();
        store.create_shard(&task).unwrap();
        store.add_edge(&Edge::new("pf-task1", &a.id, EdgeType::Implements)).unwrap();

        let blocker = ShardBuilder::new("palace", "Blocker").id("pf-block1").build();
        store.create_shard(&blocker).unwrap();
        store.add_edge(&Edge::new(&b.id, "pf-block1", EdgeType::BlockedBy)).unwrap();

        let closed = create(&store, "palace", "Closed", "body", 1, None, "alice").unwrap();
        store.update_shard(&closed.id, &ShardUpdates { status: Some(palace_core::enums::Status::Closed), ..Default::default() }).unwrap();

        let rows = dashboard(&store, "palace").unwrap();
        assert_eq!(rows.len(), 2);
        // ordered by priority ascending: b (priority 1) before a (priority 2)
        assert_eq!(rows[0].id, b.id);
        assert_eq!(rows[0].unresolved_blocker_ids, vec!["pf-block1".to_string()]);
        assert_eq!(rows[1].id, a.id);
        assert_eq!(rows[1].linked_task_count, 1);
        assert_eq!(rows[1].closed_task_count, 1);
    }
}
