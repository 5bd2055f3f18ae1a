//! End-to-end CLI integration tests for the `cp` binary.
//!
//! Each test creates its own temporary project directory, initializes it with
//! `cp init`, and exercises the `cp` binary as a subprocess via `assert_cmd`.
//! Embedding/generation providers are left unconfigured, so these tests only
//! cover paths that tolerate `ProviderError::NotConfigured` (i.e. everything
//! except `recall`, `memory recall`, and AI-generated summaries).

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cp() -> Command {
    Command::cargo_bin("cp").unwrap()
}

fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    cp().args(["init"]).current_dir(tmp.path()).assert().success();
    tmp
}

fn create_shard(tmp: &TempDir, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["shard", "create", title, "--output", "json"];
    args.extend_from_slice(extra_args);
    let output = cp().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success(), "shard create failed: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// init / update
// ---------------------------------------------------------------------------

#[test]
fn init_creates_palace_dir() {
    let tmp = TempDir::new().unwrap();
    cp().args(["init"]).current_dir(tmp.path()).assert().success();

    assert!(tmp.path().join(".palace").is_dir());
    assert!(tmp.path().join(".palace").join("config.yaml").is_file());
}

#[test]
fn init_refuses_double_init_without_force() {
    let tmp = init_project();

    cp().args(["init"]).current_dir(tmp.path()).assert().failure().stderr(predicate::str::contains("--force"));

    cp().args(["init", "--force"]).current_dir(tmp.path()).assert().success();
}

#[test]
fn update_refreshes_template_manifest() {
    let tmp = init_project();

    cp().args(["update"]).current_dir(tmp.path()).assert().success();
}

// ---------------------------------------------------------------------------
// shard CRUD
// ---------------------------------------------------------------------------

#[test]
fn shard_lifecycle() {
    let tmp = init_project();

    let id = create_shard(&tmp, "Fix login bug", &["--type", "bug", "--priority", "0", "--content", "Users can't log in"]);
    assert!(!id.is_empty());

    cp().args(["shard", "show", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix login bug"));

    cp().args(["shard", "update", &id, "--title", "Fix the login bug"])
        .current_dir(tmp.path())
        .assert()
        .success();

    cp().args(["shard", "show", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix the login bug"));

    cp().args(["shard", "close", &id, "--reason", "Fixed"]).current_dir(tmp.path()).assert().success();

    cp().args(["shard", "reopen", &id]).current_dir(tmp.path()).assert().success();
}

#[test]
fn shard_list_filters_by_type() {
    let tmp = init_project();

    create_shard(&tmp, "A bug", &["--type", "bug"]);
    create_shard(&tmp, "A task", &["--type", "task"]);

    let output = cp().args(["shard", "list", "--type", "bug", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn shard_link_and_edges() {
    let tmp = init_project();

    let a = create_shard(&tmp, "Shard A", &[]);
    let b = create_shard(&tmp, "Shard B", &[]);

    cp().args(["shard", "link", &a, &b, "--type", "references"]).current_dir(tmp.path()).assert().success();

    cp().args(["shard", "edges", &a]).current_dir(tmp.path()).assert().success().stdout(predicate::str::contains(&*b));

    cp().args(["shard", "unlink", &a, &b, "--type", "references"]).current_dir(tmp.path()).assert().success();
}

#[test]
fn shard_labels() {
    let tmp = init_project();
    let id = create_shard(&tmp, "Labeled shard", &[]);

    cp().args(["shard", "label", &id, "critical"]).current_dir(tmp.path()).assert().success();
    cp().args(["shard", "label", &id, "backend"]).current_dir(tmp.path()).assert().success();

    cp().args(["shard", "labels", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("critical"))
        .stdout(predicate::str::contains("backend"));
}

#[test]
fn show_nonexistent_shard_fails() {
    let tmp = init_project();

    cp().args(["shard", "show", "zz-nonexistent"]).current_dir(tmp.path()).assert().failure();
}

// ---------------------------------------------------------------------------
// memory
// ---------------------------------------------------------------------------

#[test]
fn memory_add_and_list() {
    let tmp = init_project();

    cp().args(["memory", "add", "Lesson learned", "--body", "Always check the cache first"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = cp().args(["memory", "list", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn memory_add_sub_requires_summary_without_ai() {
    let tmp = init_project();

    cp().args(["memory", "add", "Root memory", "--body", "root body"]).current_dir(tmp.path()).assert().success();

    let list_output = cp().args(["memory", "list", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&list_output.stdout).unwrap();
    let parent_id = list.as_array().unwrap()[0]["id"].as_str().unwrap().to_string();

    cp().args(["memory", "add-sub", &parent_id, "Child", "--body", "child body", "--no-ai"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--summary"));

    cp().args(["memory", "add-sub", &parent_id, "Child", "--body", "child body", "--no-ai", "--summary", "a child entry"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn memory_tree_and_delete() {
    let tmp = init_project();

    cp().args(["memory", "add", "Root", "--body", "root body"]).current_dir(tmp.path()).assert().success();

    let list_output = cp().args(["memory", "list", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&list_output.stdout).unwrap();
    let root_id = list.as_array().unwrap()[0]["id"].as_str().unwrap().to_string();

    cp().args(["memory", "add-sub", &root_id, "Sub entry", "--body", "sub body", "--no-ai", "--summary", "sub"])
        .current_dir(tmp.path())
        .assert()
        .success();

    cp().args(["memory", "tree", &root_id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Sub entry"));

    cp().args(["memory", "delete", &root_id, "--recursive"]).current_dir(tmp.path()).assert().success();

    cp().args(["memory", "show", &root_id]).current_dir(tmp.path()).assert().failure();
}

// ---------------------------------------------------------------------------
// knowledge
// ---------------------------------------------------------------------------

#[test]
fn knowledge_versioning_flow() {
    let tmp = init_project();

    cp().args(["knowledge", "create", "Architecture overview", "--content", "v1 content", "--doc-type", "architecture"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let list_output = cp().args(["knowledge", "list", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&list_output.stdout).unwrap();
    let arr = list.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    let id = arr[0]["id"].as_str().unwrap().to_string();

    cp().args(["knowledge", "update", &id, "--content", "v2 content", "--summary", "expanded v2"])
        .current_dir(tmp.path())
        .assert()
        .success();

    cp().args(["knowledge", "history", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("v2").or(predicate::str::contains("2")));

    cp().args(["knowledge", "diff", &id, "1", "2"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("v1 content").or(predicate::str::contains("v2 content")));

    // listing again should still show exactly one head, not the snapshot too.
    let list_output = cp().args(["knowledge", "list", "--output", "json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&list_output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// requirement
// ---------------------------------------------------------------------------

#[test]
fn requirement_lifecycle() {
    let tmp = init_project();

    let output = cp()
        .args(["requirement", "create", "Users must log in with MFA", "--content", "MFA is required", "--output", "json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let created: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    cp().args(["requirement", "approve", &id]).current_dir(tmp.path()).assert().success();

    // verify without an artifact and without --force should fail.
    cp().args(["requirement", "verify", &id]).current_dir(tmp.path()).assert().failure();

    let artifact_id = create_shard(&tmp, "PR #42", &[]);
    cp().args(["artifact", "add", &id, &artifact_id]).current_dir(tmp.path()).assert().success();

    cp().args(["requirement", "verify", &id]).current_dir(tmp.path()).assert().success();

    cp().args(["requirement", "reopen", &id, "--reason", "regression found"]).current_dir(tmp.path()).assert().success();

    cp().args(["requirement", "dashboard"]).current_dir(tmp.path()).assert().success();
}

// ---------------------------------------------------------------------------
// epic / focus / task
// ---------------------------------------------------------------------------

#[test]
fn epic_task_focus_flow() {
    let tmp = init_project();

    let output = cp()
        .args(["epic", "create", "Launch v2", "--content", "Ship the v2 release", "--output", "json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let epic: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let epic_id = epic["id"].as_str().unwrap().to_string();

    cp().args(["focus", "set", &epic_id, "--note", "working the launch"]).current_dir(tmp.path()).assert().success();

    cp().args(["focus", "show"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(&*epic_id));

    let task = create_shard(&tmp, "Write release notes", &["--parent", &epic_id]);

    cp().args(["task", "claim", &task]).current_dir(tmp.path()).assert().success();
    cp().args(["task", "get", &task]).current_dir(tmp.path()).assert().success();
    cp().args(["task", "close", &task]).current_dir(tmp.path()).assert().success();

    cp().args(["epic", "show", &epic_id, "--detail"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Write release notes"));

    cp().args(["focus", "clear"]).current_dir(tmp.path()).assert().success();
}

// ---------------------------------------------------------------------------
// status / admin
// ---------------------------------------------------------------------------

#[test]
fn status_reports_counts() {
    let tmp = init_project();

    create_shard(&tmp, "One", &[]);
    create_shard(&tmp, "Two", &[]);

    cp().args(["status"]).current_dir(tmp.path()).assert().success().stdout(predicate::str::contains("2 shards"));
}

#[test]
fn admin_embed_backfill_dry_run_reports_candidates() {
    let tmp = init_project();

    create_shard(&tmp, "Needs an embedding", &["--content", "some content"]);

    cp().args(["admin", "embed-backfill", "--dry-run"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn completion_generates_script() {
    cp().args(["completion", "bash"]).assert().success().stdout(predicate::str::contains("cp"));
}
