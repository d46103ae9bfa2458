//! End-to-end CLI integration tests for the `bd` binary.
//!
//! Each test creates its own temporary directory, initializes a beads
//! project, and exercises the `bd` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bd() -> Command {
    Command::cargo_bin("bd").unwrap()
}

fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    bd().args(["init", "--prefix", "t"]).current_dir(tmp.path()).assert().success();
    tmp
}

fn create_issue(tmp: &TempDir, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["create", title, "--json"];
    args.extend_from_slice(extra_args);
    let output = bd().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success(), "create failed: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

#[test]
fn init_creates_beads_dir() {
    let tmp = TempDir::new().unwrap();
    bd().args(["init", "--prefix", "test"]).current_dir(tmp.path()).assert().success();
    assert!(tmp.path().join(".beads").is_dir());
}

#[test]
fn full_lifecycle() {
    let tmp = init_project();

    let id = create_issue(&tmp, "Bug: login broken", &["-t", "bug", "-p", "critical"]);
    assert!(id.starts_with('t'));

    bd().args(["show", &id, "--json"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("login broken"));

    bd().args(["update", &id, "--status", "in_progress"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd().args(["show", &id, "--json"]).current_dir(tmp.path()).output().unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show["status"].as_str().unwrap(), "in_progress");

    bd().args(["close", &id, "-r", "Fixed"]).current_dir(tmp.path()).assert().success();

    let output = bd().args(["list", "--json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 0, "closed issue excluded from default list");

    bd().args(["reopen", &id]).current_dir(tmp.path()).assert().success();

    let output = bd().args(["list", "--json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn dependencies_and_ready() {
    let tmp = init_project();

    let parent = create_issue(&tmp, "Parent task", &[]);
    let child = create_issue(&tmp, "Child task", &[]);

    bd().args(["dep", "add", &child, &parent]).current_dir(tmp.path()).assert().success();

    let output = bd().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&parent.as_str()));
    assert!(!ready_ids.contains(&child.as_str()), "child should be blocked");

    bd().args(["close", &parent]).current_dir(tmp.path()).assert().success();

    let output = bd().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&child.as_str()), "child should now be ready");
}

#[test]
fn delete_hard_removes_issue() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Delete me", &[]);

    bd().args(["delete", &id, "--hard"]).current_dir(tmp.path()).assert().success();

    bd().args(["show", &id]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn doctor_reports_no_problems_on_clean_store() {
    let tmp = init_project();
    create_issue(&tmp, "Fine issue", &[]);

    bd().args(["doctor"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no problems found"));
}

#[test]
fn config_get_and_set() {
    let tmp = init_project();

    bd().args(["config", "set", "actor", "alice"]).current_dir(tmp.path()).assert().success();

    bd().args(["config", "get"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn show_nonexistent_issue_fails() {
    let tmp = init_project();
    bd().args(["show", "t-nonexistent"]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn create_without_title_fails() {
    let tmp = init_project();
    bd().args(["create"]).current_dir(tmp.path()).assert().failure();
}
