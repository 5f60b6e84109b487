//! CLI tests for the `am` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_messages(dir: &Path, content: &str) {
    let config_dir = dir.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("audit_messages.yml"), content).unwrap();
}

fn app() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_messages(
        temp.path(),
        r#"
manage:
  accounts:
    create: "Created account %{id}"
sessions:
  destroy: "User logged out"
"#,
    );
    write_messages(&temp.path().join("plugins/blog"), "posts:\n  create: \"Created post %{title}\"\n");
    temp
}

fn am(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("am").unwrap();
    // Point --config at an empty file so a developer's own config never leaks in
    let config = root.join("auditmsg-test.yml");
    fs::write(&config, "log-level: error\n").unwrap();
    cmd.arg("--config").arg(config).arg("--root").arg(root);
    cmd
}

#[test]
fn test_render() {
    let temp = app();
    am(temp.path())
        .args(["render", "manage/accounts", "create", "-p", "id=123", "-p", "name=Acme"])
        .assert()
        .success()
        .stdout("[AUDIT] Created account 123\n");
}

#[test]
fn test_render_missing_param_is_annotated() {
    let temp = app();
    am(temp.path())
        .args(["render", "manage/accounts", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Created account %{id} (interpolation error: key{id} not found)",
        ));
}

#[test]
fn test_render_with_tags() {
    let temp = app();
    am(temp.path())
        .args(["render", "sessions", "destroy", "-t", "req-9"])
        .assert()
        .success()
        .stdout("[AUDIT] [req-9] User logged out\n");
}

#[test]
fn test_render_unknown_message_fails() {
    let temp = app();
    am(temp.path())
        .args(["render", "nope", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No message for nope nope"));
}

#[test]
fn test_lookup_plugin_message() {
    let temp = app();
    am(temp.path())
        .args(["lookup", "posts", "create"])
        .assert()
        .success()
        .stdout("Created post %{title}\n");
}

#[test]
fn test_check_ok() {
    let temp = app();
    am(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 messages, 2 placeholders from 2 of 2 sources"))
        .stdout(predicate::str::contains("Messages OK"));
}

#[test]
fn test_check_reports_rejected_source() {
    let temp = app();
    write_messages(&temp.path().join("plugins/zz-broken"), "- not\n- a mapping\n");
    am(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("zz-broken"))
        .stderr(predicate::str::contains("1 source(s) rejected"));
}

#[test]
fn test_sources_lists_candidates() {
    let temp = app();
    fs::create_dir_all(temp.path().join("engines/empty")).unwrap();
    am(temp.path())
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("plugins/blog"))
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn test_tree_prints_yaml() {
    let temp = app();
    am(temp.path())
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("accounts:"))
        .stdout(predicate::str::contains("posts:"));
}
