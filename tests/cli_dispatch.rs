use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_dropfarm(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dropfarm"))
        .current_dir(root)
        .env_remove("DROPFARM_CONFIG")
        .env_remove("DROPFARM_API_URL")
        .env_remove("DROPFARM_TOKEN")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("DROPFARM_DB", root.join("cache.sqlite"))
        .arg("--api-url")
        .arg("http://127.0.0.1:9/v1/")
        .args(args)
        .output()
        .expect("dropfarm command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn help_lists_commands() {
    let root = unique_workspace("dropfarm-cli-help");
    let output = run_dropfarm(&root, &["--help"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["login", "sync", "search", "projects", "tasks", "due"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn empty_cache_reads_work_offline() {
    let root = unique_workspace("dropfarm-cli-offline");

    let projects = run_dropfarm(&root, &["projects", "--json"]);
    assert_success(&projects);
    assert_eq!(parse_json(&projects), Value::Array(Vec::new()));

    let due = run_dropfarm(&root, &["due", "--json"]);
    assert_success(&due);
    let due = parse_json(&due);
    assert_eq!(due["tasks"], Value::Array(Vec::new()));
    assert_eq!(due["chores"], Value::Array(Vec::new()));

    let search = run_dropfarm(&root, &["search", "bridge"]);
    assert_success(&search);
    assert!(String::from_utf8_lossy(&search.stdout).contains("nothing matched 'bridge'"));

    assert!(root.join("cache.sqlite").exists());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn mutations_fail_without_a_session() {
    let root = unique_workspace("dropfarm-cli-signed-out");
    let output = run_dropfarm(&root, &["chores", "done", "r-1"]);
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: not signed in"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unknown_project_is_reported_for_progress() {
    let root = unique_workspace("dropfarm-cli-progress");
    let output = run_dropfarm(&root, &["progress", "Linea"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("no project matches 'Linea'"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn invalid_config_file_is_rejected() {
    let root = unique_workspace("dropfarm-cli-config");
    std::fs::write(root.join("dropfarm.toml"), "[search]\nmax_results = 0\n")
        .expect("config should be writable");
    let output = run_dropfarm(&root, &["projects"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("search.max_results must be at least 1"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn logout_clears_cache_offline() {
    let root = unique_workspace("dropfarm-cli-logout");
    let output = run_dropfarm(&root, &["logout"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("signed out"));
    let _ = std::fs::remove_dir_all(root);
}
