//! Integration tests for lazyq CLI

use std::fs;
use std::process::Command;

fn run_lazyq(args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec!["run", "-q", "-p", "lazyq", "--"];
    cmd_args.extend(args);

    let output = Command::new("cargo")
        .args(&cmd_args)
        .current_dir(env!("CARGO_MANIFEST_DIR").to_string() + "/..")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

#[test]
fn test_cli_help() {
    let (stdout, _, success) = run_lazyq(&["--help"]);

    assert!(success);
    assert!(stdout.contains("lazyq"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("--verbose"));
}

#[test]
fn test_cli_version() {
    let (stdout, _, success) = run_lazyq(&["--version"]);

    assert!(success);
    assert!(stdout.contains("lazyq"));
}

#[test]
fn test_run_help() {
    let (stdout, _, success) = run_lazyq(&["run", "--help"]);

    assert!(success);
    assert!(stdout.contains("--all"));
    assert!(stdout.contains("--limit"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--data"));
}

#[test]
fn test_list_output() {
    let (stdout, _, success) = run_lazyq(&["list"]);

    assert!(success);
    assert!(stdout.contains("Restriction Operators"));
    assert!(stdout.contains("Grouping Operators"));
    assert!(stdout.contains("linq1"));
    assert!(stdout.contains("linq16"));
}

#[test]
fn test_list_category_filter() {
    let (stdout, _, success) = run_lazyq(&["list", "--category", "join operators"]);

    assert!(success);
    assert!(stdout.contains("linq7"));
    assert!(!stdout.contains("linq1 "));
}

#[test]
fn test_list_unknown_category() {
    let (_, stderr, success) = run_lazyq(&["list", "--category", "Set Operators"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_run_table_output() {
    let (stdout, _, success) = run_lazyq(&["run", "linq1"]);

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Where - Simple 1 (linq1)");
    assert_eq!(&lines[1..], &["4", "1", "3", "2", "0"]);
}

#[test]
fn test_run_json_output() {
    let (stdout, _, success) = run_lazyq(&["run", "linq1", "linq3", "--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    assert_eq!(parsed[0]["rows"], serde_json::json!([4, 1, 3, 2, 0]));
    assert_eq!(parsed[1]["id"], "linq3");
    assert_eq!(parsed[1]["rows"].as_array().unwrap().len(), 3);
}

#[test]
fn test_run_limit() {
    let (stdout, _, success) = run_lazyq(&["run", "linq2", "--limit", "2", "--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    assert_eq!(parsed[0]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["truncated"], true);
}

#[test]
fn test_run_all() {
    let (stdout, _, success) = run_lazyq(&["run", "--all", "--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    assert_eq!(parsed.as_array().unwrap().len(), 15);
}

#[test]
fn test_run_custom_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.json");
    fs::write(
        &path,
        r#"{"customers": [{
            "customer_id": "TINY1", "company_name": "Tiny Co", "address": "1 Lane",
            "city": "London", "region": null, "postal_code": null, "country": "UK",
            "phone": "(1) 234", "fax": null, "orders": []
        }]}"#,
    )
    .unwrap();

    let (stdout, _, success) = run_lazyq(&[
        "run",
        "linq3",
        "--data",
        path.to_str().unwrap(),
        "--output",
        "json",
    ]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    assert_eq!(parsed[0]["rows"][0]["customer_id"], "TINY1");
}

#[test]
fn test_run_unknown_sample() {
    let (_, stderr, success) = run_lazyq(&["run", "linq4"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("unknown sample: linq4"));
}

#[test]
fn test_run_without_samples() {
    let (_, stderr, success) = run_lazyq(&["run"]);

    assert!(!success);
    assert!(stderr.contains("no samples selected"));
}

#[test]
fn test_run_missing_dataset() {
    let (_, stderr, success) = run_lazyq(&["run", "linq1", "--data", "/nonexistent/data.json"]);

    assert!(!success);
    assert!(stderr.contains("failed to load dataset"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let (stdout, stderr, success) = run_lazyq(&["-v", "run", "linq11", "--output", "json"]);

    assert!(success);
    assert!(stderr.contains("sample drained"));
    let _: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
}
