use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rlink_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rlink"))
}

fn setup_test_env(extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[store]
base_url = "http://127.0.0.1:9"
token_env = "RLINK_TEST_TOKEN"
page_size = 50
timeout_secs = 2

[fields]
code = "CODE"
relation = "PARENT"
{}
"#,
        extra
    );

    let config_path = config_dir.join("rlink.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn run_rlink(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_rlink_with_env(config_path, args, &[])
}

fn run_rlink_with_env(
    config_path: &Path,
    args: &[&str],
    vars: &[(&str, &str)],
) -> (String, String, bool) {
    let binary = rlink_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RLINK_TEST_TOKEN")
        .env_remove("NOTION_TOKEN")
        .env("RUST_LOG", "off");
    for (key, value) in vars {
        cmd.env(key, value);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rlink binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_config_prints_effective_values() {
    let (_tmp, config_path) = setup_test_env("[run]\nunresolved_preview = 5");

    let (stdout, stderr, success) = run_rlink(&config_path, &["config"]);
    assert!(success, "config failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("code = \"CODE\""));
    assert!(stdout.contains("relation = \"PARENT\""));
    assert!(stdout.contains("page_size = 50"));
    assert!(stdout.contains("unresolved_preview = 5"));
    assert!(stdout.contains("RLINK_TEST_TOKEN): missing"));
}

#[test]
fn test_link_without_token_fails_before_any_request() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_rlink(&config_path, &["link"]);
    assert!(!success, "link should fail without a token: {}", stdout);
    assert!(
        stderr.contains("RLINK_TEST_TOKEN environment variable not set"),
        "stderr={}",
        stderr
    );
}

#[test]
fn test_link_reads_token_from_notion_token_env() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_rlink_with_env(
        &config_path,
        &["link", "--format", "json", "--progress", "off"],
        &[("NOTION_TOKEN", "from-env")],
    );
    assert!(!success);
    assert!(
        !stderr.contains("environment variable not set"),
        "stderr={}",
        stderr
    );
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("json abort report");
    assert_eq!(v["error"], "partial_retrieval");
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env("");
    fs::write(
        &config_path,
        "[fields]\ncode = \"SAME\"\nrelation = \"SAME\"\n",
    )
    .unwrap();

    let (_, stderr, success) = run_rlink(&config_path, &["config"]);
    assert!(!success);
    assert!(stderr.contains("must differ"), "stderr={}", stderr);
}

#[test]
fn test_field_overrides_are_validated() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_rlink(
        &config_path,
        &["scan", "--code-field", "PARENT", "--token", "t"],
    );
    assert!(!success);
    assert!(stderr.contains("must differ"), "stderr={}", stderr);
}

#[test]
fn test_unreachable_store_aborts_with_partial_retrieval() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _stderr, success) = run_rlink(
        &config_path,
        &["link", "--token", "t", "--format", "json", "--progress", "off"],
    );
    assert!(!success);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("json abort report");
    assert_eq!(v["status"], "aborted");
    assert_eq!(v["error"], "partial_retrieval");
    assert_eq!(v["summary"]["retrieved"], 0);
}

#[test]
fn test_scan_against_unreachable_store_reports_partial() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_rlink(
        &config_path,
        &["scan", "--token", "t", "--progress", "off"],
    );
    assert!(success, "scan failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Retrieval:   PARTIAL"));
    assert!(stdout.contains("Retrieved:   0 records in 0 pages"));
}
