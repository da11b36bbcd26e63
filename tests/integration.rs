use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn regs_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("regs");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/regscope.sqlite"

[source]
base_url = "http://127.0.0.1:1"
timeout_secs = 1

[ingest]
chunk_chars = 50000
batch_size = 2

[server]
bind = "127.0.0.1:7441"
"#,
        root.display()
    );

    let config_path = config_dir.join("regscope.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_regs(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = regs_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run regs binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_regs(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("regscope.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_regs(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_regs(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    run_regs(&config_path, &["init"]);
    let (stdout, stderr, success) = run_regs(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Agencies:   0"));
    assert!(stdout.contains("Snapshots:  0"));
    assert!(stdout.contains("never"));
}

#[test]
fn test_metrics_unknown_title_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_regs(&config_path, &["init"]);
    let (_, stderr, success) = run_regs(&config_path, &["metrics", "99"]);
    assert!(!success, "metrics for unknown title should fail");
    assert!(
        stderr.contains("no snapshot"),
        "Should report missing snapshot, got: {}",
        stderr
    );
}

#[test]
fn test_history_unknown_title_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_regs(&config_path, &["init"]);
    let (_, stderr, success) = run_regs(&config_path, &["history", "42"]);
    assert!(!success, "history for unknown title should fail");
    assert!(
        stderr.contains("not found"),
        "Should report not found, got: {}",
        stderr
    );
}

#[test]
fn test_invalid_chunk_size_rejected() {
    let (tmp, config_path) = setup_test_env();

    let bad = format!(
        r#"[db]
path = "{}/data/regscope.sqlite"

[ingest]
chunk_chars = 0

[server]
bind = "127.0.0.1:7441"
"#,
        tmp.path().display()
    );
    fs::write(&config_path, bad).unwrap();

    let (_, stderr, success) = run_regs(&config_path, &["init"]);
    assert!(!success, "Zero chunk size should be rejected");
    assert!(stderr.contains("chunk_chars"));
}

#[test]
fn test_invalid_density_policy_rejected() {
    let (tmp, config_path) = setup_test_env();

    let bad = format!(
        r#"[db]
path = "{}/data/regscope.sqlite"

[aggregate]
density_mean = "harmonic"

[server]
bind = "127.0.0.1:7441"
"#,
        tmp.path().display()
    );
    fs::write(&config_path, bad).unwrap();

    let (_, stderr, success) = run_regs(&config_path, &["init"]);
    assert!(!success, "Unknown density policy should be rejected");
    assert!(stderr.contains("density_mean"));
}

#[test]
fn test_missing_config_fails() {
    let (tmp, _) = setup_test_env();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_regs(&missing, &["init"]);
    assert!(!success, "Missing config should fail");
    assert!(stderr.contains("config"));
}
