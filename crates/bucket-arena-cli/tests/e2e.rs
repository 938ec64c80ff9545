//! End-to-end CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn bucket_arena() -> Command {
    let mut cmd = Command::cargo_bin("bucket-arena").expect("binary not found");
    cmd.env_remove("BUCKET_ARENA_BUCKET_SIZE")
        .env_remove("BUCKET_ARENA_VALUE_SIZE")
        .env_remove("BUCKET_ARENA_COUNT")
        .env_remove("BUCKET_ARENA_THREADS");
    cmd
}

#[test]
fn help_flag() {
    bucket_arena()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("arena"));
}

#[test]
fn version_flag() {
    bucket_arena()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bucket-arena"));
}

#[test]
fn default_bucket_holds_one_small_value() {
    bucket_arena()
        .args(["-s", "24", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bucket size:   64.00 KiB"))
        .stdout(predicate::str::contains("buckets:       1"));
}

#[test]
fn json_report() {
    let output = bucket_arena()
        .args(["-b", "300", "-s", "100", "-n", "6", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["num_buckets"], 2);
    assert_eq!(report["total_mem_bytes"], 600);
}

#[test]
fn env_sets_bucket_size() {
    let output = bucket_arena()
        .env("BUCKET_ARENA_BUCKET_SIZE", "128")
        .args(["-s", "64", "-n", "4", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["bucket_size_bytes"], 128);
    assert_eq!(report["num_buckets"], 2);
}

#[test]
fn value_too_large_exits_with_arena_code() {
    bucket_arena()
        .args(["-b", "16", "-s", "32", "-n", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("value too large"));
}

#[test]
fn unsupported_value_size_exits_with_config_code() {
    bucket_arena()
        .args(["-s", "3"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unsupported value size"));
}

#[test]
fn invalid_between_mode_rejected() {
    bucket_arena()
        .args(["--between", "sometimes"])
        .assert()
        .failure();
}
