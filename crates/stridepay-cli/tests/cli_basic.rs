//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. They run
//! against the dev data directory (STRIDEPAY_ENV=dev).

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "stridepay-cli", "--"])
        .args(args)
        .env("STRIDEPAY_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_tier_list() {
    let (stdout, _, code) = run_cli(&["tier", "list"]);
    assert_eq!(code, 0, "Tier list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 5);
}

#[test]
fn test_steps_record_outputs_report() {
    let (stdout, _, code) = run_cli(&["steps", "record", "--user", "cli-e2e-steps", "10000"]);
    assert_eq!(code, 0, "Steps record failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["steps"], 10_000);
    assert!(parsed["pending_units"].as_i64().unwrap() >= 0);
}

#[test]
fn test_steps_show() {
    let _ = run_cli(&["steps", "record", "--user", "cli-e2e-show", "6000"]);
    let (_, _, code) = run_cli(&["steps", "show", "--user", "cli-e2e-show"]);
    assert_eq!(code, 0, "Steps show failed");
}

#[test]
fn test_wallet_show() {
    let (stdout, _, code) = run_cli(&["wallet", "show", "--user", "cli-e2e-wallet"]);
    assert_eq!(code, 0, "Wallet show failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["balance"].as_i64().is_some());
}

#[test]
fn test_wallet_transactions() {
    let (_, _, code) = run_cli(&["wallet", "transactions", "--user", "cli-e2e-wallet"]);
    assert_eq!(code, 0, "Wallet transactions failed");
}

#[test]
fn test_streak_show() {
    let (_, _, code) = run_cli(&["streak", "show", "--user", "cli-e2e-streak"]);
    assert_eq!(code, 0, "Streak show failed");
}

#[test]
fn test_tier_progress() {
    let (_, _, code) = run_cli(&["tier", "progress", "--user", "cli-e2e-tier"]);
    assert_eq!(code, 0, "Tier progress failed");
}

#[test]
fn test_redeem_replays_on_retry() {
    let user = "cli-e2e-redeem";
    let _ = run_cli(&["steps", "record", "--user", user, "5000"]);
    let (first, _, code) = run_cli(&["redeem", "--user", user]);
    assert_eq!(code, 0, "Redeem failed");
    let first: serde_json::Value = serde_json::from_str(&first).unwrap();

    // Same default idempotency key: the retry must replay, not re-credit.
    let (second, _, code) = run_cli(&["redeem", "--user", user]);
    assert_eq!(code, 0, "Redeem retry failed");
    let second: serde_json::Value = serde_json::from_str(&second).unwrap();
    if first["outcome"]["status"] == "succeeded" {
        assert_eq!(second["outcome"]["status"], "already_processed");
        assert_eq!(second["outcome"]["amount"], first["outcome"]["amount"]);
    }
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "streak.milestone_days"]);
    assert_eq!(code, 0, "Config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_set() {
    let (_, _, code) = run_cli(&["config", "set", "streak.qualifying_threshold", "5000"]);
    assert_eq!(code, 0, "Config set failed");
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "Config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["streak"].is_object());
}
