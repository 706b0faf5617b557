//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use chrono::{Duration, Utc};
use pomobank_core::Database;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomobank"))
        .args(args)
        .env("POMOBANK_DATA_DIR", data_dir)
        .env_remove("POMOBANK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_timer_status_defaults() {
    let dir = TempDir::new().unwrap();
    let snap = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(snap["type"], "StateSnapshot");
    assert_eq!(snap["mode"], "focus");
    assert_eq!(snap["remaining_secs"], 1500);
    assert_eq!(snap["clock"], "00:25:00");
    assert_eq!(snap["running"], false);
}

#[test]
fn test_timer_start_then_pause() {
    let dir = TempDir::new().unwrap();
    let started = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(started["running"], true);

    let paused = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(paused["running"], false);
    let remaining = paused["remaining_secs"].as_i64().unwrap();
    assert!((1498..=1500).contains(&remaining), "remaining {remaining}");
}

#[test]
fn test_timer_start_twice_reports_noop() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("already running"), "stderr: {stderr}");
}

#[test]
fn test_swap_refused_while_focus_time_remains() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "swap"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("not used up"), "stderr: {stderr}");
    let snap: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snap["mode"], "focus");
}

#[test]
fn test_focus_adjustment_changes_countdown() {
    let dir = TempDir::new().unwrap();
    let snap = run_json(dir.path(), &["timer", "focus", "30"]);
    assert_eq!(snap["focus_duration_secs"], 1800);
    assert_eq!(snap["remaining_secs"], 1800);

    let snap = run_json(dir.path(), &["timer", "rest", "10"]);
    assert_eq!(snap["rest_duration_secs"], 600);
    assert_eq!(snap["remaining_secs"], 1800);
}

#[test]
fn test_invalid_minutes_rejected_without_change() {
    let dir = TempDir::new().unwrap();
    for bad in ["0", "-5", "abc"] {
        let (_, stderr, code) = run_cli(dir.path(), &["timer", "focus", bad]);
        assert_ne!(code, 0, "accepted {bad}");
        assert!(stderr.contains("Invalid duration"), "stderr: {stderr}");
    }
    let snap = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(snap["focus_duration_secs"], 1500);
}

#[test]
fn test_reset_after_start() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let snap = run_json(dir.path(), &["timer", "reset"]);
    assert_eq!(snap["running"], false);
    assert_eq!(snap["remaining_secs"], 1500);
    assert_eq!(snap["rest_surplus_secs"], 0);
}

#[test]
fn test_history_records_events() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    run_json(dir.path(), &["timer", "pause"]);
    let history = run_json(dir.path(), &["timer", "history"]);
    let kinds: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["TimerStarted", "TimerPaused"]);
}

#[test]
fn test_watch_single_tick() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "watch", "--ticks", "1"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    assert!(stdout.contains("Focus 00:25:00"), "stdout: {stdout}");
}

#[test]
fn test_watch_fires_elapsed_deadline_once() {
    let dir = TempDir::new().unwrap();
    {
        let db = Database::open_at(dir.path().join("pomobank.db")).unwrap();
        db.set_wake_deadline(Utc::now() - Duration::seconds(5)).unwrap();
    }

    let (first, stderr, code) = run_cli(dir.path(), &["timer", "watch", "--ticks", "1"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    assert!(first.contains("Pomodoro Timer (Focus time is up)"), "stdout: {first}");
    assert!(first.contains("Overtime has been started!"), "stdout: {first}");
    assert!(first.contains('\u{7}'), "no bell in: {first:?}");

    let (second, _, code) = run_cli(dir.path(), &["timer", "watch", "--ticks", "1"]);
    assert_eq!(code, 0);
    assert!(!second.contains("Pomodoro Timer"), "fired twice: {second}");
    assert!(second.contains("Focus 00:25:00"), "stdout: {second}");

    let history = run_json(dir.path(), &["timer", "history"]);
    let last = history.as_array().unwrap().last().unwrap();
    assert_eq!(last["type"], "PeriodElapsed");
    assert_eq!(last["mode"], "focus");
}

#[test]
fn test_config_defaults_and_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.focus_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.focus_minutes", "50"]);
    assert_eq!(code, 0);
    let snap = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(snap["remaining_secs"], 3000);
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "ui.dark_mode"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown configuration key"), "stderr: {stderr}");
}

#[test]
fn test_config_list_and_reset() {
    let dir = TempDir::new().unwrap();
    let config = run_json(dir.path(), &["config", "list"]);
    assert_eq!(config["notifications"]["enabled"], true);
    let (stdout, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("reset"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomobank"));
}
