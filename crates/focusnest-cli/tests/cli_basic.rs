//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify the JSON they print.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command with its data directory at `dir` and return output.
fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "focusnest-cli", "--"])
        .args(args)
        .env("FOCUSNEST_DATA_DIR", dir)
        .env_remove("FOCUSNEST_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

/// Split concatenated pretty-printed JSON documents.
fn json_stream(stdout: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is a JSON stream")
}

#[test]
fn test_catalog_list() {
    let dir = TempDir::new().unwrap();
    let entries = run_json(dir.path(), &["catalog", "list"]);
    assert_eq!(entries.as_array().unwrap().len(), 12);

    let legendary = run_json(dir.path(), &["catalog", "list", "--rarity", "legendary"]);
    let legendary = legendary.as_array().unwrap();
    assert_eq!(legendary.len(), 3);
    assert!(legendary.iter().all(|e| e["rarity"] == "legendary"));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.default_minutes", "45"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.default_minutes"]);
    assert_eq!(stdout.trim(), "45");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "timer.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_timer_lifecycle_rewards_session() {
    let dir = TempDir::new().unwrap();
    let started = run_json(
        dir.path(),
        &["timer", "start", "--minutes", "45", "--affinity", "fruit"],
    );
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["duration_minutes"], 45);

    let paused = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(paused["type"], "TimerPaused");

    let (code, stdout, stderr) = run_cli(dir.path(), &["timer", "skip"]);
    assert_eq!(code, 0, "{stderr}");
    let docs = json_stream(&stdout);
    assert_eq!(docs[0]["type"], "TimerFinished");
    assert_eq!(docs[1]["eggs"].as_array().unwrap().len(), 2);

    let eggs = run_json(dir.path(), &["eggs", "list"]);
    assert_eq!(eggs.as_array().unwrap().len(), 2);

    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_focus_minutes"], 45);
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["eggs_incubating"], 2);

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "finished");
    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_sessions"], 1);
}

#[test]
fn test_timer_follows_updated_bounds() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["timer", "status"]);
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.max_minutes", "60"]);
    assert_eq!(code, 0);

    let started = run_json(dir.path(), &["timer", "start", "--minutes", "120"]);
    assert_eq!(started["duration_minutes"], 60);
    run_json(dir.path(), &["timer", "abandon"]);

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.min_minutes", "20"]);
    assert_eq!(code, 0);
    let started = run_json(dir.path(), &["timer", "start", "--minutes", "5"]);
    assert_eq!(started["duration_minutes"], 20);
}

#[test]
fn test_abandon_leaves_no_reward() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["timer", "start", "--minutes", "30"]);
    let abandoned = run_json(dir.path(), &["timer", "abandon"]);
    assert_eq!(abandoned["type"], "TimerAbandoned");

    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_sessions"], 0);
    assert_eq!(stats["eggs_incubating"], 0);
}

#[test]
fn test_admin_eggs_hatch_and_rename() {
    let dir = TempDir::new().unwrap();
    let eggs = run_json(
        dir.path(),
        &["admin", "force-eggs", "--count", "2", "--rarity", "rare"],
    );
    let eggs = eggs.as_array().unwrap();
    assert_eq!(eggs.len(), 2);
    let egg_id = eggs[0]["id"].as_str().unwrap().to_string();

    let bird = run_json(dir.path(), &["eggs", "hatch", &egg_id]);
    assert_eq!(bird["stage"], "hatchling");
    let again = run_json(dir.path(), &["eggs", "hatch", &egg_id]);
    assert_eq!(again["status"], "ignored");

    let hatched = run_json(dir.path(), &["eggs", "hatch", "--all-ready"]);
    assert_eq!(hatched.as_array().unwrap().len(), 1);

    let bird_id = bird["id"].as_str().unwrap().to_string();
    let renamed = run_json(dir.path(), &["aviary", "rename", &bird_id, "Pipoca"]);
    assert_eq!(renamed["nickname"], "Pipoca");

    let aviary = run_json(dir.path(), &["aviary", "list", "--rarity", "rare"]);
    let aviary = aviary.as_array().unwrap();
    assert_eq!(aviary.len(), 2);
    assert!(aviary.iter().any(|b| b["name"] == "Pipoca"));

    let reset = run_json(dir.path(), &["admin", "reset-stats"]);
    assert_eq!(reset["eggs_hatched"], 0);
}

#[test]
fn test_owners_are_isolated() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["--owner", "ana", "admin", "force-eggs"]);
    let bia = run_json(dir.path(), &["--owner", "bia", "eggs", "list"]);
    assert!(bia.as_array().unwrap().is_empty());
    let ana = run_json(dir.path(), &["--owner", "ana", "eggs", "list"]);
    assert_eq!(ana.as_array().unwrap().len(), 1);
}
