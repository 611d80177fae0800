//! Integration tests for the autoplan binary.
//!
//! These tests drive the CLI against an export directory:
//! - Previewing routines for scheduled and overridden splits
//! - Status output from history and persisted state
//! - Failure paths (no templates, no API key, bad config)

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test directory with an empty config file
fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("config.toml"), "").unwrap();
    fs::create_dir_all(temp_dir.path().join("export")).unwrap();
    temp_dir
}

/// Helper to get the CLI with config and data dir pointed at the test dir
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autoplan"));
    cmd.env_remove("AUTOPLAN_API_KEY")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn write_templates(dir: &Path) {
    let templates = json!([
        {"id": "bench", "title": "Bench Press (Barbell)", "primary_muscle_group": "chest", "equipment": "barbell"},
        {"id": "incline", "title": "Incline Press (Dumbbell)", "primary_muscle_group": "chest", "equipment": "dumbbell"},
        {"id": "ohp", "title": "Overhead Press (Barbell)", "primary_muscle_group": "shoulders", "equipment": "barbell"},
        {"id": "pushdown", "title": "Triceps Pushdown (Cable)", "primary_muscle_group": "triceps", "equipment": "machine"},
        {"id": "row", "title": "Bent Over Row (Barbell)", "primary_muscle_group": "upper_back", "equipment": "barbell"},
        {"id": "curl", "title": "Bicep Curl (Dumbbell)", "primary_muscle_group": "biceps", "equipment": "dumbbell"},
        {"id": "squat", "title": "Squat (Barbell)", "primary_muscle_group": "quadriceps", "equipment": "barbell"},
        {"id": "rdl", "title": "Romanian Deadlift (Barbell)", "primary_muscle_group": "hamstrings", "equipment": "barbell"},
        {"id": "crunch", "title": "Crunch", "primary_muscle_group": "abdominals", "equipment": "none"},
        {"id": "twist", "title": "Russian Twist", "primary_muscle_group": "obliques", "equipment": "none"},
        {"id": "plank", "title": "Plank", "primary_muscle_group": "abdominals", "equipment": "none"}
    ]);
    fs::write(
        dir.join("export").join("exercise_templates.json"),
        templates.to_string(),
    )
    .unwrap();
}

fn write_push_history(dir: &Path) {
    let yesterday = Utc::now() - Duration::days(1);
    let workouts = json!({
        "workouts": [{
            "id": "w1",
            "title": "Push",
            "start_time": yesterday.to_rfc3339(),
            "exercises": [{
                "title": "Bench Press (Barbell)",
                "exercise_template_id": "bench",
                "sets": [
                    {"weight_kg": 50.0, "reps": 10},
                    {"weight_kg": 50.0, "reps": 10}
                ]
            }]
        }]
    });
    fs::write(dir.join("export").join("workouts.json"), workouts.to_string()).unwrap();
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("autoplan"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Automatic strength training routine planner",
        ));
}

#[test]
fn test_plan_previews_first_split() {
    let temp_dir = setup_test_dir();
    write_templates(temp_dir.path());

    cli(temp_dir.path())
        .arg("plan")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .success()
        .stdout(predicate::str::contains("PUSH DAY"))
        .stdout(predicate::str::contains("Bench Press (Barbell)"))
        .stdout(predicate::str::contains("Preview"));

    // Preview never persists the assignment
    assert!(!temp_dir
        .path()
        .join("data/state/split_assignment.json")
        .exists());
}

#[test]
fn test_plan_split_override() {
    let temp_dir = setup_test_dir();
    write_templates(temp_dir.path());

    cli(temp_dir.path())
        .arg("plan")
        .arg("--split")
        .arg("legs")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .success()
        .stdout(predicate::str::contains("LEGS DAY"))
        .stdout(predicate::str::contains("Squat (Barbell)"))
        .stdout(predicate::str::contains("Bench Press").not());
}

#[test]
fn test_plan_uses_progression() {
    let temp_dir = setup_test_dir();
    write_templates(temp_dir.path());
    write_push_history(temp_dir.path());

    // Bench at 50kg x 10 twice: reps at the ceiling, so weight goes up 5%
    cli(temp_dir.path())
        .arg("plan")
        .arg("--split")
        .arg("push")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .success()
        .stdout(predicate::str::contains("increase weight to 52.5kg"));
}

#[test]
fn test_invalid_split_rejected() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("plan")
        .arg("--split")
        .arg("arms")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown split"));
}

#[test]
fn test_plan_without_templates_fails() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("plan")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No exercises available"));
}

#[test]
fn test_status_shows_coverage_and_next_split() {
    let temp_dir = setup_test_dir();
    write_templates(temp_dir.path());
    write_push_history(temp_dir.path());

    cli(temp_dir.path())
        .arg("status")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions analyzed: 1"))
        .stdout(predicate::str::contains("Last scheduled: none"))
        .stdout(predicate::str::contains("Next split: Pull"))
        .stdout(predicate::str::contains("Bench Press (Barbell): Progress"));
}

#[test]
fn test_status_retries_unlogged_assignment() {
    let temp_dir = setup_test_dir();
    write_templates(temp_dir.path());
    write_push_history(temp_dir.path());

    let state_dir = temp_dir.path().join("data/state");
    fs::create_dir_all(&state_dir).unwrap();
    let assignment = json!({"split": "legs", "assigned_at": Utc::now().to_rfc3339()});
    fs::write(
        state_dir.join("split_assignment.json"),
        assignment.to_string(),
    )
    .unwrap();

    cli(temp_dir.path())
        .arg("status")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Last scheduled: Legs"))
        .stdout(predicate::str::contains("Next split: Legs (RetryUnlogged)"));
}

#[test]
fn test_run_without_api_key_fails() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AUTOPLAN_API_KEY"));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[retry]\nmax_attempts = 0\n",
    )
    .unwrap();

    cli(temp_dir.path())
        .arg("status")
        .arg("--from-dir")
        .arg(temp_dir.path().join("export"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}
