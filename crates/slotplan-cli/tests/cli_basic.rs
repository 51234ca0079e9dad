//! Basic CLI E2E tests.
//!
//! Tests invoke the built `slotplan` binary with HOME pointed at a temporary
//! directory, so the real configuration is never touched.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_slotplan"))
        .args(args)
        .env("HOME", home)
        .env_remove("SLOTPLAN_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn write_plan(dir: &TempDir, name: &str, plan: &serde_json::Value) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(plan).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn soft_slot_plan() -> serde_json::Value {
    serde_json::json!({
        "tasks": [
            { "name": "write", "priority": 1, "estimated_minutes": 30 }
        ],
        "slots": [
            {
                "start": "2024-03-04T09:00:00Z",
                "end": "2024-03-04T10:00:00Z",
                "boundary": "soft",
                "tolerance_minutes": 20
            }
        ],
        "busy": [
            { "start": "2024-03-04T09:15:00Z", "end": "2024-03-04T09:45:00Z" }
        ]
    })
}

#[test]
fn test_schedule_prints_result_json() {
    let home = TempDir::new().unwrap();
    let plan = write_plan(&home, "plan.json", &soft_slot_plan());

    let stdout = run_cli_success(home.path(), &["schedule", "--input", &plan]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let placement = &result["placements"][0];
    assert_eq!(placement["task"]["name"], "write");
    assert_eq!(placement["interval"]["start"], "2024-03-04T09:45:00Z");
    assert_eq!(placement["interval"]["end"], "2024-03-04T10:15:00Z");
    assert_eq!(placement["overflow_seconds"], 900);
    assert_eq!(result["unplaced"].as_array().unwrap().len(), 0);
}

#[test]
fn test_schedule_reports_unplaced_tasks() {
    let home = TempDir::new().unwrap();
    let mut plan = soft_slot_plan();
    plan["slots"][0]["boundary"] = "hard".into();
    let plan = write_plan(&home, "plan.json", &plan);

    let stdout = run_cli_success(home.path(), &["schedule", "--input", &plan, "--pretty"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["placements"].as_array().unwrap().len(), 0);
    assert_eq!(result["unplaced"][0]["reason"], "no_capacity");
}

#[test]
fn test_schedule_skips_application_events() {
    let home = TempDir::new().unwrap();
    let plan = serde_json::json!({
        "tasks": [{ "name": "write", "priority": 1, "estimated_minutes": 30 }],
        "slots": [{ "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T10:00:00Z" }],
        "events": [
            { "title": "standup", "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T09:30:00Z" },
            { "title": "old block", "start": "2024-03-04T09:30:00Z", "end": "2024-03-04T10:00:00Z", "color_id": "1" }
        ]
    });
    let plan = write_plan(&home, "plan.json", &plan);

    let stdout = run_cli_success(home.path(), &["schedule", "--input", &plan]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["placements"][0]["interval"]["start"], "2024-03-04T09:30:00Z");
}

#[test]
fn test_schedule_uses_explicit_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "overflow_side = \"leading\"\n").unwrap();
    let plan = write_plan(&home, "plan.json", &soft_slot_plan());

    let stdout = run_cli_success(
        home.path(),
        &["schedule", "--input", &plan, "--config", &config.to_string_lossy()],
    );
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["placements"][0]["interval"]["start"], "2024-03-04T08:45:00Z");
}

#[test]
fn test_schedule_rejects_invalid_interval() {
    let home = TempDir::new().unwrap();
    let mut plan = soft_slot_plan();
    plan["busy"][0]["end"] = "2024-03-04T09:00:00Z".into();
    let plan = write_plan(&home, "plan.json", &plan);

    let (stdout, stderr, code) = run_cli(home.path(), &["schedule", "--input", &plan]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error:"), "{stderr}");
    assert!(stderr.contains("busy interval #0"), "{stderr}");
}

#[test]
fn test_schedule_missing_plan_file() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("nope.json");
    let missing = missing.to_string_lossy();
    let (_, stderr, code) = run_cli(home.path(), &["schedule", "--input", &missing]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot read plan file"), "{stderr}");
}

#[test]
fn test_capacity_report() {
    let home = TempDir::new().unwrap();
    let plan = write_plan(&home, "plan.json", &soft_slot_plan());

    let stdout = run_cli_success(home.path(), &["capacity", "--input", &plan]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["required_minutes"], 30);
    assert_eq!(report["slot_minutes"], 60);
    assert_eq!(report["free_minutes"], 30);
    assert_eq!(report["periods_needed"], 1);
}

fn three_task_plan() -> serde_json::Value {
    serde_json::json!({
        "tasks": [
            { "name": "a", "priority": 1, "estimated_minutes": 40 },
            { "name": "b", "priority": 1, "estimated_minutes": 40 },
            { "name": "c", "priority": 1, "estimated_minutes": 40 }
        ],
        "slots": [{ "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T10:00:00Z" }]
    })
}

#[test]
fn test_schedule_over_fixed_periods() {
    let home = TempDir::new().unwrap();
    let plan = write_plan(&home, "plan.json", &three_task_plan());

    let stdout = run_cli_success(home.path(), &["schedule", "--input", &plan, "--periods", "2"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["periods"], 2);
    assert_eq!(result["placements"].as_array().unwrap().len(), 2);
    assert_eq!(result["placements"][1]["interval"]["start"], "2024-03-05T09:00:00Z");
    assert_eq!(result["unplaced"].as_array().unwrap().len(), 1);
}

#[test]
fn test_schedule_until_fits() {
    let home = TempDir::new().unwrap();
    let plan = write_plan(&home, "plan.json", &three_task_plan());

    let stdout = run_cli_success(home.path(), &["schedule", "--input", &plan, "--until-fits"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["periods"], 3);
    assert_eq!(result["unplaced"].as_array().unwrap().len(), 0);
    assert_eq!(result["placements"][2]["interval"]["start"], "2024-03-06T09:00:00Z");

    let stdout = run_cli_success(
        home.path(),
        &["schedule", "--input", &plan, "--until-fits", "--max-periods", "1"],
    );
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["periods"], 1);
    assert_eq!(result["unplaced"].as_array().unwrap().len(), 2);
}

#[test]
fn test_schedule_rejects_bad_period_options() {
    let home = TempDir::new().unwrap();
    let plan = write_plan(&home, "plan.json", &three_task_plan());

    let (_, stderr, code) = run_cli(
        home.path(),
        &["schedule", "--input", &plan, "--periods", "2", "--period-hours", "0"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("period length must be positive"), "{stderr}");

    let (_, _, code) = run_cli(
        home.path(),
        &["schedule", "--input", &plan, "--periods", "2", "--until-fits"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_capacity_rejects_invalid_interval() {
    let home = TempDir::new().unwrap();
    let mut plan = soft_slot_plan();
    plan["slots"][0]["end"] = "2024-03-04T08:00:00Z".into();
    let plan = write_plan(&home, "plan.json", &plan);

    let (stdout, stderr, code) = run_cli(home.path(), &["capacity", "--input", &plan]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("slot #0"), "{stderr}");
}

#[test]
fn test_config_get_and_set() {
    let home = TempDir::new().unwrap();

    let stdout = run_cli_success(home.path(), &["config", "get", "overflow_side"]);
    assert_eq!(stdout.trim(), "trailing");

    run_cli_success(home.path(), &["config", "set", "overflow_side", "leading"]);
    let stdout = run_cli_success(home.path(), &["config", "get", "overflow_side"]);
    assert_eq!(stdout.trim(), "leading");

    let saved = std::fs::read_to_string(
        home.path().join(".config").join("slotplan").join("config.toml"),
    )
    .unwrap();
    assert!(saved.contains("overflow_side = \"leading\""), "{saved}");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "config",
            "set",
            "priority_weights",
            r#"[{"level":1,"weight":4.0},{"level":2,"weight":2.0}]"#,
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("priority_weights"), "{stderr}");

    let (_, _, code) = run_cli(home.path(), &["config", "get", "no_such_key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_show_reset_and_path() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["config", "set", "overflow_tie_break", "declaration_order"]);

    let shown = run_cli_success(home.path(), &["config", "show"]);
    assert!(shown.contains("overflow_tie_break = \"declaration_order\""), "{shown}");
    assert!(shown.contains("[calendar]"), "{shown}");

    let stdout = run_cli_success(home.path(), &["config", "reset"]);
    assert!(stdout.contains("reset"));
    let stdout = run_cli_success(home.path(), &["config", "get", "overflow_tie_break"]);
    assert_eq!(stdout.trim(), "least_overflow");

    let path = run_cli_success(home.path(), &["config", "path"]);
    assert!(path.trim().ends_with("config.toml"), "{path}");
}
