//! Integration tests for the fireline binary.
//!
//! Writes a scenario to a temporary file, spawns the binary on it and checks
//! the JSON it prints.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

const SCENARIO: &str = r#"{
    "unit_types": [
        {"name": "infantry", "attack": 1, "defense": 2, "cost": 3},
        {"name": "tank", "attack": 3, "defense": 3, "cost": 5}
    ],
    "players": [{"name": "Germans"}, {"name": "Russians"}],
    "site": "Karelia",
    "attacker": {"player": "Germans", "units": {"tank": 8}},
    "defender": {"player": "Russians", "units": {"infantry": 1}}
}"#;

fn scenario_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    file.write_all(json.as_bytes()).expect("failed to write scenario");
    file.flush().unwrap();
    file
}

fn run_fireline(args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_fireline");
    Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to start fireline")
}

#[test]
fn prints_odds_report() {
    let file = scenario_file(SCENARIO);
    let path = file.path().to_str().unwrap();
    let out = run_fireline(&["--scenario", path, "--trials", "100", "--seed", "11", "--threads", "2"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["trials"], 100);
    let wins = report["attacker_wins"].as_u64().unwrap()
        + report["defender_wins"].as_u64().unwrap()
        + report["draws"].as_u64().unwrap();
    assert_eq!(wins, 100);
    assert!(report["attacker_win_rate"].as_f64().unwrap() > 0.9);
}

#[test]
fn same_seed_prints_same_report() {
    let file = scenario_file(SCENARIO);
    let path = file.path().to_str().unwrap();
    let args = ["--scenario", path, "--trials", "40", "--seed", "5"];
    let a = run_fireline(&args);
    let b = run_fireline(&args);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn low_luck_flag_makes_the_result_certain() {
    let file = scenario_file(SCENARIO);
    let path = file.path().to_str().unwrap();
    let out = run_fireline(&["--scenario", path, "--trials", "25", "--seed", "2", "--low-luck"]);
    assert!(out.status.success());
    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["attacker_wins"], 25);
    assert_eq!(report["average_rounds"], 1.0);
}

#[test]
fn single_battle_mode_reports_outcome() {
    let file = scenario_file(SCENARIO);
    let path = file.path().to_str().unwrap();
    let out = run_fireline(&["--scenario", path, "--history", "--seed", "9", "--low-luck"]);
    assert!(out.status.success());
    let result: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["outcome"], "AttackerWon");
    assert_eq!(result["rounds"], 1);
    assert!(result["changes"].as_u64().unwrap() >= 1);
}

#[test]
fn missing_scenario_file_fails() {
    let out = run_fireline(&["--scenario", "/nonexistent/fireline.json"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to read scenario"));
}

#[test]
fn unknown_flag_fails_with_usage() {
    let out = run_fireline(&["--bogus"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown argument: --bogus"));
    assert!(stderr.contains("Usage: fireline"));
}

#[test]
fn bad_json_fails() {
    let file = scenario_file("{\"unit_types\": [");
    let path = file.path().to_str().unwrap();
    let out = run_fireline(&["--scenario", path]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to parse scenario JSON"));
}
