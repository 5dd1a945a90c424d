//! Integration tests for the vitals binary.
//!
//! These tests verify end-to-end behavior including:
//! - Update payload shape and bounded history
//! - Evaluation risk classification
//! - Ad-hoc series forecasting
//! - Configuration overrides

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("vitals"))
}

/// Helper to write a config file into a fresh temp dir
fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, contents).expect("Failed to write config");
    (temp_dir, path)
}

fn run_json(args: &[&str]) -> Value {
    let output = cli()
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is not valid JSON")
}

fn floats(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .expect("expected array")
        .iter()
        .map(|v| v.as_f64().expect("expected number"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Vital-sign simulator and short-horizon forecaster",
        ));
}

#[test]
fn test_default_command_updates_default_subject() {
    cli()
        .args(["--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject: default"))
        .stdout(predicate::str::contains("Oxygen_Level"));
}

#[test]
fn test_update_json_payload_is_bounded() {
    let json = run_json(&["update", "--ticks", "25", "--seed", "11"]);
    let predictions = &json["vital_predictions"];

    let ranges = [("BP", 90.0, 180.0), ("Oxygen_Level", 85.0, 100.0), ("Pulse", 60.0, 100.0)];
    for (name, min, max) in ranges {
        let series = &predictions[name];
        let historical = floats(&series["historical"]);
        let forecast = floats(&series["forecast"]);

        assert_eq!(historical.len(), 20, "{} history", name);
        assert_eq!(series["timestamps"].as_array().unwrap().len(), 20);
        assert_eq!(forecast.len(), 10, "{} forecast", name);
        assert!(historical.iter().all(|v| (min..=max).contains(v)));
        assert!(forecast.iter().all(|v| (min..=max).contains(v)), "{} {:?}", name, forecast);
    }
}

#[test]
fn test_update_named_subject() {
    cli()
        .args(["update", "--subject", "bed-4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject: bed-4"));
}

#[test]
fn test_update_rejects_zero_ticks() {
    cli()
        .args(["update", "--ticks", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidInput"));
}

#[test]
fn test_seeded_updates_are_reproducible() {
    let a = run_json(&["update", "--ticks", "6", "--seed", "77"]);
    let b = run_json(&["update", "--ticks", "6", "--seed", "77"]);

    for name in ["BP", "Oxygen_Level", "Pulse"] {
        assert_eq!(
            a["vital_predictions"][name]["historical"],
            b["vital_predictions"][name]["historical"]
        );
        assert_eq!(
            a["vital_predictions"][name]["forecast"],
            b["vital_predictions"][name]["forecast"]
        );
    }
}

#[test]
fn test_evaluate_high_risk() {
    let json = run_json(&[
        "evaluate", "--height", "170", "--weight", "95", "--bp", "150", "--oxygen", "92",
        "--pulse", "80", "--seed", "5",
    ]);

    assert_eq!(json["health_risk"], "High");
    assert_eq!(json["bmi_category"], "overweight");
    let history = floats(&json["vital_predictions"]["Pulse"]["historical"]);
    assert_eq!(history.len(), 1);
}

#[test]
fn test_evaluate_low_risk_text() {
    cli()
        .args([
            "evaluate", "--height", "180", "--weight", "75", "--bp", "118", "--oxygen", "98",
            "--pulse", "68",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("HEALTH RISK: Low"));
}

#[test]
fn test_evaluate_rejects_invalid_height() {
    cli()
        .args([
            "evaluate", "--height", "0", "--weight", "75", "--bp", "118", "--oxygen", "98",
            "--pulse", "68",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidInput"));
}

#[test]
fn test_forecast_single_value_is_flat() {
    let json = run_json(&["forecast", "--values", "5.0", "--horizon", "3"]);
    assert_eq!(floats(&json["forecast"]), vec![5.0, 5.0, 5.0]);
    assert_eq!(json["model"]["kind"], "flat_line");
}

#[test]
fn test_forecast_oxygen_example_clamped() {
    let json = run_json(&[
        "forecast",
        "--values",
        "97.0,97.2,96.9,97.1,97.3",
        "--channel",
        "oxygen",
        "--horizon",
        "5",
        "--seed",
        "1",
    ]);
    let forecast = floats(&json["forecast"]);
    assert_eq!(forecast.len(), 5);
    assert!(forecast.iter().all(|v| (85.0..=100.0).contains(v)));
}

#[test]
fn test_forecast_short_history_uses_arima() {
    let a = run_json(&["forecast", "--values", "97.0,97.2,96.9", "--seed", "1"]);
    let b = run_json(&["forecast", "--values", "97.0,97.2,96.9", "--seed", "2"]);

    assert_eq!(a["model"]["kind"], "arima");
    assert_eq!(a["forecast"], b["forecast"]);
}

#[test]
fn test_forecast_unknown_channel() {
    cli()
        .args(["forecast", "--values", "1,2,3", "--channel", "glucose"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown channel"));
}

#[test]
fn test_forecast_zero_horizon() {
    cli()
        .args(["forecast", "--values", "1,2,3", "--horizon", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidHorizon"));
}

#[test]
fn test_config_file_overrides_defaults() {
    let (_dir, path) = write_config(
        r#"
[history]
max_len = 5
default_subject = "ward-1"

[forecast]
horizon = 4
"#,
    );
    let config = path.to_str().unwrap();

    let json = run_json(&["--config", config, "update", "--ticks", "9", "--seed", "8"]);
    let bp = &json["vital_predictions"]["BP"];
    assert_eq!(floats(&bp["historical"]).len(), 5);
    assert_eq!(floats(&bp["forecast"]).len(), 4);

    cli()
        .args(["--config", config])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject: ward-1"));
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let (_dir, path) = write_config("[forecast]\nhorizon = 0\n");

    cli()
        .args(["--config", path.to_str().unwrap(), "update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config"));
}
