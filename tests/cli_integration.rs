//! Runs the binary end to end.

mod common;

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_retrofit-eval"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("retrofit-eval process should run")
}

#[test]
fn help_exits_zero() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: retrofit-eval"));
}

#[test]
fn default_run_prints_package_and_summary() {
    let output = run_cli(&[]);
    assert!(
        output.status.success(),
        "default run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Ranked Package ---"));
    assert!(stdout.contains("--- Audit Summary ---"));
    assert!(stdout.contains("Package SIR:"));
}

#[test]
fn scenario_files_run_via_cli() {
    let dwelling = common::scenario("red_tagged.toml");
    let config = common::scenario("strict.toml");
    let output = run_cli(&["--dwelling", &dwelling, "--config", &config]);
    assert!(
        output.status.success(),
        "scenario run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("heating_replacement"));
    assert!(stdout.contains("--- Advisories ---"));
    assert!(stdout.contains("infiltration-floored"));
}

#[test]
fn unknown_preset_exits_one() {
    let output = run_cli(&["--preset", "lavish"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn unknown_argument_exits_one() {
    let output = run_cli(&["--frobnicate"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_dwelling_file_exits_one() {
    let output = run_cli(&["--dwelling", "scenarios/does_not_exist.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

#[test]
fn results_out_writes_csv() {
    let path = std::env::temp_dir().join(format!("retrofit-eval-{}.csv", std::process::id()));
    let path_str = path.to_string_lossy().to_string();
    let output = run_cli(&["--preset", "high_discount", "--results-out", &path_str]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Results written to"));

    let csv = std::fs::read_to_string(&path).expect("CSV should exist");
    let _ = std::fs::remove_file(&path);
    let mut lines = csv.lines();
    let header = lines.next().unwrap_or("");
    assert!(header.starts_with("index,pass,measure,components"));
    assert!(lines.count() > 0);
}
