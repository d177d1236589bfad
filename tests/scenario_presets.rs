//! CLI-level tests running the binary against built-in presets.

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_plant-sim"))
        .args(args)
        .output()
        .expect("plant-sim process should run")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8")
}

/// Pulls the uptime percentage out of a per-line diagnostics row.
fn chp_line_uptime_pct(stdout: &str, line_id: usize) -> f64 {
    let needle = format!("line {line_id:>2} ");
    let row = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(&needle))
        .unwrap_or_else(|| panic!("missing per-line row for line {line_id} in output: {stdout}"));
    let raw = row
        .split("uptime")
        .nth(1)
        .unwrap_or_else(|| panic!("invalid per-line row `{row}`"));
    let numeric = raw.trim().split_whitespace().next().unwrap_or("");
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from row `{row}`"))
}

#[test]
fn baseline_preset_prints_design_result_and_diagnostics() {
    let output = run_cli(&["--preset", "baseline", "--hours", "24", "--seed", "7"]);
    assert!(
        output.status.success(),
        "baseline run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = stdout_of(&output);
    assert!(stdout.contains("--- Genset Design ---"), "{stdout}");
    assert!(stdout.contains("Required units:    18"), "{stdout}");
    assert!(stdout.contains("Installed units:   22"), "{stdout}");
    assert!(stdout.contains("--- Availability Verification ---"), "{stdout}");
    assert!(stdout.contains("--- Simulation Result ---"), "{stdout}");
    assert!(stdout.contains("hours simulated        : 24"), "{stdout}");
    assert!(stdout.contains("seed                   : 7"), "{stdout}");
    assert!(stdout.contains("--- Diagnostics ---"), "{stdout}");
}

#[test]
fn maintenance_week_preset_takes_line_three_down() {
    let output = run_cli(&["--preset", "maintenance_week"]);
    assert!(
        output.status.success(),
        "maintenance_week run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = stdout_of(&output);
    assert!(stdout.contains("mode                   : hybrid"), "{stdout}");

    // A 48-hour window out of a 168-hour week caps line 3 at 120/168.
    let uptime = chp_line_uptime_pct(&stdout, 3);
    assert!(
        uptime <= 71.44,
        "line 3 should be down for its maintenance window, uptime {uptime} %"
    );
}

#[test]
fn list_presets_names_all_builtins() {
    let output = run_cli(&["--list-presets"]);
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    for name in ["baseline", "annual", "maintenance_week"] {
        assert!(
            stdout.lines().any(|line| line == name),
            "missing preset {name}: {stdout}"
        );
    }
}

#[test]
fn unknown_preset_is_a_usage_error() {
    let output = run_cli(&["--preset", "bogus"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn rejected_validation_is_a_usage_error() {
    let output = run_cli(&["--preset", "baseline", "--hours", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("simulation.hours"));
}

#[test]
fn missing_config_file_is_a_usage_error() {
    let output = run_cli(&["--config", "does-not-exist.toml"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

#[test]
fn csv_export_round_trips_through_the_cli() {
    let path = std::env::temp_dir().join(format!("plant-sim-export-{}.csv", std::process::id()));
    let path_str = path.to_str().expect("temp path is UTF-8").to_owned();

    let output = run_cli(&["--preset", "baseline", "--hours", "24", "--export", &path_str]);
    assert!(
        output.status.success(),
        "export run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let csv = std::fs::read_to_string(&path).expect("export file should exist");
    std::fs::remove_file(&path).ok();

    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("hour,load_mw,served_mw,pv_mw,bess_mw,chp_mw,unserved_mw")
    );
    assert_eq!(lines.count(), 24);
}

#[test]
fn identical_invocations_print_identical_output() {
    let a = run_cli(&["--preset", "baseline", "--hours", "48", "--seed", "11"]);
    let b = run_cli(&["--preset", "baseline", "--hours", "48", "--seed", "11"]);
    assert!(a.status.success() && b.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn window_flag_restricts_diagnostics() {
    let output = run_cli(&["--preset", "baseline", "--hours", "24", "--window", "6"]);
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("hours 18..23 (6 of 24 analysed)"),
        "window line missing or wrong: {stdout}"
    );
}
