//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(data_dir, args, "")
}

fn run_cli_with_input(data_dir: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tempoflow"))
        .args(args)
        .env("TEMPOFLOW_DATA_DIR", data_dir)
        .env_remove("TEMPOFLOW_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut stdin = child.stdin.take().expect("stdin");
        stdin.write_all(input.as_bytes()).expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn create_routine(data_dir: &Path, name: &str, phases: &[&str]) -> String {
    let mut args = vec!["routine", "create", name];
    for phase in phases {
        args.push("--phase");
        args.push(phase);
    }
    let (stdout, stderr, code) = run_cli(data_dir, &args);
    assert_eq!(code, 0, "routine create failed: {stderr}");
    stdout
        .trim()
        .strip_prefix("Routine created: ")
        .expect("created id")
        .to_string()
}

#[test]
fn test_routine_create_and_list_json() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_routine(dir.path(), "Intervals", &["00:30:high", "01:00:low"]);

    let (stdout, _, code) = run_cli(dir.path(), &["routine", "list", "--json"]);
    assert_eq!(code, 0);
    let routines: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let routines = routines.as_array().unwrap();
    assert_eq!(routines.len(), 1);
    assert_eq!(routines[0]["id"], id.as_str());
    assert_eq!(routines[0]["name"], "Intervals");
    assert_eq!(routines[0]["phases"][0]["duration_secs"], 30);
    assert_eq!(routines[0]["phases"][0]["intensity"], "high");
    assert_eq!(routines[0]["phases"][1]["intensity"], "low");
}

#[test]
fn test_routine_show_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    create_routine(dir.path(), "Warmup", &["02:00"]);

    let (stdout, _, code) = run_cli(dir.path(), &["routine", "show", "Warmup"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("02:00"));
    assert!(stdout.contains("normal"));

    let (_, _, code) = run_cli(dir.path(), &["routine", "delete", "Warmup"]);
    assert_eq!(code, 0);

    let (_, stderr, code) = run_cli(dir.path(), &["routine", "show", "Warmup"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_routine_create_rejects_bad_clock() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["routine", "create", "Bad", "--phase", "00:75"]);
    assert_ne!(code, 0);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_config_set_get_reset() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "alarm.volume"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "80");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "alarm.volume", "40"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "alarm.volume"]);
    assert_eq!(stdout.trim(), "40");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "alarm.volume", "140"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "alarm.volume"]);
    assert_eq!(stdout.trim(), "80");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "alarm.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_run_to_completion_json() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "alarm.enabled", "false"]);
    assert_eq!(code, 0);
    let id = create_routine(dir.path(), "Quick", &["1", "1"]);

    let (stdout, stderr, code) =
        run_cli(dir.path(), &["run", &id, "--autostart", "--json"]);
    assert_eq!(code, 0, "run failed: {stderr}");

    let kinds: Vec<String> = stdout
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "StateSnapshot",
            "TimerStarted",
            "PhaseAdvanced",
            "RoutineCompleted",
            "TimerExited"
        ]
    );
}

#[test]
fn test_run_quit_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_routine(dir.path(), "Idle", &["10:00"]);

    let (stdout, _, code) = run_cli_with_input(dir.path(), &["run", &id], "q\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Tempo 1 of 1 | 10:00 | elapsed 00:00 | total 10:00"));
}

#[test]
fn test_run_unknown_routine_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "missing"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_routine_create_rejects_overlong_phase() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["routine", "create", "Huge", "--phase", "18446744073709551615", "--phase", "1"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("99:59"));

    let (_, _, code) = run_cli(dir.path(), &["routine", "list"]);
    assert_eq!(code, 0);
}

#[test]
fn test_routine_create_reports_unknown_intensity() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) =
        run_cli(dir.path(), &["routine", "create", "Loud", "--phase", "01:30:loud"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown intensity 'loud'"));
}

#[test]
fn test_routine_edit() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_routine(dir.path(), "Ladder", &["00:10", "00:20", "00:30"]);

    let (_, stderr, code) = run_cli(
        dir.path(),
        &[
            "routine", "edit", &id,
            "--name", "Pyramid",
            "--set-intensity", "3", "high",
            "--move-phase", "3", "up",
            "--remove-phase", "1",
            "--add-phase", "00:05:low",
        ],
    );
    assert_eq!(code, 0, "routine edit failed: {stderr}");

    let (stdout, _, _) = run_cli(dir.path(), &["routine", "show", &id, "--json"]);
    let routine: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(routine["id"], id.as_str());
    assert_eq!(routine["name"], "Pyramid");
    let phases: Vec<(u64, String)> = routine["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["duration_secs"].as_u64().unwrap(),
                p["intensity"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (30, "high".to_string()),
            (20, "normal".to_string()),
            (5, "low".to_string())
        ]
    );

    let (stdout, _, _) = run_cli(dir.path(), &["routine", "list", "--json"]);
    let routines: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(routines.as_array().unwrap().len(), 1);
}

#[test]
fn test_routine_edit_rejects_missing_phase() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_routine(dir.path(), "Short", &["00:10"]);

    let (_, stderr, code) = run_cli(dir.path(), &["routine", "edit", &id, "--remove-phase", "4"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No phase 4"));

    let (stdout, _, _) = run_cli(dir.path(), &["routine", "show", &id, "--json"]);
    let routine: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(routine["phases"].as_array().unwrap().len(), 1);
}

#[test]
fn test_run_driven_by_stdin_commands() {
    let dir = tempfile::tempdir().unwrap();
    let id = create_routine(dir.path(), "Manual", &["10:00"]);

    let (stdout, stderr, code) =
        run_cli_with_input(dir.path(), &["run", &id, "--json"], "p\np\nr\nq\n");
    assert_eq!(code, 0, "run failed: {stderr}");

    let kinds: Vec<String> = stdout
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "StateSnapshot",
            "TimerStarted",
            "TimerPaused",
            "TimerRestarted",
            "TimerExited"
        ]
    );
}

#[test]
fn test_run_empty_legacy_routine_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("routines.json"),
        r#"[{"id":"e1","name":"Empty","tempos":[]}]"#,
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["run", "Empty", "--autostart"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Routine 'Empty' cannot be started"));
    assert!(!stdout.contains("Tempo 1"));
}

#[test]
fn test_run_blank_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    create_routine(dir.path(), "Only", &["00:10"]);

    let (_, stderr, code) = run_cli(dir.path(), &["run", ""]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"));
}
