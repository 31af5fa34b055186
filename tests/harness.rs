#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use serde_json::Value;

const INSTANCE: &str = "2 2\n0 0\n1 0\n0 1\n1 1\n";

fn script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Work directory with one instance, four solvers and an accepting verifier
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());
    dir
}

fn populate(dir: &Path) {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(dir.join("instances")).unwrap();
    fs::write(dir.join("instances/2_2_R_0.in"), INSTANCE).unwrap();

    script(&bin, "exact_a", "cat >/dev/null\nprintf '2\\n0 2\\n1 3\\n2\\n'");
    script(&bin, "heuristic_b", "cat >/dev/null\nprintf '2\\n0 3\\n1 2\\n3\\n'");
    script(&bin, "heuristic_slow", "exec sleep 10");
    script(&bin, "heuristic_crash", "cat >/dev/null\nexit 3");
    // accepts unless the declared objective is 3
    script(&bin, "_verifier", "if tail -n 1 | grep -qx 3; then echo 0; else echo 1; fi");
}

fn run(dir: &Path, extra: &[(&str, &str)]) -> std::process::Output {
    run_from(dir, dir, extra)
}

fn run_from(cwd: &Path, dir: &Path, extra: &[(&str, &str)]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_matchjudge"));
    command
        .env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_default())
        .env("HARNESS_WORK_DIR", dir)
        .env("SOLVER_BIN_DIR", dir.join("bin"))
        .env("SOLVERS", "exact_a,heuristic_b,heuristic_slow,heuristic_crash")
        .env("BASELINE_SOLVER", "exact_a")
        .env("TIME_LIMIT_SECONDS", "2")
        .env("COMPILE_ENABLED", "false")
        .env("GENERATE_ENABLED", "false")
        .env("RENDER_ENABLED", "false")
        .env("RUST_LOG", "matchjudge=warn")
        .current_dir(cwd);
    for (key, value) in extra {
        command.env(key, value);
    }
    command.output().expect("failed to execute matchjudge")
}

#[test]
fn full_sweep_reports_every_verdict() {
    let dir = workspace();
    let output = run(dir.path(), &[]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Solving 2_2_R_0...");
    assert!(lines[1].starts_with("   exact_a........... "), "{}", lines[1]);
    assert!(lines[1].ends_with("value    2.0000 (1.0000)"), "{}", lines[1]);
    assert_eq!(lines[2], "   heuristic_b....... WA");
    assert_eq!(lines[3], "   heuristic_slow.... TLE");
    assert_eq!(lines[4], "   heuristic_crash... RTE");
    assert_eq!(lines[5], "Stats");
    assert_eq!(lines[6], "   exact_a         1.0000");
    assert_eq!(lines[7], "   heuristic_b     1.0000");

    let logs = dir.path().join("logs");
    assert!(logs.join("2_2_R_0_exact_a.out").exists());
    assert!(logs.join("2_2_R_0_heuristic_b.out").exists());
    assert!(!logs.join("2_2_R_0_heuristic_slow.out").exists());
    assert!(!logs.join("2_2_R_0_heuristic_crash.out").exists());

    let summary: Value = serde_json::from_slice(&fs::read(logs.join("summary.json")).unwrap()).unwrap();
    let verdicts: Vec<&str> = summary["attempts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["verdict"].as_str().unwrap())
        .collect();
    assert_eq!(
        verdicts,
        vec!["ACCEPTED", "WRONG_ANSWER", "TIME_LIMIT_EXCEEDED", "RUNTIME_ERROR"]
    );
    assert_eq!(summary["baseline"], "exact_a");
}

#[test]
fn heuristic_ratio_against_baseline() {
    let dir = workspace();
    script(
        &dir.path().join("bin"),
        "heuristic_b",
        "cat >/dev/null\nprintf '2\\n0 3\\n1 2\\n2.5\\n'",
    );

    let output = run(dir.path(), &[("SOLVERS", "exact_a,heuristic_b")]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("value    2.5000 (1.2500)\n"), "{}", stdout);
    assert!(stdout.ends_with("   heuristic_b 1.2500\n"), "{}", stdout);
}

#[test]
fn baseline_must_come_first() {
    let dir = workspace();
    let output = run(dir.path(), &[("SOLVERS", "heuristic_b,exact_a")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be the first entry"));
}

#[test]
fn relative_work_dir() {
    let root = tempfile::tempdir().unwrap();
    let bench = root.path().join("bench");
    populate(&bench);

    let output = run_from(
        root.path(),
        &bench,
        &[
            ("HARNESS_WORK_DIR", "bench"),
            ("SOLVER_BIN_DIR", "bench/bin"),
            ("SOLVERS", "exact_a,heuristic_b"),
        ],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr={}", stderr);
    assert!(!stderr.contains("could not be started"), "{}", stderr);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[1].ends_with("value    2.0000 (1.0000)"), "{}", stdout);
    assert!(bench.join("logs/summary.json").exists());
    assert!(!bench.join("bench").exists());
}
