#![cfg(feature = "cli")]

mod support;

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use support::{lesson, snapshot, t};
use tempfile::NamedTempFile;
use timetable::persistence::{save_catalog_to_json, save_lessons_to_csv};

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("TIMETABLE_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

fn escaped(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().replace('\\', "\\\\")
}

fn seeded_catalog_file() -> NamedTempFile {
    let file = NamedTempFile::new().expect("create temp file");
    let mut data = snapshot();
    data.lessons = vec![
        lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30)),
        lesson(2, 1, 2, 2, Some(1), t(10, 0), t(11, 30)),
    ];
    save_catalog_to_json(&data, file.path()).expect("write snapshot");
    file
}

#[test]
fn cli_rejects_workload_over_contract() {
    run_cli(
        "contract add 1 1 1 300\nworkload add 1 full-time 180\nworkload add 1 part-time 150\nquit\n",
    )
    .success()
    .stdout(str_contains("Workload 1 saved"))
    .stdout(str_contains("Rejected: assigned hours exceed the contract budget"));
}

#[test]
fn cli_reports_duplicate_before_hours() {
    run_cli("contract add 1 1 1 300\nworkload add 1 full-time 100\nworkload add 1 full-time 500\nquit\n")
        .success()
        .stdout(str_contains("already exists (id 1)"));
}

#[test]
fn cli_detects_room_conflict_from_loaded_catalog() {
    let file = seeded_catalog_file();
    let script = format!(
        "load json {}\nconflicts date=2025-10-06\nquit\n",
        escaped(&file)
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Catalog loaded from"))
        .stdout(str_contains("1 conflicts (1 single, 0 shared)"))
        .stdout(str_contains("Room 'A100' is double-booked"));
}

#[test]
fn cli_rejects_bad_conflict_filter() {
    run_cli("conflicts types=room,building\nquit\n")
        .success()
        .stdout(str_contains("Invalid filter"));
}

#[test]
fn cli_imports_lessons_from_csv() {
    let catalog = seeded_catalog_file();
    let csv = NamedTempFile::new().expect("create temp file");
    save_lessons_to_csv(&[lesson(7, 1, 1, 3, Some(2), t(9, 0), t(10, 0))], csv.path())
        .expect("write csv");

    let script = format!(
        "load json {}\nimport lessons {}\nshow\nquit\n",
        escaped(&catalog),
        escaped(&csv)
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Imported 1 lessons"), "{output}");
    assert!(output.contains("lessons=3"), "{output}");
    assert!(output.contains("B200"), "{output}");
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = escaped(&tmp);
    let script = format!(
        "contract add 5 1 1 50\nworkload add 5 full-time 40\nsave json {path}\nworkload add 5 part-time 5\nload json {path}\nusage contract 5\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Catalog saved to"), "{output}");
    assert!(output.contains("Catalog loaded from"), "{output}");
    let after_reload = output.split("Catalog loaded from").last().unwrap_or_default();
    assert!(
        after_reload.contains("capacity=50.00, allocated=40.00, remaining=10.00, children=1"),
        "{after_reload}"
    );
}

#[test]
fn cli_unknown_command_points_to_help() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command 'frobnicate'"));
}
