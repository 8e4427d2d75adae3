use assert_cmd::Command;
use predicates::prelude::*;

fn scrub() -> Command {
    Command::cargo_bin("scrub").unwrap()
}

#[test]
fn test_rules_lists_builtin_and_document_rule_types() {
    scrub()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("not_empty"))
        .stdout(predicate::str::contains("duplicate_rows"))
        .stdout(predicate::str::contains("no_nulls"))
        .stdout(predicate::str::contains("value_range"))
        .stdout(predicate::str::contains("regex_match"))
        .stdout(predicate::str::contains("expression"));
}

#[test]
fn test_list_shows_registered_cleaners() {
    let dir = tempfile::tempdir().unwrap();
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("synthetic"));
}

#[test]
fn test_info_shows_metadata_and_modes() {
    let dir = tempfile::tempdir().unwrap();
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("info")
        .arg("synthetic")
        .assert()
        .success()
        .stdout(predicate::str::contains("seeded daily observations"))
        .stdout(predicate::str::contains("in-memory, path-based"));
}

#[test]
fn test_info_unknown_cleaner_fails() {
    scrub()
        .arg("info")
        .arg("ghost")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_run_requires_names_or_all() {
    scrub()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--all"));
}

#[test]
fn test_run_synthetic_persists_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cleaned");
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("run")
        .arg("synthetic")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded: 1"));

    let output = out.join("synthetic").join("cleaned.csv");
    assert!(output.is_file());
}

#[test]
fn test_run_test_mode_does_not_persist() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cleaned");
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("run")
        .arg("synthetic")
        .arg("--test")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("not persisted"));

    assert!(!out.join("synthetic").join("cleaned.csv").exists());
}

#[test]
fn test_run_unknown_cleaner_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("run")
        .arg("ghost")
        .arg("--output-dir")
        .arg(dir.path().join("cleaned"))
        .assert()
        .failure();
}

#[test]
fn test_run_json_format() {
    let dir = tempfile::tempdir().unwrap();
    scrub()
        .arg("--root")
        .arg(dir.path())
        .arg("run")
        .arg("synthetic")
        .arg("--test")
        .arg("--format")
        .arg("json")
        .arg("--output-dir")
        .arg(dir.path().join("cleaned"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"passed\""));
}
