//! CLI integration tests
//!
//! Exercise the `pf` binary's offline surface (validate, show) end to end.
//! Reasoner-backed flows are covered by unit tests against the mock client.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Config file pointing storage at a temp dir so tests never touch the
/// user's store
fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let store_dir = dir.path().join("store");
    let config_path = dir.path().join("planforge.yml");
    fs::write(
        &config_path,
        format!("storage:\n  store-dir: {}\n", store_dir.display()),
    )
    .unwrap();
    config_path
}

fn valid_document() -> &'static str {
    r#"{
        "goal": "become a concert pianist",
        "actor": "Sam",
        "start_age": 10.0,
        "end_age": 18.0,
        "tier_count": 2,
        "tiers": [
            {"id": 1, "title": "overview", "start_age": 10.0, "end_age": 18.0,
             "segments": [
                {"title": "a", "description": "", "start_age": 10.0, "end_age": 14.0, "duration": 4.0},
                {"title": "b", "description": "", "start_age": 14.0, "end_age": 18.0, "duration": 4.0}
             ]},
            {"id": 2, "title": "phases", "start_age": 10.0, "end_age": 18.0,
             "segments": [
                {"title": "c", "description": "", "start_age": 10.0, "end_age": 12.0, "duration": 2.0},
                {"title": "d", "description": "", "start_age": 12.0, "end_age": 14.0, "duration": 2.0},
                {"title": "e", "description": "", "start_age": 14.0, "end_age": 16.0, "duration": 2.0},
                {"title": "f", "description": "", "start_age": 16.0, "end_age": 18.0, "duration": 2.0}
             ]}
        ]
    }"#
}

#[test]
fn test_validate_accepts_valid_document() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let doc_path = dir.path().join("document.json");
    fs::write(&doc_path, valid_document()).unwrap();

    Command::cargo_bin("pf")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "validate", doc_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("structurally valid"));
}

#[test]
fn test_validate_rejects_broken_document() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // End the second tier-1 segment early: duration mismatch plus a
    // last-segment-end mismatch
    let broken = valid_document().replace(
        r#""start_age": 14.0, "end_age": 18.0, "duration": 4.0"#,
        r#""start_age": 14.0, "end_age": 17.0, "duration": 4.0"#,
    );
    let doc_path = dir.path().join("document.json");
    fs::write(&doc_path, broken).unwrap();

    Command::cargo_bin("pf")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "validate", doc_path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("2 violation(s)"))
        .stdout(predicate::str::contains("must end at"));
}

#[test]
fn test_validate_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let doc_path = dir.path().join("document.json");
    fs::write(&doc_path, "{not json").unwrap();

    Command::cargo_bin("pf")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "validate", doc_path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_show_unknown_run_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("pf")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "show", "no-such-run"])
        .assert()
        .failure();
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("pf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("research"));
}
