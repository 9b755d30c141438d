//! CLI integration tests
//!
//! These tests run the symbolscope binary against the fixture project.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/kotlin")
}

fn client_kt() -> PathBuf {
    fixtures_root().join("src/main/kotlin/com/example/Client.kt")
}

fn offset_of(path: &Path, marker: &str) -> String {
    let text = std::fs::read_to_string(path).unwrap();
    let byte = text.find(marker).unwrap();
    text[..byte].chars().count().to_string()
}

fn symbolscope(log: &Path) -> Command {
    let mut cmd = Command::cargo_bin("symbolscope").unwrap();
    cmd.arg("--root").arg(fixtures_root()).arg("--log-file").arg(log);
    cmd
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("symbolscope")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--offset"))
        .stdout(predicate::str::contains("--project-only"));
}

#[test]
fn test_cli_requires_caret() {
    let dir = tempfile::tempdir().unwrap();
    symbolscope(&dir.path().join("context.log"))
        .arg(client_kt())
        .assert()
        .failure();
}

#[test]
fn test_text_report_is_printed_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs/context.log");
    let file = client_kt();

    let output = symbolscope(&log)
        .arg(&file)
        .arg("--offset")
        .arg(offset_of(&file, "fun foo"))
        .assert()
        .success()
        .stdout(predicate::str::contains("--- REFERENCED SYMBOL 1 ---"))
        .stdout(predicate::str::contains("Usage kinds: PROPERTY_READ"))
        .stdout(predicate::str::ends_with("=== END SYMBOL CONTEXT ===\n"))
        .get_output()
        .stdout
        .clone();

    let logged = std::fs::read_to_string(&log).unwrap();
    assert_eq!(logged, String::from_utf8(output).unwrap());
}

#[test]
fn test_line_column_matches_offset() {
    let dir = tempfile::tempdir().unwrap();
    let file = client_kt();

    let by_offset = symbolscope(&dir.path().join("a.log"))
        .arg(&file)
        .arg("--offset")
        .arg(offset_of(&file, "fun foo"))
        .output()
        .unwrap();
    let by_line = symbolscope(&dir.path().join("b.log"))
        .arg(&file)
        .args(["--line", "8", "--column", "5"])
        .output()
        .unwrap();

    assert!(by_line.status.success());
    assert_eq!(by_offset.stdout, by_line.stdout);
}

#[test]
fn test_json_format() {
    let dir = tempfile::tempdir().unwrap();
    let file = client_kt();

    let output = symbolscope(&dir.path().join("context.log"))
        .arg(&file)
        .arg("--offset")
        .arg(offset_of(&file, "fun announce"))
        .args(["--format", "json", "--project-only"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["target"]["slice"]["simple_name"], "announce");
    let referenced = value["referenced_symbols"].as_array().unwrap();
    assert_eq!(referenced.len(), 1);
    assert_eq!(referenced[0]["usage_kinds"], serde_json::json!(["CALL"]));
}

#[test]
fn test_no_log_and_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("context.log");
    let file = client_kt();

    symbolscope(&log)
        .arg(&file)
        .arg("--offset")
        .arg(offset_of(&file, "fun foo"))
        .arg("--no-log")
        .assert()
        .success();
    assert!(!log.exists());

    symbolscope(&log)
        .arg(&file)
        .arg("--offset")
        .arg(offset_of(&file, "fun foo"))
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(std::fs::read_to_string(&log).unwrap().contains("Name: foo"));
}

#[test]
fn test_precondition_is_a_note() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("context.log");
    let java = fixtures_root().join("src/main/kotlin/com/example/Notes.java");

    symbolscope(&log)
        .arg(&java)
        .args(["--offset", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not a Kotlin file"));
    assert!(!log.exists());

    symbolscope(&log)
        .arg(client_kt())
        .args(["--offset", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No declaration at the caret"));
    assert!(!log.exists());
}
