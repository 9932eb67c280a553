//! Integration tests for the capmatch CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to a test fixture
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

fn capmatch() -> Command {
    Command::cargo_bin("capmatch").unwrap()
}

fn stdout_of(args: &[&str]) -> String {
    let output = capmatch().args(args).output().unwrap();
    assert!(output.status.success(), "{args:?} failed");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_process_text_document_as_json() {
    let stdout = stdout_of(&["process", "-i", &fixture_path("abacus.txt")]);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let pairs = reports[0]["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0]["caption"]["kind"], "figure");
    assert_eq!(pairs[0]["caption"]["number"], "1-1");
    assert_eq!(pairs[0]["caption"]["label"], "abacus diagram");
    assert_eq!(pairs[1]["caption"]["kind"], "table");
    assert!(pairs[0]["cross_references"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("As shown in Figure 1-1"));
    assert_eq!(reports[0]["stats"]["total_blocks_scanned"], 7);
    assert!(reports[0].get("metadata").is_none());
}

#[test]
fn test_process_json_blocks() {
    capmatch()
        .args(["process", "-i", &fixture_path("blocks.json"), "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[figure 2]"))
        .stdout(predicate::str::contains("圖表說明：Figure 2 系統架構"))
        .stdout(predicate::str::contains("如圖 2 所示"));
}

#[test]
fn test_markdown_output() {
    capmatch()
        .args(["process", "-i", &fixture_path("abacus.txt"), "-f", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Figure 1-1: abacus diagram"))
        .stdout(predicate::str::contains("### Table 1: Bead values"))
        .stdout(predicate::str::contains("*Total pairs: 2*"));
}

#[test]
fn test_output_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let output_file = temp_dir.path().join("pairs.json");

    capmatch()
        .args(["process", "-i", &fixture_path("abacus.txt"), "-o"])
        .arg(&output_file)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = fs::read_to_string(&output_file).unwrap();
    assert!(content.contains("\"rule_id\""));
}

#[test]
fn test_glob_processes_every_fixture_in_order() {
    let stdout = stdout_of(&["process", "-i", "tests/fixtures/*", "--quiet"]);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let sources: Vec<&str> = reports
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source"].as_str().unwrap())
        .collect();
    assert_eq!(
        sources,
        vec!["tests/fixtures/abacus.txt", "tests/fixtures/blocks.json"]
    );
}

#[test]
fn test_output_is_identical_across_modes() {
    let input = fixture_path("abacus.txt");
    let sequential = stdout_of(&["process", "-i", &input, "--mode", "sequential"]);
    let parallel = stdout_of(&["process", "-i", &input, "--mode", "parallel", "-t", "2"]);
    let adaptive = stdout_of(&["process", "-i", &input]);
    assert_eq!(sequential, parallel);
    assert_eq!(sequential, adaptive);
}

#[test]
fn test_include_metadata() {
    capmatch()
        .args(["process", "-i", &fixture_path("abacus.txt"), "--include-metadata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processing_time_ms\""))
        .stdout(predicate::str::contains("\"patterns\": \"default\""));
}

#[test]
fn test_kind_filter_and_floor() {
    let stdout = stdout_of(&[
        "process",
        "-i",
        &fixture_path("abacus.txt"),
        "--tables-only",
    ]);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(reports[0]["pairs"].as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["stats"]["filtered_by_kind"], 1);

    let stdout = stdout_of(&[
        "process",
        "-i",
        &fixture_path("abacus.txt"),
        "--min-confidence",
        "1.0",
    ]);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(reports[0]["pairs"].as_array().unwrap().is_empty());
}

#[test]
fn test_custom_patterns_file() {
    let temp_dir = TempDir::new().unwrap();
    let rules = temp_dir.path().join("plates.toml");
    fs::write(
        &rules,
        r#"
[metadata]
name = "plates"

[[captions]]
id = "plate"
kind = "figure"
pattern = '(?m)^(?P<marker>Plate)[\t ]*(?P<number>[0-9]+)[\t ]*'
specificity = 4.0
"#,
    )
    .unwrap();
    let document = temp_dir.path().join("atlas.txt");
    fs::write(&document, "Plate 4 Harbour at dawn\n\nBoats leave before sunrise.\n").unwrap();

    capmatch()
        .args(["process", "-f", "text", "-i"])
        .arg(&document)
        .arg("-p")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("[figure 4]"))
        .stdout(predicate::str::contains("Harbour at dawn"));
}

#[test]
fn test_strict_builtin_skips_loose_captions() {
    let stdout = stdout_of(&[
        "process",
        "-i",
        &fixture_path("abacus.txt"),
        "--builtin",
        "strict",
    ]);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let pairs = reports[0]["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0]["caption"]["kind"], "table");
}

#[test]
fn test_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("capmatch.toml");
    fs::write(&config, "[output]\ndefault_format = \"markdown\"\n").unwrap();

    capmatch()
        .args(["process", "-i", &fixture_path("abacus.txt"), "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("## tests/fixtures/abacus.txt"));
}

#[test]
fn test_nonexistent_file() {
    capmatch()
        .args(["process", "-i", "nonexistent_file.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_invalid_window() {
    capmatch()
        .args(["process", "-i", &fixture_path("abacus.txt"), "-w", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_generate_validate_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("capmatch.toml");
    let rules = temp_dir.path().join("rules.toml");

    capmatch()
        .args(["generate-config", "-o"])
        .arg(&config)
        .assert()
        .success();
    capmatch()
        .args(["generate-config", "-k", "patterns", "-n", "house", "-o"])
        .arg(&rules)
        .assert()
        .success();

    capmatch()
        .args(["validate", "-c"])
        .arg(&config)
        .arg("-p")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: house"))
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_requires_target() {
    capmatch().arg("validate").assert().failure();
}

#[test]
fn test_list_patterns() {
    capmatch()
        .args(["list", "patterns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default"))
        .stdout(predicate::str::contains("strict"));
}

#[test]
fn test_help_output() {
    capmatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("generate-config"));
}
