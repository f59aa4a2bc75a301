use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn eegclean() -> Command {
    let mut cmd = Command::cargo_bin("eegclean").unwrap();
    cmd.env_remove("EEGCLEAN_BASE_DIR")
        .env_remove("EEGCLEAN_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// A small OpenBCI-style recording with two EXG channels and a text marker.
fn write_recording(path: &Path, rows: usize) {
    let mut text = String::from("%OpenBCI Raw EXG Data\n%Sample Rate = 255 Hz\n");
    text.push_str("Sample Index, EXG Channel 0, EXG Channel 1, Label\n");
    for i in 0..rows {
        let t = i as f64 / 255.0;
        let a = 20.0 * (2.0 * std::f64::consts::PI * 10.0 * t).sin() + 100.0;
        let b = 5.0 * (2.0 * std::f64::consts::PI * 7.0 * t).cos() - 40.0 + (i % 3) as f64;
        text.push_str(&format!("{i}, {a:.4}, {b:.4}, tag{}\n", i % 2));
    }
    fs::write(path, text).unwrap();
}

/// `<tmp>/recordings/OpenBCISession_1/rec.txt`; returns the base dir.
fn session_fixture(tmp: &Path) -> PathBuf {
    let base = tmp.join("recordings");
    let session = base.join("OpenBCISession_1");
    fs::create_dir_all(&session).unwrap();
    fs::create_dir(base.join("not_a_session")).unwrap();
    write_recording(&session.join("rec.txt"), 64);
    base
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    eegclean()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    eegclean()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("eegclean"));
}

#[test]
fn test_help_flag() {
    eegclean()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenBCI"));
}

// =============================================================================
// INSPECT SUBCOMMAND
// =============================================================================

#[test]
fn test_inspect_lists_eeg_channels() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("rec.txt");
    write_recording(&file, 12);

    eegclean()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("12 rows x 4 columns"))
        .stdout(predicate::str::contains(
            "EEG channels: EXG Channel 0, EXG Channel 1",
        ));
}

#[test]
fn test_inspect_json() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("rec.txt");
    write_recording(&file, 12);

    let output = eegclean()
        .args(["inspect", "--json"])
        .arg(&file)
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["rows"], 12);
    let columns = parsed["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[3]["name"], "Label");
    assert_eq!(columns[3]["numeric"], false);
    assert_eq!(columns[1]["eeg"], true);
}

#[test]
fn test_inspect_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    eegclean()
        .arg("inspect")
        .arg(tmp.path().join("missing.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

// =============================================================================
// RUN SUBCOMMAND
// =============================================================================

#[test]
fn test_run_cleans_every_session() {
    let tmp = tempfile::tempdir().unwrap();
    let base = session_fixture(tmp.path());
    let out = tmp.path().join("out");

    eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(&base)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 1 of 1 recording(s) from 1 session(s)"));

    let cleaned = fs::read_to_string(out.join("cleaned_rec.csv")).unwrap();
    let mut lines = cleaned.lines();
    assert_eq!(
        lines.next(),
        Some("Sample Index,EXG Channel 0,EXG Channel 1,Label")
    );
    assert_eq!(lines.count(), 64);
}

#[test]
fn test_run_base_dir_from_env() {
    let tmp = tempfile::tempdir().unwrap();
    let base = session_fixture(tmp.path());
    let out = tmp.path().join("out");

    eegclean()
        .env("EEGCLEAN_BASE_DIR", &base)
        .env("EEGCLEAN_OUTPUT_DIR", &out)
        .arg("run")
        .assert()
        .success();

    assert!(out.join("cleaned_rec.csv").is_file());
}

#[test]
fn test_run_missing_base_dir() {
    let tmp = tempfile::tempdir().unwrap();
    eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(tmp.path().join("nope"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("base directory not found"));
}

#[test]
fn test_run_without_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no session folders"));
}

#[test]
fn test_run_dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let base = session_fixture(tmp.path());
    let out = tmp.path().join("out");

    eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(&base)
        .arg("--output-dir")
        .arg(&out)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("rec.txt"))
        .stderr(predicate::str::contains("Found 1 recording(s) in 1 session(s)"));

    assert!(!out.exists());
}

#[test]
fn test_run_json_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let base = session_fixture(tmp.path());
    let out = tmp.path().join("out");

    let output = eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(&base)
        .arg("--output-dir")
        .arg(&out)
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["sessions"].as_array().unwrap().len(), 1);

    let files = parsed["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["status"], "cleaned");
    assert_eq!(files[0]["rows"], 64);
    let channels = files[0]["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 2);
    assert!(channels.iter().all(|c| c["status"] == "filtered"));
    assert_eq!(files[0]["normalization"]["status"], "applied");
}

#[test]
fn test_run_rejects_invalid_band() {
    let tmp = tempfile::tempdir().unwrap();
    let base = session_fixture(tmp.path());

    eegclean()
        .arg("run")
        .arg("--base-dir")
        .arg(&base)
        .args(["--high-cut", "200"])
        .assert()
        .code(1);
}

// =============================================================================
// CLEAN SUBCOMMAND
// =============================================================================

#[test]
fn test_clean_uses_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("rec.txt");
    write_recording(&file, 40);
    let out = tmp.path().join("out");
    let config = tmp.path().join("clean.json");
    fs::write(
        &config,
        format!(
            r#"{{ "output_prefix": "filt_", "output_dir": {} }}"#,
            serde_json::to_string(&out).unwrap()
        ),
    )
    .unwrap();

    eegclean()
        .arg("--config")
        .arg(&config)
        .arg("clean")
        .arg(&file)
        .assert()
        .success();

    assert!(out.join("filt_rec.csv").is_file());
}

#[test]
fn test_clean_all_files_failed() {
    let tmp = tempfile::tempdir().unwrap();
    eegclean()
        .arg("clean")
        .arg(tmp.path().join("missing.csv"))
        .arg("--output-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("skip"));
}

#[test]
fn test_clean_partial_failure_still_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("rec.txt");
    write_recording(&good, 40);
    let out = tmp.path().join("out");

    eegclean()
        .arg("clean")
        .arg(&good)
        .arg(tmp.path().join("missing.csv"))
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 1 of 2 recording(s), 1 skipped"));

    assert!(out.join("cleaned_rec.csv").is_file());
}

#[test]
fn test_bad_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("clean.json");
    fs::write(&config, "not json").unwrap();

    eegclean()
        .arg("--config")
        .arg(&config)
        .arg("clean")
        .arg(tmp.path().join("rec.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("parsing config file"));
}
