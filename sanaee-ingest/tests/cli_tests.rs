//! End-to-end tests for the `sanaee` binary
//!
//! Every run uses `--ephemeral` and an explicit `--config` so nothing
//! outside the temp dir is read or written.

use sanaee_common::config::DEFAULT_STORAGE_KEY;
use sanaee_common::models::default_roster;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn sanaee(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sanaee"))
        .arg("--ephemeral")
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("SANAEE_CONFIG")
        .env_remove("SANAEE_ROOT_FOLDER")
        .env("RUST_LOG", "warn")
        .output()
        .expect("run sanaee binary")
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("sanaee.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_broken_config_warning_reaches_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "this is [not toml");

    let output = sanaee(&config, &["stats"]);
    assert!(output.status.success());

    let err = stderr(&output);
    assert!(err.contains("unusable"), "stderr: {}", err);
    assert!(err.contains("using defaults"), "stderr: {}", err);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Workers:     6"));
}

#[test]
fn test_invalid_form_reported_before_image_is_opened() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "");
    let missing = temp_dir.path().join("missing-photo.png");

    let output = sanaee(
        &config,
        &[
            "add",
            "--name",
            "Al",
            "--specialty",
            "x",
            "--area",
            "T",
            "--phone",
            "1",
            "--image",
            missing.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());

    let err = stderr(&output);
    for field in ["name:", "specialty:", "area:", "phone:"] {
        assert!(err.contains(field), "missing {} in stderr: {}", field, err);
    }
    assert!(err.contains("Worker not added: 4 invalid field(s)"), "stderr: {}", err);
    assert!(!err.contains("Failed to read image"), "stderr: {}", err);
}

#[test]
fn test_valid_form_with_missing_image_reports_image_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "");
    let missing = temp_dir.path().join("missing-photo.png");

    let output = sanaee(
        &config,
        &[
            "add",
            "--name",
            "Ali Mahmoud",
            "--specialty",
            "plumber",
            "--area",
            "Tanta",
            "--phone",
            "01012345678",
            "--image",
            missing.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read image"));
}

#[test]
fn test_full_store_reported_as_warning() {
    let seeded = serde_json::to_vec(&default_roster()).unwrap().len() + DEFAULT_STORAGE_KEY.len();
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        &temp_dir,
        &format!("[storage]\nquota_bytes = {}\n", seeded + 40),
    );

    let output = sanaee(
        &config,
        &[
            "add",
            "--name",
            "Ali Mahmoud",
            "--specialty",
            "plumber",
            "--area",
            "Tanta",
            "--phone",
            "01012345678",
        ],
    );
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Warning: Storage is full"), "stderr: {}", err);
    assert!(!err.contains("Error:"), "stderr: {}", err);
}
