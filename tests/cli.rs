use assert_cmd::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Runs the binary from `dir` with no user configuration directory in reach.
fn pilot(dir: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("assignment-pilot");
    let mut cmd = Command::new(bin);
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_show_prints_defaults_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let assert = pilot(dir.path()).args(["config", "show"]).assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: serde_yaml::Value = serde_yaml::from_str(&stdout).expect("valid yaml");
    assert_eq!(value["site"]["content_frame"].as_str(), Some("iframeContent"));
    assert_eq!(value["webdriver"]["browser"].as_str(), Some("edge"));
    assert!(value.get("credentials").is_none());
}

#[test]
fn config_file_overrides_are_visible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.yaml");
    fs::write(
        &path,
        "site:\n  target_url: https://school.example.test/\nrun:\n  max_items: 2\n",
    )
    .unwrap();

    let assert = pilot(dir.path())
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: serde_yaml::Value = serde_yaml::from_str(&stdout).expect("valid yaml");
    assert_eq!(value["site"]["target_url"].as_str(), Some("https://school.example.test/"));
    assert_eq!(value["run"]["max_items"].as_u64(), Some(2));
}

#[test]
fn config_path_reports_defaults_when_no_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let assert = pilot(dir.path()).args(["config", "path"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("built-in defaults"));
}

#[test]
fn discovered_local_config_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("config/pilot.toml"), "[webdriver]\nport = 9777\n").unwrap();

    let assert = pilot(dir.path()).args(["config", "path"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.trim_end().ends_with("pilot.toml"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    pilot(dir.path())
        .args(["--config", "absent.toml", "config", "show"])
        .assert()
        .failure();
}

#[test]
fn conflicting_close_flags_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    pilot(dir.path())
        .args(["run", "--close", "--keep-open"])
        .assert()
        .failure();
}

#[test]
fn info_reports_configured_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.toml");
    fs::write(&path, "[webdriver]\nendpoint = \"http://127.0.0.1:4444\"\n").unwrap();

    let assert = pilot(dir.path())
        .args(["--config", path.to_str().unwrap(), "info"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("attach to http://127.0.0.1:4444"));
    assert!(stdout.contains("Browser:     edge"));
    assert!(stdout.contains("pilot_webdriver_command_failures_total"));
    assert!(!stdout.contains("issued:"));
}
