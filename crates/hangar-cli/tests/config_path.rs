use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("request_timeout_secs = 15"));
    assert!(contents.contains("# api_base_url ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_set_url_keeps_other_keys() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "request_timeout_secs = 30\n").unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["config", "set-url", "https://hangar.example.com/"])
        .assert()
        .success();

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("request_timeout_secs = 30"));
    assert!(contents.contains(r#"api_base_url = "https://hangar.example.com/""#));
}

#[test]
fn test_config_set_url_rejects_garbage() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["config", "set-url", "not a url"])
        .assert()
        .failure();
}

#[test]
fn test_lang_round_trip() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .arg("lang")
        .assert()
        .success()
        .stdout(predicate::str::contains("es"));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["lang", "EN"])
        .assert()
        .success();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .arg("lang")
        .assert()
        .success()
        .stdout(predicate::str::diff("en\n"));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .args(["lang", "de"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported language"));
}
