//! End-to-end session behavior against a mock backend.

use std::fs;
use std::net::TcpListener;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn write_storage(home: &Path, entries: &Value) {
    fs::write(home.join("storage.json"), entries.to_string()).unwrap();
}

fn read_storage(home: &Path) -> Value {
    let contents = fs::read_to_string(home.join("storage.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn test_guarded_command_without_session_is_denied() {
    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", "http://127.0.0.1:9")
        .args(["drones", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in to open /manage"));

    let storage = read_storage(dir.path());
    assert_eq!(storage["hangar_return_to"], "/manage");
    assert!(storage.get("hangar_token").is_none());
}

#[test]
fn test_spanish_is_the_default_language() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", "http://127.0.0.1:9")
        .args(["drones", "show", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Inicia sesión para abrir /drones/3"));
}

#[tokio::test]
async fn test_login_returns_to_denied_destination() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "pilot@example.com", "password": "secret1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "show", "7"])
        .assert()
        .failure();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["login", "--email", "pilot@example.com", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in."))
        .stdout(predicate::str::contains("Continue at /drones/7"));

    let storage = read_storage(dir.path());
    assert_eq!(storage["hangar_token"], "tok-1");
    assert!(storage.get("hangar_return_to").is_none());
}

#[tokio::test]
async fn test_invalid_credentials_never_reach_the_backend() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["login", "--email", "not-an-email", "--password", "secret1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email."));
}

#[tokio::test]
async fn test_expired_token_ends_the_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drones"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en", "hangar_token": "stale"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session ended"));

    let storage = read_storage(dir.path());
    assert!(storage.get("hangar_token").is_none());
    assert_eq!(storage["lang"], "en");
    assert!(storage.get("hangar_session_msg").is_some());
}

#[tokio::test]
async fn test_drone_list_prints_newest_first() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Apex", "controller": "Betaflight"},
            {"id": 12, "name": "Whoop", "video": "Digital"}
        ])))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en", "hangar_token": "tok"}));

    let output = cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let whoop = stdout.find("Whoop").unwrap();
    let apex = stdout.find("Apex").unwrap();
    assert!(whoop < apex, "{stdout}");
}

#[tokio::test]
async fn test_empty_community_feed_prints_notice() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/community/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["community", "dumps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No public entries yet."));
}

#[tokio::test]
async fn test_community_search_without_match() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/community/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "post": {"id": 1, "title": "Freestyle build"},
                "drone": {"id": 10, "name": "Apex"},
                "owner": {"handle": "ma***@mail.com"},
                "dumps": []
            }
        ])))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["community", "drones", "--query", "racer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No search results."));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["community", "drones", "--query", "apex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Freestyle build"));
}

#[test]
fn test_dump_parse_without_session_is_denied() {
    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", "http://127.0.0.1:9")
        .args(["drones", "parse", "4", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in to open /drones/4/dumps/9/parse"));

    let storage = read_storage(dir.path());
    assert_eq!(storage["hangar_return_to"], "/drones/4/dumps/9/parse");
}

#[tokio::test]
async fn test_dump_parse_prints_sections() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drones/4/dumps/9/parse"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "drone": {"id": 4, "name": "Apex"},
            "dump": {"id": 9, "drone_id": 4, "original_name": "apex.txt", "bytes": 2048},
            "parsed": {
                "firmware": {"board_name": "MATEKF405"},
                "features": {"enabled": ["TELEMETRY"], "disabled": []},
                "settings": {
                    "global": {},
                    "profiles": {"1": {"pid": {"p_roll": "45"}}, "0": {"pid": {"p_roll": "40", "i_roll": "80"}}},
                    "rateprofiles": {}
                },
                "warnings": ["Unknown line: foo"],
                "stats": {"lines_total": 3, "recognized": 2, "unknown": 1}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en", "hangar_token": "tok"}));

    let output = cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "parse", "4", "9"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("apex.txt  (drone #4 Apex)"), "{stdout}");
    assert!(stdout.contains("MATEKF405"), "{stdout}");
    assert!(stdout.contains("enabled        TELEMETRY"), "{stdout}");
    assert!(stdout.contains("Unknown line: foo"), "{stdout}");
    let first = stdout.find("profile 0  pid 2").unwrap();
    let second = stdout.find("profile 1  pid 1").unwrap();
    assert!(first < second, "{stdout}");
}

#[tokio::test]
async fn test_dump_parse_failure_prints_notice() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drones/4/dumps/9/parse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "es", "hangar_token": "tok"}));

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "parse", "4", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No se pudo parsear el dump."));
}

#[tokio::test]
async fn test_dump_upload_reports_success() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dumps"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "drone_id": 4, "original_name": "apex.txt", "bytes": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en", "hangar_token": "tok"}));
    let file = dir.path().join("apex.txt");
    fs::write(&file, "feature OSD").unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "upload", "4"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dump uploaded successfully."))
        .stdout(predicate::str::contains("apex.txt"));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("feature OSD"));
}

#[tokio::test]
async fn test_dump_upload_rejects_extension_before_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dumps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_storage(dir.path(), &json!({"lang": "en", "hangar_token": "tok"}));
    let file = dir.path().join("flight.log");
    fs::write(&file, "x").unwrap();

    cargo_bin_cmd!("hangar")
        .env("HANGAR_HOME", dir.path())
        .env("HANGAR_API_BASE_URL", server.uri())
        .args(["drones", "upload", "4"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file extension: .log"));
}
