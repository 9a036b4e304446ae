//! End-to-end tests for the project commands.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Temp TASKMASTER_HOME with a stored session.
fn logged_in_home(token: &str) -> TempDir {
    let home = TempDir::new().expect("create temp taskmaster home");
    write_session(home.path(), token);
    home
}

fn write_session(home: &Path, token: &str) {
    let session = json!({
        "token": token,
        "user": { "id": 1, "email": "a@b.com", "name": "Ada" }
    });
    fs::write(home.join("session.json"), session.to_string()).unwrap();
}

fn project(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "status": "active",
        "created_at": "2025-06-01T12:00:00Z",
        "updated_at": "2025-06-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_projects_list_sends_bearer_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok-list");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .and(header("authorization", "Bearer tok-list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "projects": [project(1, "Alpha"), project(2, "Beta")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha"))
        .stdout(predicate::str::contains("Beta"))
        .stdout(predicate::str::contains("created 2025-06-01"));
}

#[test]
fn test_projects_list_without_session_redirects_to_login() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", "http://127.0.0.1:1")
        .args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("taskmaster login"));
}

#[tokio::test]
async fn test_expired_token_clears_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok-expired");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "token expired" })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("taskmaster login"));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_create_posts_draft_and_prints_reloaded_list() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "projects": [project(7, "Launch")] })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/"))
        .and(body_json(json!({ "name": "Launch", "description": "ship it" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "project": project(7, "Launch") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args([
            "projects",
            "create",
            "--name",
            "Launch",
            "--description",
            "ship it",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project Launch (7)"));
}

#[tokio::test]
async fn test_delete_proceeds_when_list_is_unavailable() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "delete", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted project 3"))
        .stderr(predicate::str::contains("could not load projects: db down"));
}

#[tokio::test]
async fn test_list_fails_when_server_errors() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("db down"));
}

#[tokio::test]
async fn test_create_with_blank_name_fails_before_posting() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "projects": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "create", "--name", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project name is required"));
}

#[tokio::test]
async fn test_update_keeps_existing_description() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    let mut existing = project(5, "Old");
    existing["description"] = json!("keep me");
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "projects": [existing] })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/projects/5"))
        .and(body_json(json!({ "name": "X", "description": "keep me" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "project": project(5, "X") })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "update", "5", "--name", "X"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated project X (5)"));
}

#[tokio::test]
async fn test_delete_missing_project_shows_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "projects": [] })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "project not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "delete", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project not found"));

    // Session survives ordinary server errors.
    assert!(home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_show_prints_project_details() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok");
    let server = MockServer::start().await;
    let mut detailed = project(3, "Docs");
    detailed["description"] = json!("write them");
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "project": detailed })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("taskmaster")
        .env("TASKMASTER_HOME", home.path())
        .env("TASKMASTER_API_URL", server.uri())
        .args(["projects", "show", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3  Docs"))
        .stdout(predicate::str::contains("about:   write them"));
}
