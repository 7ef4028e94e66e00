//! Integration tests for the `portal` CLI binary.
//!
//! Argument parsing and config handling run offline; backend commands run
//! against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `portal` binary with env isolation: no user
/// config, no token, no keyring lookups.
fn portal_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("portal");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("PORTAL_AUTH__KEYRING", "false")
        .env_remove("PORTAL_CONFIG")
        .env_remove("PORTAL_ACCESS_TOKEN")
        .env_remove("PORTAL_LANG")
        .env_remove("PORTAL_ENVIRONMENT__MARKETPLACE_API_BASE")
        .env_remove("PORTAL_ENVIRONMENT__SEMANTIC_API_BASE")
        .env_remove("RUST_LOG");
    cmd
}

/// A command already pointed at `server` for both backends.
fn backend_cmd(home: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = portal_cmd(home);
    cmd.env("PORTAL_ENVIRONMENT__MARKETPLACE_API_BASE", server.uri())
        .env("PORTAL_ENVIRONMENT__SEMANTIC_API_BASE", server.uri());
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn detail(tenant_url: &str) -> serde_json::Value {
    json!({
        "id": "s1",
        "name": "Dataspace Connector",
        "customer": "ACME",
        "offerSubscriptionStatus": "ACTIVE",
        "tenantUrl": tenant_url
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = portal_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    portal_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("apps")
            .and(predicate::str::contains("subscription"))
            .and(predicate::str::contains("models")),
    );
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    portal_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_unknown_artifact_type_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    portal_cmd(home.path())
        .args(["models", "artifact", "urn:x", "--type", "pdf"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("custom.toml");
    portal_cmd(home.path())
        .args(["config", "path", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("portal.toml");

    portal_cmd(home.path())
        .env("PORTAL_CONFIG", &file)
        .args([
            "config",
            "init",
            "--marketplace-url",
            "https://portal.example.com/",
            "--semantic-url",
            "https://semantics.example.com/",
        ])
        .assert()
        .success();
    assert!(file.is_file());

    portal_cmd(home.path())
        .env("PORTAL_CONFIG", &file)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://portal.example.com/"));

    // Second init without --force refuses to overwrite.
    portal_cmd(home.path())
        .env("PORTAL_CONFIG", &file)
        .args([
            "config",
            "init",
            "--marketplace-url",
            "https://other.example.com/",
            "--semantic-url",
            "https://other.example.com/",
        ])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_init_rejects_bad_url() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("portal.toml");
    portal_cmd(home.path())
        .env("PORTAL_CONFIG", &file)
        .args([
            "config",
            "init",
            "--marketplace-url",
            "ftp://portal.example.com",
            "--semantic-url",
            "https://semantics.example.com/",
        ])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("environment.marketplace_api_base"));
    assert!(!file.exists());
}

#[test]
fn test_missing_backend_url_names_field() {
    let home = tempfile::tempdir().unwrap();
    portal_cmd(home.path())
        .args(["apps", "active"])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("environment.marketplace_api_base"));
}

// ── Backend commands ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_apps_active_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apps/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "a1",
            "title": "Dataspace Connector",
            "provider": "Catena-X",
            "status": "ACTIVE"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = backend_cmd(home.path(), &server);
    cmd.args(["apps", "active"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dataspace Connector"));
    assert!(stdout.contains("Active"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_models_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hub/api/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "urn": "urn:bamm:io.catenax.batch:1.0.0#Batch",
                "name": "Batch",
                "version": "1.0.0",
                "type": "BAMM",
                "status": "RELEASED"
            }],
            "totalItems": 1,
            "currentPage": 0,
            "totalPages": 1,
            "itemCount": 1
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = backend_cmd(home.path(), &server);
    cmd.args(["models", "list", "-o", "plain"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "urn:bamm:io.catenax.batch:1.0.0#Batch"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apps/favourites"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = backend_cmd(home.path(), &server);
    cmd.args(["apps", "favorites"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("set-token"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_tenant_url_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apps/a1/subscription/s1/provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail("https://old.example.com")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = backend_cmd(home.path(), &server);
    cmd.args(["subscription", "set-tenant-url", "a1", "s1", "not-a-url"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("tenantUrl"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_tenant_url_prints_refreshed_detail() {
    let server = MockServer::start().await;
    let detail_path = "/api/apps/a1/subscription/s1/provider";
    Mock::given(method("GET"))
        .and(path(detail_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail("https://old.example.com")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(detail_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail("https://new.example.com")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/apps/a1/subscription/s1/tenantUrl"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = backend_cmd(home.path(), &server);
    cmd.args([
        "subscription",
        "set-tenant-url",
        "a1",
        "s1",
        "https://new.example.com",
        "-o",
        "json",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["tenantUrl"], "https://new.example.com");
}
