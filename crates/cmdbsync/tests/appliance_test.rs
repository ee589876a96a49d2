//! End-to-end tests running the `cmdbsync` binary against a mock appliance.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn reply(http_method: &str, http_status: u16, status: &str, mkey: Value) -> Value {
    json!({
        "http_method": http_method,
        "revision": "6c1f0e",
        "mkey": mkey,
        "status": status,
        "http_status": http_status,
        "serial": "FGVM010000000001",
        "version": "v6.0.2",
        "build": 163,
        "vdom": "root"
    })
}

/// Mount login, logout, and the schema lookup for `table_path`.
async fn appliance(table_path: &str, mkey: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logincheck"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "ccsrftoken=\"A1B2C3\"; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(table_path))
        .and(query_param("action", "schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": { "mkey": mkey }
        })))
        .mount(&server)
        .await;

    server
}

/// Run the binary against `server` with isolated config and the given
/// trailing arguments.
async fn run(server: &MockServer, dir: &Path, args: &[&str]) -> Output {
    let host = server.address().to_string();
    let mut cmd = cargo_bin_cmd!("cmdbsync");
    cmd.env("CMDBSYNC_CONFIG", dir.join("config.toml"))
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("CMDBSYNC_PROFILE")
        .env_remove("CMDBSYNC_VDOM")
        .env_remove("CMDBSYNC_OUTPUT")
        .env_remove("RUST_LOG")
        .args([
            "--host",
            host.as_str(),
            "--http",
            "-u",
            "admin",
            "--password",
            "pw",
            "--timeout",
            "5",
            "-y",
        ])
        .args(args);

    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

// ── Reconcile ───────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_present_reports_changed() {
    let server = appliance("/api/v2/cmdb/user/device", "alias").await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/user/device/laptop"))
        .and(query_param("vdom", "root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "PUT",
            200,
            "success",
            json!("laptop"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &server,
        dir.path(),
        &["-o", "json", "reconcile", "user.device", "-s", "present", "--set", "alias=laptop"],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(report["resource"], "user.device");
    assert_eq!(report["failed"], false);
    assert_eq!(report["changed"], true);
    assert_eq!(report["meta"]["http_method"], "PUT");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_absent_on_missing_object_reports_ok() {
    let server = appliance("/api/v2/cmdb/user/device", "alias").await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/cmdb/user/device/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(reply(
            "DELETE",
            404,
            "error",
            json!("ghost"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &server,
        dir.path(),
        &["-o", "plain", "reconcile", "user.device", "-s", "absent", "--mkey", "ghost"],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "user.device\tok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_write_exits_with_reply_attached() {
    let server = appliance("/api/v2/cmdb/system/storage", "name").await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/system/storage/disk1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(reply(
            "PUT",
            500,
            "error",
            json!("disk1"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &server,
        dir.path(),
        &["-o", "json", "reconcile", "system.storage", "-s", "present", "--set", "name=disk1"],
    )
    .await;

    assert_eq!(output.status.code(), Some(6));
    let report = stdout_json(&output);
    assert_eq!(report["failed"], true);
    assert_eq!(report["changed"], false);
    assert_eq!(report["meta"]["status"], "error");
    assert_eq!(report["meta"]["http_status"], 500);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_padded_mkey_is_sent_verbatim() {
    let server = appliance("/api/v2/cmdb/system/storage", "name").await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/cmdb/system/storage/007"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "DELETE",
            200,
            "success",
            json!("007"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &server,
        dir.path(),
        &["-o", "plain", "reconcile", "system.storage", "-s", "absent", "--mkey", "007"],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "system.storage\tchanged");
}

// ── Apply ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_continues_past_a_rejected_task() {
    let server = appliance("/api/v2/cmdb/user/device", "alias").await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/user/device/bad"))
        .respond_with(ResponseTemplate::new(500).set_body_json(reply(
            "PUT",
            500,
            "error",
            json!("bad"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/user/device/good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "PUT",
            200,
            "success",
            json!("good"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("batch.yaml");
    std::fs::write(
        &manifest,
        "tasks:\n\
         \x20 - resource: user.device\n\
         \x20   state: present\n\
         \x20   data: { alias: bad }\n\
         \x20 - resource: user.device\n\
         \x20   state: present\n\
         \x20   data: { alias: good }\n",
    )
    .unwrap();
    let manifest = manifest.display().to_string();

    let output = run(&server, dir.path(), &["-o", "json", "apply", &manifest]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 2 tasks failed"));

    let reports = stdout_json(&output);
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["failed"], true);
    assert_eq!(reports[0]["meta"]["http_status"], 500);
    assert_eq!(reports[1]["failed"], false);
    assert_eq!(reports[1]["changed"], true);
}
