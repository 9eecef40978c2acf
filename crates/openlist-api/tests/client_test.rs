#![allow(clippy::unwrap_used)]
// Integration tests for `OpenListClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use openlist_api::{Credentials, Error, ListQuery, OpenListClient, TaskType};

// ── Helpers ─────────────────────────────────────────────────────────

fn password_credentials() -> Credentials {
    Credentials::Password {
        username: "admin".into(),
        password: "hunter2".to_string().into(),
    }
}

async fn setup() -> (MockServer, OpenListClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        OpenListClient::with_client(reqwest::Client::new(), base_url, password_credentials());
    (server, client)
}

/// Mount the standard login mock issuing `token`.
async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login/hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "success",
            "data": { "token": token }
        })))
        .mount(server)
        .await;
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200,
        "message": "success",
        "data": data
    }))
}

fn fs_listing(names: &[&str]) -> serde_json::Value {
    let content: Vec<_> = names
        .iter()
        .map(|n| json!({ "name": n, "size": 42, "is_dir": false, "modified": "2026-08-01T10:00:00Z" }))
        .collect();
    json!({ "content": content, "total": names.len(), "write": true, "provider": "local" })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn login_stores_token_and_sends_it() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .and(header("Authorization", "tok-1"))
        .respond_with(ok_envelope(fs_listing(&["a.txt"])))
        .mount(&server)
        .await;

    let listing = client.list_files("/", &ListQuery::default()).await.unwrap();
    assert_eq!(listing.entries().len(), 1);
    assert!(client.has_session().await);
}

#[tokio::test]
async fn login_failure_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 400,
            "message": "username or password is incorrect",
            "data": null
        })))
        .mount(&server)
        .await;

    let result = client.list_files("/", &ListQuery::default()).await;
    match result {
        Err(Error::Auth { ref message }) => {
            assert!(message.contains("incorrect"), "got: {message}");
        }
        other => panic!("expected Auth error, got: {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_relogin_and_retry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200, "message": "success", "data": { "token": "tok" }
        })))
        .expect(2) // initial login + one refresh, no more
        .mount(&server)
        .await;

    // First data call is rejected with an in-envelope 401, then succeeds.
    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 401, "message": "token is expired", "data": null
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ok_envelope(fs_listing(&["a.txt", "b.txt"])))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client.list_files("/media", &ListQuery::default()).await.unwrap();
    assert_eq!(listing.entries().len(), 2);
}

#[tokio::test]
async fn second_unauthorized_surfaces_auth_error_without_more_retries() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200, "message": "success", "data": { "token": "tok" }
        })))
        .expect(2)
        .mount(&server)
        .await;

    // Every data call comes back unauthorized at the HTTP layer.
    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2) // original + exactly one retry
        .mount(&server)
        .await;

    let result = client.list_files("/", &ListQuery::default()).await;
    assert!(
        matches!(result, Err(Error::Auth { .. })),
        "expected Auth error, got: {result:?}"
    );
}

#[tokio::test]
async fn rejected_api_key_is_auth_error_without_relogin() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = OpenListClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::ApiKey {
            key: "stale-key".to_string().into(),
        },
    );

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1) // no retry in API-key mode
        .mount(&server)
        .await;

    let result = client.list_files("/", &ListQuery::default()).await;
    assert!(
        matches!(result, Err(Error::Auth { .. })),
        "expected Auth error, got: {result:?}"
    );
}

// ── Filesystem reads ────────────────────────────────────────────────

#[tokio::test]
async fn list_files_is_idempotent_without_mutation() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .and(body_json(json!({
            "path": "/downloads",
            "password": "",
            "page": 1,
            "per_page": 0,
            "refresh": false
        })))
        .respond_with(ok_envelope(fs_listing(&["x", "y", "z"])))
        .mount(&server)
        .await;

    let first = client.list_files("/downloads", &ListQuery::default()).await.unwrap();
    let second = client.list_files("/downloads", &ListQuery::default()).await.unwrap();
    assert_eq!(first.entries().len(), second.entries().len());
    assert_eq!(first.total, second.total);
}

#[tokio::test]
async fn remote_rejection_maps_to_remote_error() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 500, "message": "storage not found", "data": null
        })))
        .mount(&server)
        .await;

    let result = client.list_files("/gone", &ListQuery::default()).await;
    match result {
        Err(Error::Remote { code, ref message }) => {
            assert_eq!(code, 500);
            assert!(message.contains("storage not found"));
        }
        other => panic!("expected Remote error, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_maps_to_deserialization_error() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway error</html>"))
        .mount(&server)
        .await;

    let result = client.list_files("/", &ListQuery::default()).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Local validation (never touches the network) ────────────────────

#[tokio::test]
async fn empty_move_names_fail_before_any_network_call() {
    let (server, client) = setup().await;

    // Any request at all would trip this.
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.move_files("/a", "/b", &[]).await;
    assert!(matches!(result, Err(Error::Validation { .. })));

    let result = client.rename("/a/b.txt", "c/d.txt").await;
    assert!(matches!(result, Err(Error::Validation { .. })));

    let result = client.delete_some_tasks(TaskType::Copy, &[]).await;
    assert!(matches!(result, Err(Error::Validation { .. })));

    let result = client.search_files("", "movie", 0, 1, 20).await;
    assert!(matches!(result, Err(Error::Validation { .. })));
}

// ── Tasks ───────────────────────────────────────────────────────────

#[tokio::test]
async fn done_and_undone_task_lists_parse() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/task/offline_download/done"))
        .respond_with(ok_envelope(json!([
            { "id": "1", "name": "iso", "state": 2, "status": "succeeded", "progress": 100.0 },
            { "id": "2", "name": "img", "state": 7, "status": "failed", "error": "timeout" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/task/offline_download/undone"))
        .respond_with(ok_envelope(json!([
            { "id": "3", "name": "tar", "state": 1, "status": "running", "progress": 40.0 }
        ])))
        .mount(&server)
        .await;

    let done = client.get_task_done(TaskType::OfflineDownload).await.unwrap();
    let undone = client.get_task_undone(TaskType::OfflineDownload).await.unwrap();

    assert_eq!(done.len(), 2);
    assert!(done[0].succeeded());
    assert!(!done[1].succeeded());
    assert_eq!(done[1].error, "timeout");
    assert_eq!(undone.len(), 1);
}

#[tokio::test]
async fn null_task_list_is_empty() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/task/upload/done"))
        .respond_with(ok_envelope(json!(null)))
        .mount(&server)
        .await;

    let done = client.get_task_done(TaskType::Upload).await.unwrap();
    assert!(done.is_empty());
}

#[tokio::test]
async fn single_task_mutation_passes_tid_as_query() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/task/copy/cancel"))
        .and(query_param("tid", "task-9"))
        .respond_with(ok_envelope(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client.cancel_task(TaskType::Copy, "task-9").await.unwrap();
}

#[tokio::test]
async fn batch_task_mutation_posts_tid_list() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/task/move/retry_some"))
        .and(body_json(json!(["t1", "t2"])))
        .respond_with(ok_envelope(json!([
            { "tid": "t1", "code": 200 },
            { "tid": "t2", "code": 500, "message": "gone" }
        ])))
        .mount(&server)
        .await;

    // Per-item results come back untouched; no rollback is attempted.
    let result = client
        .retry_some_tasks(TaskType::Move, &["t1".into(), "t2".into()])
        .await
        .unwrap();
    assert_eq!(result.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn clear_done_hits_per_type_route() {
    let (server, client) = setup().await;
    mount_login(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/task/decompress_upload/clear_done"))
        .respond_with(ok_envelope(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_done_tasks(TaskType::DecompressUpload).await.unwrap();
}
