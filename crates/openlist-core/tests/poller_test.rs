#![allow(clippy::unwrap_used)]
// Integration tests for the polling coordinator using wiremock.
//
// The client uses API-key auth so no login mock is needed -- the key is
// installed as the token without a network call.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json_string, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use openlist_api::{Credentials, OpenListClient, TaskType};
use openlist_core::store::{SensorKey, SensorStore, TaskCountKind};
use openlist_core::Poller;

// ── Helpers ─────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> Arc<OpenListClient> {
    Arc::new(OpenListClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials::ApiKey {
            key: "test-key".to_string().into(),
        },
    ))
}

fn poller_for(server: &MockServer, dirs: &[&str]) -> (Arc<SensorStore>, Poller) {
    let dirs: Vec<String> = dirs.iter().map(|s| (*s).to_owned()).collect();
    let store = Arc::new(SensorStore::new(&dirs));
    let poller = Poller::new(client_for(server), Arc::clone(&store), dirs);
    (store, poller)
}

fn listing(count: usize) -> ResponseTemplate {
    let content: Vec<_> = (0..count)
        .map(|i| json!({ "name": format!("file-{i}"), "size": 1, "is_dir": false }))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200,
        "message": "success",
        "data": { "content": content, "total": count, "write": true }
    }))
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200, "message": "success", "data": data
    }))
}

/// Mount empty done/undone answers for every task queue.
async fn mount_empty_tasks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/task/[a-z_]+/(done|undone)$"))
        .respond_with(envelope(json!([])))
        .mount(server)
        .await;
}

fn list_body(dir: &str) -> String {
    json!({ "path": dir, "password": "", "page": 1, "per_page": 0, "refresh": false })
        .to_string()
}

fn dir_key(path: &str) -> SensorKey {
    SensorKey::DirCount { path: path.into() }
}

fn task_key(task_type: TaskType, kind: TaskCountKind) -> SensorKey {
    SensorKey::TaskCount { task_type, kind }
}

// ── Directory polling ───────────────────────────────────────────────

#[tokio::test]
async fn successful_poll_publishes_counts() {
    let server = MockServer::start().await;
    let (store, poller) = poller_for(&server, &["/downloads"]);

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(listing(3))
        .mount(&server)
        .await;

    poller.poll_directories_once().await;

    let state = store.get(&dir_key("/downloads")).unwrap();
    assert_eq!(state.value, Some(3));
    assert!(state.available);
    assert!(state.last_updated.is_some());
}

#[tokio::test]
async fn one_failing_directory_does_not_disturb_the_others() {
    let server = MockServer::start().await;
    let (store, poller) = poller_for(&server, &["/good", "/bad"]);

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .and(body_json_string(list_body("/good")))
        .respond_with(listing(5))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .and(body_json_string(list_body("/bad")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 500, "message": "storage offline", "data": null
        })))
        .mount(&server)
        .await;

    poller.poll_directories_once().await;

    let good = store.get(&dir_key("/good")).unwrap();
    assert_eq!(good.value, Some(5));
    assert!(good.available);

    let bad = store.get(&dir_key("/bad")).unwrap();
    assert!(!bad.available);

    // Task sensors are a different target family -- untouched either way.
    let task = store
        .get(&task_key(TaskType::Upload, TaskCountKind::Undone))
        .unwrap();
    assert_eq!(task.value, None);
}

#[tokio::test]
async fn failed_poll_keeps_last_good_value() {
    let server = MockServer::start().await;
    let (store, poller) = poller_for(&server, &["/downloads"]);

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(listing(7))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Everything after the first call fails at the transport level.
    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    poller.poll_directories_once().await;
    let state = store.get(&dir_key("/downloads")).unwrap();
    assert_eq!(state.value, Some(7));
    assert!(state.available);
    let first_update = state.last_updated;

    poller.poll_directories_once().await;
    let state = store.get(&dir_key("/downloads")).unwrap();
    assert_eq!(state.value, Some(7), "stale value must survive a failed poll");
    assert!(!state.available);
    assert_eq!(state.last_updated, first_update);
}

#[tokio::test]
async fn tick_during_inflight_cycle_is_skipped() {
    let server = MockServer::start().await;
    let (_store, poller) = poller_for(&server, &["/slow"]);
    let poller = Arc::new(poller);

    Mock::given(method("POST"))
        .and(path("/api/fs/list"))
        .respond_with(listing(1).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let first = {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move { poller.poll_directories_once().await })
    };

    // Give the first cycle time to enter Fetching, then tick again.
    tokio::time::sleep(Duration::from_millis(50)).await;
    poller.poll_directories_once().await; // must be a no-op
    first.await.unwrap();

    assert_eq!(
        server.received_requests().await.unwrap().len(),
        1,
        "the overlapping tick must not issue any requests"
    );
}

// ── Task polling ────────────────────────────────────────────────────

#[tokio::test]
async fn task_counts_derive_from_done_and_undone_lists() {
    let server = MockServer::start().await;
    let (store, poller) = poller_for(&server, &[]);

    Mock::given(method("GET"))
        .and(path("/api/task/offline_download/done"))
        .respond_with(envelope(json!([
            { "id": "1", "state": 2, "status": "succeeded" },
            { "id": "2", "state": 7, "status": "failed" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/task/offline_download/undone"))
        .respond_with(envelope(json!([{ "id": "3", "state": 1 }])))
        .mount(&server)
        .await;

    mount_empty_tasks(&server).await;

    poller.poll_tasks_once().await;

    let ty = TaskType::OfflineDownload;
    let succeeded = store.get(&task_key(ty, TaskCountKind::DoneSucceeded)).unwrap();
    let failed = store.get(&task_key(ty, TaskCountKind::DoneFailed)).unwrap();
    let undone = store.get(&task_key(ty, TaskCountKind::Undone)).unwrap();

    assert_eq!(succeeded.value, Some(1));
    assert_eq!(failed.value, Some(1));
    assert_eq!(undone.value, Some(1));
    assert!(succeeded.available && failed.available && undone.available);

    // The other queues were empty, not unavailable.
    let other = store.get(&task_key(TaskType::Copy, TaskCountKind::Undone)).unwrap();
    assert_eq!(other.value, Some(0));
    assert!(other.available);
}

#[tokio::test]
async fn partial_task_fetch_publishes_none_of_the_three_counts() {
    let server = MockServer::start().await;
    let (store, poller) = poller_for(&server, &[]);

    // Seed every queue with a clean poll first.
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/task/[a-z_]+/(done|undone)$"))
        .respond_with(envelope(json!([{ "id": "1", "state": 2 }])))
        .up_to_n_times(14)
        .mount(&server)
        .await;

    poller.poll_tasks_once().await;

    let ty = TaskType::Copy;
    assert_eq!(
        store.get(&task_key(ty, TaskCountKind::DoneSucceeded)).unwrap().value,
        Some(1)
    );

    // Second cycle: copy/undone breaks, everything else still answers.
    Mock::given(method("GET"))
        .and(path("/api/task/copy/undone"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/task/[a-z_]+/(done|undone)$"))
        .respond_with(envelope(json!([])))
        .mount(&server)
        .await;

    poller.poll_tasks_once().await;

    // All three copy sensors went unavailable together, keeping values.
    for kind in [
        TaskCountKind::DoneSucceeded,
        TaskCountKind::DoneFailed,
        TaskCountKind::Undone,
    ] {
        let state = store.get(&task_key(ty, kind)).unwrap();
        assert!(!state.available, "copy {kind} should be unavailable");
    }
    assert_eq!(
        store.get(&task_key(ty, TaskCountKind::DoneSucceeded)).unwrap().value,
        Some(1),
        "previous counts survive the failed cycle"
    );

    // Fault isolation: another queue updated normally in the same cycle.
    let upload = store.get(&task_key(TaskType::Upload, TaskCountKind::Undone)).unwrap();
    assert!(upload.available);
    assert_eq!(upload.value, Some(0));
}
