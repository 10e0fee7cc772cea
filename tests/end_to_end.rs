use async_trait::async_trait;
use registry_notify::config::{CheckerConfig, WatchConfig};
use registry_notify::registry::{RegistryClient, TokenCache};
use registry_notify::status::{
    Change, MemoryStateStore, StateSnapshot, StateStore, decode_snapshot,
};
use registry_notify::{Checker, Logger, Result, WatchError};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOTIFICATION_PATH: &str = "/node8-or-10";

fn manifest(tag: &str, top: &str) -> serde_json::Value {
    json!({
        "schemaVersion": 1,
        "name": "library/node",
        "tag": tag,
        "architecture": "amd64",
        "fsLayers": [
            { "blobSum": "sha256:a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4" },
            { "blobSum": top }
        ],
        "history": []
    })
}

async fn mount_token(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("scope", "repository:library/node:pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "test-token",
            "access_token": "test-token",
            "expires_in": 300,
            "issued_at": "2018-10-18T17:22:55.893319601Z"
        })))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_manifest(server: &MockServer, tag: &str, top: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/library/node/manifests/{}", tag)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest(tag, top)))
        .expect(1)
        .mount(server)
        .await;
}

fn settings(server: &MockServer) -> CheckerConfig {
    CheckerConfig::default()
        .with_registry_url(server.uri())
        .with_token_url(format!("{}/token", server.uri()))
}

fn watch(server: &MockServer) -> WatchConfig {
    WatchConfig::from_json_str(
        &json!([{
            "repository": "library/node",
            "tags": ["8", "10"],
            "notification": format!("{}{}", server.uri(), NOTIFICATION_PATH)
        }])
        .to_string(),
    )
    .unwrap()
}

fn previous(digest_8: &str, digest_10: &str) -> StateSnapshot {
    let mut snapshot = StateSnapshot::new();
    let tags = snapshot.entry("library/node".to_string()).or_default();
    tags.insert("8".to_string(), digest_8.to_string());
    tags.insert("10".to_string(), digest_10.to_string());
    snapshot
}

#[tokio::test]
async fn test_drift_on_two_tags_sends_two_notifications() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_manifest(&server, "8", "sha256:new8").await;
    mount_manifest(&server, "10", "sha256:new10").await;
    Mock::given(method("POST"))
        .and(path(NOTIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    let checker =
        Checker::from_config(&settings(&server), None, store.clone(), Logger::new_quiet()).unwrap();
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        report.changes,
        vec![Change::new("library/node", "10"), Change::new("library/node", "8")]
    );
    assert_eq!(report.notifications.len(), 2);
    assert!(report.notifications.iter().all(|n| n.contains(NOTIFICATION_PATH)));
    assert_eq!(report.status["library/node"]["8"], "sha256:new8");

    let saved = decode_snapshot(&store.blob().unwrap()).unwrap();
    assert_eq!(saved, report.status);
}

#[tokio::test]
async fn test_no_drift_sends_nothing() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_manifest(&server, "8", "sha256:same8").await;
    mount_manifest(&server, "10", "sha256:same10").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(
        MemoryStateStore::with_snapshot(&previous("sha256:same8", "sha256:same10")).unwrap(),
    );
    let checker =
        Checker::from_config(&settings(&server), None, store, Logger::new_quiet()).unwrap();
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert!(report.changes.is_empty());
    assert!(report.notifications.is_empty());
    assert_eq!(report.status, previous("sha256:same8", "sha256:same10"));
}

#[tokio::test]
async fn test_failed_manifest_is_skipped_and_not_notified() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_manifest(&server, "8", "sha256:new8").await;
    Mock::given(method("GET"))
        .and(path("/v2/library/node/manifests/10"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(NOTIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let checker = Checker::from_config(
        &settings(&server),
        None,
        Arc::new(MemoryStateStore::new()),
        Logger::new_quiet(),
    )
    .unwrap();
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert_eq!(report.changes, vec![Change::new("library/node", "8")]);
    assert_eq!(report.notifications.len(), 1);
    assert!(!report.status["library/node"].contains_key("10"));
}

#[tokio::test]
async fn test_auth_failure_still_produces_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let checker = Checker::from_config(
        &settings(&server),
        None,
        Arc::new(MemoryStateStore::new()),
        Logger::new_quiet(),
    )
    .unwrap();
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert!(report.changes.is_empty());
    assert!(report.notifications.is_empty());
    assert!(report.status.is_empty());
}

#[tokio::test]
async fn test_shared_token_cache_across_runs() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v2/library/node/manifests/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest("8", "sha256:x")))
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(
        RegistryClient::builder()
            .with_registry_url(server.uri())
            .with_token_url(format!("{}/token", server.uri()))
            .with_output(Logger::new_quiet())
            .build()
            .unwrap(),
    );
    let tokens = TokenCache::new(client, Logger::new_quiet());
    let store = Arc::new(MemoryStateStore::new());
    let config = WatchConfig::from_json_str(r#"[{ "repository": "library/node", "tags": "8" }]"#)
        .unwrap();

    for _ in 0..2 {
        let checker = Checker::from_config(
            &settings(&server),
            Some(tokens.clone()),
            store.clone(),
            Logger::new_quiet(),
        )
        .unwrap();
        checker
            .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
            .await
            .unwrap();
    }

    assert_eq!(tokens.len(), 1);
}

struct BrokenStore;

#[async_trait]
impl StateStore for BrokenStore {
    async fn load(&self) -> Result<StateSnapshot> {
        Ok(StateSnapshot::new())
    }

    async fn save(&self, _snapshot: &StateSnapshot) -> Result<()> {
        Err(WatchError::Persistence("store unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_save_failure_keeps_report() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_manifest(&server, "8", "sha256:new8").await;
    mount_manifest(&server, "10", "sha256:new10").await;
    Mock::given(method("POST"))
        .and(path(NOTIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let checker = Checker::from_config(
        &settings(&server),
        None,
        Arc::new(BrokenStore),
        Logger::new_quiet(),
    )
    .unwrap();
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert_eq!(report.changes.len(), 2);
    assert_eq!(report.notifications.len(), 2);
}

#[tokio::test]
async fn test_dry_run_leaves_state_untouched() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_manifest(&server, "8", "sha256:new8").await;
    mount_manifest(&server, "10", "sha256:new10").await;
    Mock::given(method("POST"))
        .and(path(NOTIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    let checker =
        Checker::from_config(&settings(&server), None, store.clone(), Logger::new_quiet())
            .unwrap()
            .with_persist(false);
    let config = watch(&server);
    let report = checker
        .run(&config.matrix(), &config.policies(&Default::default()).unwrap())
        .await
        .unwrap();

    assert_eq!(report.changes.len(), 2);
    assert!(store.blob().is_none());
    assert!(store.load().await.unwrap().is_empty());
}

#[test]
fn test_report_json_shape() {
    let report = registry_notify::RunReport {
        changes: vec![Change::new("library/node", "8")],
        notifications: vec!["POST http://example.com/hook - 200".to_string()],
        status: previous("sha256:a", "sha256:b"),
    };
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["changes"][0], json!({ "project": "library/node", "tag": "8" }));
    assert_eq!(value["notifications"][0], "POST http://example.com/hook - 200");
    assert_eq!(value["status"]["library/node"]["10"], "sha256:b");
}
