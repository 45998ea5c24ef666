//! HTTP tests for the playlist service router.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use promptlist::error::LlmError;
use promptlist::fakes::{FakeCatalog, FakeLanguageModel, VALID_TOKEN};
use promptlist::management::MemoryUsageStore;
use promptlist::pipeline::{EntitlementGate, PlaylistPipeline};
use promptlist::server::{AppState, build_router};
use promptlist::types::{AccountUsage, CreatePlaylistReply};
use serde_json::{Value, json};
use tower::ServiceExt;

const DRAFT: &str = r#"{"name":"Desert Blues","description":"Tuareg guitars","tracks":[
    {"name":"Amassakoul","artist":"Tinariwen"},
    {"name":"Tamatant Tilay","artist":"Tinariwen"},
    {"name":"Unknown Song","artist":"Nobody"}
]}"#;

struct Service {
    router: Router,
    catalog: Arc<FakeCatalog>,
    model: Arc<FakeLanguageModel>,
    pipeline: Arc<PlaylistPipeline>,
}

fn service(model: FakeLanguageModel, count: u64) -> Service {
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_track("Amassakoul", "Tinariwen", "t1")
            .with_track("Tamatant Tilay", "Tinariwen", "t2"),
    );
    let model = Arc::new(model);
    let store = MemoryUsageStore::with_accounts(vec![AccountUsage {
        account_id: "acct-1".to_string(),
        playlist_count: count,
        is_subscribed: false,
    }]);
    let gate = EntitlementGate::new(Arc::new(store), true);

    let pipeline = Arc::new(PlaylistPipeline::new(
        model.clone(),
        catalog.clone(),
        Arc::new(gate),
        Duration::from_secs(5),
    ));
    let router = build_router(AppState {
        pipeline: Arc::clone(&pipeline),
    });

    Service {
        router,
        catalog,
        model,
        pipeline,
    }
}

fn app_with(model: FakeLanguageModel, count: u64) -> Router {
    service(model, count).router
}

fn app(count: u64) -> Router {
    app_with(FakeLanguageModel::replying(DRAFT), count)
}

fn create_request(account: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/create-playlist")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(account) = account {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", account));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn body(prompt: &str) -> Value {
    json!({ "prompt": prompt, "accessToken": VALID_TOKEN, "refreshToken": "refresh-1" })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(0), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_playlist() {
    let (status, json) = send(app(0), create_request(Some("acct-1"), body("desert blues"))).await;

    assert_eq!(status, StatusCode::OK);
    let reply: CreatePlaylistReply = serde_json::from_value(json).unwrap();
    assert_eq!(reply.playlist_name, "Desert Blues");
    assert_eq!(reply.track_count, 2);
    assert!(reply.playlist_url.starts_with("https://open.spotify.com/playlist/"));
}

#[tokio::test]
async fn test_missing_session() {
    let (status, json) = send(app(0), create_request(None, body("desert blues"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "unauthorized");
}

#[tokio::test]
async fn test_quota_exceeded() {
    let (status, json) = send(app(3), create_request(Some("acct-1"), body("desert blues"))).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["kind"], "quota_exceeded");
    assert!(json["error"].as_str().unwrap().contains("free playlists"));
    assert!(json.get("detail").is_none());
}

#[tokio::test]
async fn test_blank_prompt() {
    let (status, json) = send(app(0), create_request(Some("acct-1"), body(" "))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_prompt");
}

#[tokio::test]
async fn test_unknown_account() {
    let (status, json) = send(app(0), create_request(Some("acct-9"), body("desert blues"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "account_not_found");
}

#[tokio::test]
async fn test_generation_failure_hides_credentials() {
    let model = FakeLanguageModel::failing(LlmError::Network("connection reset".to_string()));
    let (status, json) = send(
        app_with(model, 0),
        create_request(Some("acct-1"), body("desert blues")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "generation_error");
    assert!(json["detail"].as_str().unwrap().contains("connection reset"));

    let text = json.to_string();
    assert!(!text.contains(VALID_TOKEN));
    assert!(!text.contains("refresh-1"));
}

#[tokio::test]
async fn test_body_without_prompt() {
    let (status, json) = send(
        app(0),
        create_request(Some("acct-1"), json!({ "accessToken": VALID_TOKEN })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_request");
    assert!(json["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn test_body_that_is_not_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/create-playlist")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer acct-1")
        .body(Body::from("prompt=jazz"))
        .unwrap();
    let (status, json) = send(app(0), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_request");
}

#[tokio::test]
async fn test_missing_session_wins_over_bad_body() {
    let (status, json) = send(app(0), create_request(None, json!({}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "unauthorized");
}

#[tokio::test]
async fn test_credential_near_expiry_is_refreshed_before_searching() {
    let svc = service(FakeLanguageModel::replying(DRAFT), 0);
    // The service no longer accepts the inbound token, so any search made
    // with it would be rejected and counted
    let body = json!({
        "prompt": "desert blues",
        "accessToken": "expiring-token",
        "refreshToken": "refresh-1",
        "expiresIn": 60,
    });

    let (status, json) = send(svc.router, create_request(Some("acct-1"), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trackCount"], 2);
    assert_eq!(FakeCatalog::count(&svc.catalog.refresh_calls), 1);
    assert_eq!(FakeCatalog::count(&svc.catalog.search_calls), 3);
}

#[tokio::test]
async fn test_credential_far_from_expiry_is_used_as_is() {
    let svc = service(FakeLanguageModel::replying(DRAFT), 0);
    let body = json!({
        "prompt": "desert blues",
        "accessToken": VALID_TOKEN,
        "refreshToken": "refresh-1",
        "expiresIn": 3600,
    });

    let (status, _) = send(svc.router, create_request(Some("acct-1"), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(FakeCatalog::count(&svc.catalog.refresh_calls), 0);
    assert_eq!(FakeCatalog::count(&svc.catalog.search_calls), 3);
}

#[tokio::test]
async fn test_abandoned_request_cancels_run() {
    let model = FakeLanguageModel::replying(DRAFT).with_delay(Duration::from_millis(200));
    let svc = service(model, 2);

    let pending = svc
        .router
        .oneshot(create_request(Some("acct-1"), body("desert blues")));
    // The client gives up while the model is still drafting
    let abandoned = tokio::time::timeout(Duration::from_millis(50), pending).await;
    assert!(abandoned.is_err());

    // Let the run reach its next checkpoint
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(svc.model.call_count(), 1);
    assert_eq!(svc.catalog.total_calls(), 0);
    assert!(svc.catalog.playlists().is_empty());

    // The account's last free slot was given back
    let decision = svc.pipeline.gate().check("acct-1").await.unwrap();
    assert!(decision.is_allowed());
}
