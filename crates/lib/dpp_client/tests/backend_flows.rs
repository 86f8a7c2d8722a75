//! Integration tests — run an in-process fake backend on an ephemeral
//! listener and drive the client flows end to end: cache fallback, route
//! guard round trips, and magic-link verification.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::tempdir;

use dpp_client::auth::{VerifyState, run_magic_login};
use dpp_client::cache::SnapshotCache;
use dpp_client::guard::check_access;
use dpp_client::viewer::{Connectivity, DataSource, PassportViewer};
use dpp_client::{ApiClient, ApiError, SessionStore, SessionTokens};

/// Shared fake-backend state.
#[derive(Clone)]
struct TestState {
    passports: Arc<Mutex<HashMap<String, Value>>>,
    fail_fetch: Arc<AtomicBool>,
    me_calls: Arc<AtomicUsize>,
}

impl TestState {
    fn new() -> Self {
        Self {
            passports: Arc::new(Mutex::new(HashMap::new())),
            fail_fetch: Arc::new(AtomicBool::new(false)),
            me_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn insert_passport(&self, id: &str, doc: Value) {
        self.passports.lock().unwrap().insert(id.to_string(), doc);
    }
}

async fn get_passport(
    State(state): State<TestState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if state.fail_fetch.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "backend unavailable"})),
        );
    }
    match state.passports.lock().unwrap().get(&id) {
        Some(doc) => (StatusCode::OK, Json(doc.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Not found."})),
        ),
    }
}

async fn me(State(state): State<TestState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer valid-token");
    if authorized {
        (
            StatusCode::OK,
            Json(json!({"id": 1, "email": "co@example.com", "username": "co"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token"})),
        )
    }
}

async fn verify_magic_link(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["token"] == json!("good-token") {
        (
            StatusCode::OK,
            Json(json!({"access": "access-1", "refresh": "refresh-1"})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "This login link is invalid or expired."})),
        )
    }
}

/// Bind the fake backend on an ephemeral port, returning its base URL.
async fn spawn_backend(state: TestState) -> String {
    let router = Router::new()
        .route("/api/passports/{id}/", get(get_passport))
        .route("/api/users/me/", get(me))
        .route("/api/users/magic-link/verify/", post(verify_magic_link))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn sample_passport(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Shoe",
        "qr_code": "Q1",
        "sustainability_data": {
            "carbon_footprint": 12.5,
            "recyclable": true,
            "materials": ["steel", "plastic"]
        },
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z"
    })
}

// ---------------------------------------------------------------------------
// Passport cache/view
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_fetch_caches_the_exact_document() {
    let state = TestState::new();
    state.insert_passport("abc", sample_passport("abc"));
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let cache = SnapshotCache::new(dir.path());
    let viewer = PassportViewer::new(&client, &cache);

    let view = viewer.load("abc", Connectivity::Online).await.unwrap();
    assert_eq!(view.source, DataSource::Live);
    assert!(!view.offline);
    assert_eq!(view.passport.name, "Shoe");

    // Cache round-trip: the snapshot equals the fetched document exactly.
    assert_eq!(cache.load("abc"), Some(view.passport));
}

#[tokio::test]
async fn failed_fetch_serves_snapshot_in_degraded_mode() {
    let state = TestState::new();
    state.insert_passport("abc", sample_passport("abc"));
    let fail = state.fail_fetch.clone();
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let cache = SnapshotCache::new(dir.path());
    let viewer = PassportViewer::new(&client, &cache);

    let live = viewer.load("abc", Connectivity::Online).await.unwrap();
    fail.store(true, Ordering::SeqCst);

    // Degraded read: cached document, banner forced on, no error surfaced,
    // regardless of what the platform reports about connectivity.
    let view = viewer.load("abc", Connectivity::Online).await.unwrap();
    assert_eq!(view.source, DataSource::Cached);
    assert!(view.offline);
    assert_eq!(view.passport, live.passport);
}

#[tokio::test]
async fn failed_fetch_without_snapshot_is_a_hard_error() {
    let state = TestState::new();
    state.fail_fetch.store(true, Ordering::SeqCst);
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let cache = SnapshotCache::new(dir.path());
    let viewer = PassportViewer::new(&client, &cache);

    let err = viewer.load("abc", Connectivity::Online).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 500, .. }));
    assert!(cache.load("abc").is_none());
}

#[tokio::test]
async fn live_data_with_offline_signal_still_shows_the_banner() {
    let state = TestState::new();
    state.insert_passport("abc", sample_passport("abc"));
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let cache = SnapshotCache::new(dir.path());
    let viewer = PassportViewer::new(&client, &cache);

    let view = viewer.load("abc", Connectivity::Offline).await.unwrap();
    assert_eq!(view.source, DataSource::Live);
    assert!(view.offline);
}

#[tokio::test]
async fn empty_sustainability_data_is_distinguishable_from_not_loaded() {
    let state = TestState::new();
    state.insert_passport(
        "abc",
        json!({
            "id": "abc",
            "name": "Shoe",
            "qr_code": "Q1",
            "sustainability_data": {},
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }),
    );
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let cache = SnapshotCache::new(dir.path());
    let viewer = PassportViewer::new(&client, &cache);

    let view = viewer.load("abc", Connectivity::Online).await.unwrap();
    // Renders the "no data available" notice, not the degraded banner.
    assert!(!view.passport.has_sustainability_data());
    assert!(!view.offline);
}

// ---------------------------------------------------------------------------
// Route guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guard_validates_a_good_session_with_one_round_trip() {
    let state = TestState::new();
    let me_calls = state.me_calls.clone();
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save(&SessionTokens {
            access_token: "valid-token".into(),
            refresh_token: "refresh".into(),
        })
        .unwrap();

    let access = check_access(&client, &store).await;
    assert!(access.is_authenticated());
    assert_eq!(me_calls.load(Ordering::SeqCst), 1);
    // Session survives a successful validation.
    assert!(store.load().is_some());
}

#[tokio::test]
async fn guard_purges_both_tokens_after_one_failed_validation() {
    let state = TestState::new();
    let me_calls = state.me_calls.clone();
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save(&SessionTokens {
            access_token: "stale-token".into(),
            refresh_token: "refresh".into(),
        })
        .unwrap();

    let access = check_access(&client, &store).await;
    assert!(!access.is_authenticated());
    // Exactly one validation call, then purge.
    assert_eq!(me_calls.load(Ordering::SeqCst), 1);
    assert!(store.load().is_none());
    assert!(client.bearer_token().is_none());
}

#[tokio::test]
async fn guard_classifies_absent_session_without_any_call() {
    let state = TestState::new();
    let me_calls = state.me_calls.clone();
    let base = spawn_backend(state).await;

    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let access = check_access(&client, &store).await;
    assert!(!access.is_authenticated());
    assert_eq!(me_calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Magic-link verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn magic_link_success_persists_tokens_and_authenticates_the_client() {
    let base = spawn_backend(TestState::new()).await;
    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let state = run_magic_login(&client, &store, "good-token").await;
    assert_eq!(state, VerifyState::Success);

    let tokens = store.load().expect("tokens persisted");
    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(tokens.refresh_token, "refresh-1");
    assert_eq!(client.bearer_token().as_deref(), Some("access-1"));
}

#[tokio::test]
async fn magic_link_failure_persists_nothing() {
    let base = spawn_backend(TestState::new()).await;
    let client = ApiClient::new(base.as_str()).unwrap();
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let state = run_magic_login(&client, &store, "expired-token").await;
    assert!(matches!(state, VerifyState::Error { .. }));
    assert!(store.load().is_none());
    assert!(client.bearer_token().is_none());
}
