// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use meal_tracker::config::Config;
use meal_tracker::routes::create_router;
use meal_tracker::services::push_worker::{self, NotifierKind};
use meal_tracker::services::session::{create_session_jwt, SESSION_COOKIE};
use meal_tracker::services::{
    GoogleIdTokenVerifier, LocalStore, Notifier, Session, SessionUser,
};
use meal_tracker::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Key the fake Google token endpoint signs ID tokens with.
pub const TEST_OIDC_KEY: &[u8] = b"integration-oidc-key";
pub const TEST_OIDC_KID: &str = "test-kid";

/// One request seen by the fake meal API.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub cache_control: Option<String>,
    pub body: String,
}

/// Mutable behaviour of the fake meal API and Google token endpoint.
pub struct FakeState {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub users: Mutex<Vec<Value>>,
    pub schedule: Mutex<Value>,
    pub register_response: Mutex<(StatusCode, Value)>,
    pub fail_reset: AtomicBool,
    pub fail_schedule: AtomicBool,
    pub fail_actions: AtomicBool,
    pub unauthorized: AtomicBool,
    pub client_id: String,
}

/// Fake meal API plus Google token endpoint on a loopback port.
#[derive(Clone)]
pub struct FakeBackend {
    pub url: String,
    pub state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests for `method path`.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn set_register_response(&self, status: StatusCode, body: Value) {
        *self.state.register_response.lock().unwrap() = (status, body);
    }

    pub fn set_fail_reset(&self, fail: bool) {
        self.state.fail_reset.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.state.fail_schedule.store(fail, Ordering::SeqCst);
    }

    /// Make the housemate actions answer 500.
    pub fn set_fail_actions(&self, fail: bool) {
        self.state.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.state.unauthorized.store(unauthorized, Ordering::SeqCst);
    }

    pub fn set_users(&self, users: Vec<Value>) {
        *self.state.users.lock().unwrap() = users;
    }
}

pub fn default_users() -> Vec<Value> {
    vec![
        json!({
            "_id": "u1",
            "name": "Alice",
            "firebaseUid": "uid-alice",
            "email": "alice@example.com",
            "hasEaten": false,
            "isAway": false,
            "missedMealsCount": 1
        }),
        json!({
            "_id": "u2",
            "name": "Bob",
            "firebaseUid": "uid-bob",
            "hasEaten": true,
            "lastEatenAt": "2026-10-19T12:30:00Z",
            "isAway": false,
            "missedMealsCount": 3
        }),
        json!({
            "_id": "u3",
            "name": "Cy",
            "firebaseUid": "uid-cy",
            "hasEaten": false,
            "isAway": true,
            "missedMealsCount": 7
        }),
    ]
}

/// Sign an ID token the test verifier accepts.
pub fn sign_id_token(client_id: &str, sub: &str, email: &str, name: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    let claims = json!({
        "iss": "https://accounts.google.com",
        "aud": client_id,
        "sub": sub,
        "exp": exp,
        "iat": exp - 3600,
        "email": email,
        "email_verified": true,
        "name": name,
    });
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_OIDC_KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(TEST_OIDC_KEY)).unwrap()
}

fn set_flag(users: &mut [Value], index: usize, field: &str, value: Value) {
    if let Some(user) = users.get_mut(index).and_then(Value::as_object_mut) {
        user.insert(field.to_string(), value);
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let body = String::from_utf8_lossy(&body).to_string();
    let path = uri.path().to_string();

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: header("authorization"),
        cache_control: header("cache-control"),
        body: body.clone(),
    });

    if path == "/token" {
        if body.contains("code=bad") || body.contains("refresh_token=revoked") {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})))
                .into_response();
        }
        let id_token = sign_id_token(&state.client_id, "uid-alice", "alice@example.com", "Alice");
        return Json(json!({
            "id_token": id_token,
            "refresh_token": "refresh-1",
            "access_token": "unused",
            "expires_in": 3600
        }))
        .into_response();
    }

    if state.unauthorized.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"})))
            .into_response();
    }

    let is_action = matches!(
        path.as_str(),
        "/api/users/mark-eaten" | "/api/users/toggle-away" | "/api/report-food-finished"
    );
    if is_action && state.fail_actions.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "action failed").into_response();
    }

    match (method.as_str(), path.as_str()) {
        ("GET", "/api/users") => Json(Value::Array(state.users.lock().unwrap().clone()))
            .into_response(),
        ("GET", "/api/schedule") => {
            if state.fail_schedule.load(Ordering::SeqCst) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
            }
            Json(state.schedule.lock().unwrap().clone()).into_response()
        }
        ("PUT", "/api/schedule") => {
            if state.fail_schedule.load(Ordering::SeqCst) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
            }
            match serde_json::from_str::<Value>(&body) {
                Ok(schedule) => {
                    *state.schedule.lock().unwrap() = schedule.clone();
                    Json(schedule).into_response()
                }
                Err(_) => StatusCode::BAD_REQUEST.into_response(),
            }
        }
        ("POST", "/api/users/register") => {
            let (status, body) = state.register_response.lock().unwrap().clone();
            (status, Json(body)).into_response()
        }
        ("POST", "/api/users/mark-eaten") => {
            set_flag(&mut state.users.lock().unwrap(), 0, "hasEaten", json!(true));
            Json(json!({})).into_response()
        }
        ("POST", "/api/users/reset-eaten") => {
            if state.fail_reset.load(Ordering::SeqCst) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "reset failed").into_response();
            }
            let mut users = state.users.lock().unwrap();
            for i in 0..users.len() {
                set_flag(&mut users, i, "hasEaten", json!(false));
            }
            Json(json!({})).into_response()
        }
        ("POST", "/api/users/toggle-away") => {
            let mut users = state.users.lock().unwrap();
            let away = users
                .first()
                .and_then(|u| u.get("isAway"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            set_flag(&mut users, 0, "isAway", json!(!away));
            Json(json!({})).into_response()
        }
        ("POST", "/api/users/fcm-token") => Json(json!({})).into_response(),
        ("POST", "/api/report-food-finished") => {
            Json(json!({"message": "Notified 2 housemates"})).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start the fake meal API on a loopback port.
pub async fn spawn_fake_backend(client_id: &str) -> FakeBackend {
    let state = Arc::new(FakeState {
        requests: Mutex::new(Vec::new()),
        users: Mutex::new(default_users()),
        schedule: Mutex::new(json!({"lunchTime": "12:30", "dinnerTime": "19:30"})),
        register_response: Mutex::new((StatusCode::CREATED, json!({"_id": "u1"}))),
        fail_reset: AtomicBool::new(false),
        fail_schedule: AtomicBool::new(false),
        fail_actions: AtomicBool::new(false),
        unauthorized: AtomicBool::new(false),
        client_id: client_id.to_string(),
    });

    let router = Router::new().fallback(handle).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    FakeBackend {
        url: format!("http://{addr}"),
        state,
    }
}

/// Application wired to a fake backend.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub backend: FakeBackend,
    pub notifier: Notifier,
    pub store: Arc<LocalStore>,
    pub state_dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl TestApp {
    /// Insert a signed-in session for Alice without starting background work.
    pub fn sign_in(&self) -> (Arc<Session>, String) {
        let config = &self.state.config;
        let id_token =
            sign_id_token(&config.google_client_id, "uid-alice", "alice@example.com", "Alice");
        self.insert_session(id_token, Utc::now() + Duration::hours(1), Some("refresh-1"))
    }

    /// Insert a session whose ID token already expired, holding
    /// `refresh_token` (if any) to re-derive it.
    pub fn sign_in_expired(&self, refresh_token: Option<&str>) -> (Arc<Session>, String) {
        self.insert_session(
            "expired-id-token".to_string(),
            Utc::now() - Duration::minutes(1),
            refresh_token,
        )
    }

    fn insert_session(
        &self,
        id_token: String,
        expires_at: chrono::DateTime<Utc>,
        refresh_token: Option<&str>,
    ) -> (Arc<Session>, String) {
        let config = &self.state.config;
        let session = Session::new(
            SessionUser {
                uid: "uid-alice".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            id_token,
            expires_at,
            refresh_token.map(str::to_string),
        );
        let session = self.state.sessions.insert(session);
        let jwt = create_session_jwt(&session.id, &config.session_signing_key).unwrap();
        (session, format!("{SESSION_COOKIE}={jwt}"))
    }
}

/// Test config pointing at `backend`.
pub fn test_config(backend_url: &str) -> Config {
    let mut config = Config::test_default();
    config.api_url = backend_url.to_string();
    config.google_token_url = format!("{backend_url}/token");
    config
}

/// Create a test app backed by a fresh fake meal API.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let client_id = Config::test_default().google_client_id;
    let backend = spawn_fake_backend(&client_id).await;
    create_test_app_with(backend).await
}

#[allow(dead_code)]
pub async fn create_test_app_with(backend: FakeBackend) -> TestApp {
    let config = test_config(&backend.url);

    let verifier = Arc::new(
        GoogleIdTokenVerifier::new_with_static_key(
            &config,
            TEST_OIDC_KID,
            Algorithm::HS256,
            DecodingKey::from_secret(TEST_OIDC_KEY),
        )
        .unwrap(),
    );

    let state_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(state_dir.path()).await.unwrap());

    let notifier = Notifier::from_kind(NotifierKind::Memory);
    let (push, _handle) = push_worker::spawn(notifier.clone(), CancellationToken::new());

    let state = Arc::new(AppState::build(config, verifier, store.clone(), push).unwrap());

    TestApp {
        router: create_router(state.clone()),
        state,
        backend,
        notifier,
        store,
        state_dir,
    }
}

/// All `Set-Cookie` header values of a response.
#[allow(dead_code)]
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
