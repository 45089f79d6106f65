//! End-to-end pipeline scenarios, exercised through dispatch without a
//! network socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use uuid::Uuid;

use palisade_config::PalisadeConfig;
use palisade_middleware::{BoxFuture, Request, Response};
use palisade_server::{
    dispatch, Account, AccountStore, AccountUpdate, AppState, MemoryAccountStore, NewAccount,
    StoreError,
};

/// Wraps the memory store to observe whether handlers ran.
#[derive(Default)]
struct CountingStore {
    inner: MemoryAccountStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccountStore for CountingStore {
    fn create(&self, new: NewAccount) -> BoxFuture<'_, Result<Account, StoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(new)
    }

    fn get(&self, id: Uuid) -> BoxFuture<'_, Result<Account, StoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id)
    }

    fn list(&self) -> BoxFuture<'_, Vec<Account>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list()
    }

    fn update(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> BoxFuture<'_, Result<Account, StoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, update)
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'_, Result<Uuid, StoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id)
    }
}

fn test_state(config: PalisadeConfig) -> (Arc<AppState>, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let state = AppState::builder(config)
        .store(store.clone())
        .build()
        .expect("state builds");
    (state, store)
}

fn request(method: Method, path: &str, body: Option<Value>, token: Option<&str>) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    if body.is_some() {
        builder = builder.header(http::header::CONTENT_TYPE, "application/json");
    }
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let bytes = body.map_or_else(Bytes::new, |b| Bytes::from(b.to_string()));
    builder.body(Full::new(bytes)).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(state: &Arc<AppState>, req: Request) -> (StatusCode, Value) {
    send_from(state, "198.51.100.1", req).await
}

async fn send_from(state: &Arc<AppState>, ip: &str, req: Request) -> (StatusCode, Value) {
    let response = dispatch(state.clone(), ip.to_string(), req).await;
    let status = response.status();
    let body = body_json(response).await;
    assert_eq!(
        u16::from(status),
        body["code"].as_u64().unwrap() as u16,
        "transport status must equal envelope code"
    );
    (status, body)
}

fn signup_body(email: &str) -> Value {
    json!({ "email": email, "password": "longenough", "fullName": "Ada Lovelace" })
}

#[tokio::test]
async fn signup_with_invalid_body_is_rejected_before_any_persistence() {
    let (state, store) = test_state(PalisadeConfig::default());

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({ "email": "bad", "password": "x" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body:"));
    assert_eq!(store.calls(), 0, "no account creation may be attempted");
}

#[tokio::test]
async fn protected_route_without_token_is_401_and_handler_never_runs() {
    let (state, store) = test_state(PalisadeConfig::default());

    let (status, body) = send(&state, request(Method::GET, "/api/me", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(store.calls(), 0, "handler must never be invoked");
}

#[tokio::test]
async fn signup_login_me_happy_path() {
    let (state, _store) = test_state(PalisadeConfig::default());

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("ada@example.com")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signup successful");
    let account_id = body["data"]["accountId"].as_str().unwrap().to_string();

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "longenough" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send(&state, request(Method::GET, "/api/me", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], account_id);
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn login_with_wrong_password_is_401_with_stable_error_code() {
    let (state, _store) = test_state(PalisadeConfig::default());

    send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("ada@example.com")),
            None,
        ),
    )
    .await;

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn auth_routes_use_the_strict_budget_per_ip() {
    let mut config = PalisadeConfig::default();
    config.rate_limit.auth.max_requests = 2;
    let (state, _store) = test_state(config);

    let login = || {
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "a@example.com", "password": "x" })),
            None,
        )
    };

    let (first, _) = send_from(&state, "203.0.113.5", login()).await;
    let (second, _) = send_from(&state, "203.0.113.5", login()).await;
    assert_ne!(first, StatusCode::TOO_MANY_REQUESTS);
    assert_ne!(second, StatusCode::TOO_MANY_REQUESTS);

    let response = dispatch(state.clone(), "203.0.113.5".to_string(), login()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "2");
    assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");
    let reset = response
        .headers()
        .get("X-RateLimit-Reset")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());
    let body = body_json(response).await;
    assert_eq!(body["error"], "TOO_MANY_REQUESTS");

    // A different IP still has budget.
    let (status, _) = send_from(&state, "203.0.113.99", login()).await;
    assert_ne!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unknown_route_is_an_enveloped_404() {
    let (state, _store) = test_state(PalisadeConfig::default());

    let (status, body) = send(&state, request(Method::GET, "/definitely/not/here", None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "The requested resource was not found");
}

#[tokio::test]
async fn responses_carry_security_and_rate_limit_headers() {
    let (state, _store) = test_state(PalisadeConfig::default());

    let response = dispatch(
        state.clone(),
        "198.51.100.1".to_string(),
        request(Method::GET, "/api", None, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "100");
    assert!(response.headers().contains_key("X-RateLimit-Remaining"));
}

#[tokio::test]
async fn preflight_options_short_circuits_with_cors_headers() {
    let (state, _store) = test_state(PalisadeConfig::default());

    let req = http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/users")
        .header(http::header::ORIGIN, "http://localhost:3001")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let response = dispatch(state.clone(), "198.51.100.1".to_string(), req).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .unwrap(),
        "http://localhost:3001"
    );
}

#[tokio::test]
async fn user_crud_round_trip() {
    let (state, _store) = test_state(PalisadeConfig::default());

    // Register and log in to obtain a token.
    send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("crud@example.com")),
            None,
        ),
    )
    .await;
    let (_, login) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "crud@example.com", "password": "longenough" })),
            None,
        ),
    )
    .await;
    let token = login["data"]["accessToken"].as_str().unwrap().to_string();
    let id = login["data"]["user"]["id"].as_str().unwrap().to_string();

    // Read.
    let (status, body) = send(
        &state,
        request(Method::GET, &format!("/api/users/{id}"), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "crud@example.com");

    // Update.
    let (status, body) = send(
        &state,
        request(
            Method::PATCH,
            &format!("/api/users/{id}"),
            Some(json!({ "fullName": "Renamed" })),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["fullName"], "Renamed");

    // List shows the account, with coerced pagination.
    let (status, body) = send(
        &state,
        request(Method::GET, "/api/users?page=1&limit=10", None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["limit"], 10);

    // Delete, then reads miss.
    let (status, _) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/users/{id}"),
            None,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &state,
        request(Method::GET, &format!("/api/users/{id}"), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "Account not found");
}

#[tokio::test]
async fn malformed_user_id_is_rejected_by_validation() {
    let (state, store) = test_state(PalisadeConfig::default());

    send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("v@example.com")),
            None,
        ),
    )
    .await;
    let (_, login) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "v@example.com", "password": "longenough" })),
            None,
        ),
    )
    .await;
    let token = login["data"]["accessToken"].as_str().unwrap().to_string();
    let calls_before = store.calls();

    let (status, body) = send(
        &state,
        request(Method::GET, "/api/users/not-a-uuid", None, Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request params:"));
    assert_eq!(store.calls(), calls_before, "handler must not run");
}

#[tokio::test]
async fn duplicate_signup_email_yields_conflict_from_store() {
    let (state, _store) = test_state(PalisadeConfig::default());

    let (status, _) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("dup@example.com")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Same email again: the identity service rejects it before the store.
    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(signup_body("dup@example.com")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unable to sign up");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_burst_from_one_ip_never_overshoots_the_ceiling() {
    let mut config = PalisadeConfig::default();
    config.rate_limit.standard.max_requests = 50;
    let (state, _store) = test_state(config);

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let response = dispatch(
                state,
                "203.0.113.77".to_string(),
                request(Method::GET, "/api", None, None),
            )
            .await;
            response.status() != StatusCode::TOO_MANY_REQUESTS
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 50);
}
