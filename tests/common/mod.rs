// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use local_lingua::config::Config;
use local_lingua::db::FirestoreDb;
use local_lingua::middleware::auth::{create_session_token, SESSION_COOKIE};
use local_lingua::models::{Role, User};
use local_lingua::routes::create_router;
use local_lingua::routing::Principal;
use local_lingua::services::{IdTokenVerifier, IdentityClient, StorageService};
use local_lingua::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Same as [`create_test_app`], with a different frontend URL.
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = FirestoreDb::new_in_memory();
    let storage = StorageService::new_in_memory(&config.storage_bucket);
    let identity = IdentityClient::new(&config);
    let id_token_verifier =
        Arc::new(IdTokenVerifier::new(&config).expect("Failed to build ID token verifier"));

    let state = Arc::new(AppState {
        config,
        db,
        identity,
        id_token_verifier,
        storage,
    });

    (create_router(state.clone()), state)
}

/// Store a user with `role` and return it with its document ID set.
#[allow(dead_code)]
pub async fn seed_user(db: &FirestoreDb, first_name: &str, role: Role) -> User {
    let mut user = User {
        uid: format!("uid-{}", first_name.to_lowercase()),
        email: format!("{}@example.com", first_name.to_lowercase()),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        contact_number: "09170000000".to_string(),
        role: role.as_str().to_string(),
        ..Default::default()
    };
    user.id = db.create_user(&user).await.expect("create user");
    user
}

/// `Cookie:` header value carrying a session for `user`.
#[allow(dead_code)]
pub fn session_cookie_for(state: &AppState, user: &User) -> String {
    let principal = Principal {
        uid: user.uid.clone(),
        email: user.email.clone(),
    };
    let token = create_session_token(&principal, &state.config.jwt_signing_key)
        .expect("create session token");
    format!("{SESSION_COOKIE}={token}")
}

/// Request with an optional session cookie and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
