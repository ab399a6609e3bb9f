// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify cookie removal attributes on logout match the creation
//! attributes for localhost and production-style domains.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use local_lingua::config::Config;
use local_lingua::middleware::auth::{create_session_token, session_cookie};
use local_lingua::routing::Principal;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn logout(frontend_url: &str) -> Response {
    let (app, _) = common::create_test_app_with_frontend_url(frontend_url);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/logout")
            .header(header::COOKIE, "lingua_session=test")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let response = logout("http://localhost:5173").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "lingua_session");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=0"));
    assert!(!session.contains("Secure"));
    assert!(!session.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_domain_attributes() {
    let response = logout("https://locallingua.example").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "lingua_session");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=0"));
    assert!(session.contains("Secure"));
    assert!(!session.contains("Domain="));
}

#[test]
fn test_session_cookie_matches_removal_attributes() {
    let mut config = Config::test_default();
    config.frontend_url = "https://locallingua.example".to_string();

    let principal = Principal {
        uid: "uid-1".to_string(),
        email: "ana@example.com".to_string(),
    };
    let token = create_session_token(&principal, &config.jwt_signing_key).unwrap();
    let cookie = session_cookie(token, &config).to_string();

    assert!(cookie.starts_with("lingua_session="));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_session_exchange_rejects_garbage_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::request(
            "POST",
            "/session",
            None,
            Some(serde_json::json!({"idToken": "not-a-jwt"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&response).is_empty());
}
