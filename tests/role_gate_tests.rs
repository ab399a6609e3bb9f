// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role gate tests: every page tree admits only its own role.

use axum::http::{header, StatusCode};
use axum::response::Response;
use local_lingua::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, request, seed_user, session_cookie_for};

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_anonymous_redirected_to_login() {
    let (app, _) = create_test_app();

    for uri in ["/tourist", "/tour-guide/bio", "/admin/users", "/account"] {
        let response = app
            .clone()
            .oneshot(request("GET", uri, None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_session_token_is_anonymous() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request(
            "GET",
            "/tourist",
            Some("lingua_session=not-a-jwt"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_wrong_role_redirected_to_landing() {
    let (app, state) = create_test_app();
    let tourist = seed_user(&state.db, "Ana", Role::Tourist).await;
    let cookie = session_cookie_for(&state, &tourist);

    for uri in ["/admin", "/admin/anything/at/all", "/tour-guide/reservations"] {
        let response = app
            .clone()
            .oneshot(request("GET", uri, Some(&cookie), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/", "{uri}");
    }
}

#[tokio::test]
async fn test_signed_in_without_profile_redirected_to_landing() {
    let (app, state) = create_test_app();
    let ghost = local_lingua::models::User {
        uid: "uid-ghost".to_string(),
        email: "ghost@example.com".to_string(),
        ..Default::default()
    };
    let cookie = session_cookie_for(&state, &ghost);

    let response = app
        .oneshot(request("GET", "/account", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_matching_role_admitted() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let admin = seed_user(&state.db, "Root", Role::Admin).await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/tour-guide",
            Some(&session_cookie_for(&state, &guide)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            "GET",
            "/admin",
            Some(&session_cookie_for(&state, &admin)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_inside_own_tree_is_not_found() {
    let (app, state) = create_test_app();
    let admin = seed_user(&state.db, "Root", Role::Admin).await;

    let response = app
        .oneshot(request(
            "GET",
            "/admin/no/such/page",
            Some(&session_cookie_for(&state, &admin)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_landing_reports_home_for_role() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/", None, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["signedIn"], false);
    assert_eq!(body["home"], "/");

    let response = app
        .oneshot(request(
            "GET",
            "/",
            Some(&session_cookie_for(&state, &guide)),
            None,
        ))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["signedIn"], true);
    assert_eq!(body["role"], "tour guide");
    assert_eq!(body["home"], "/tour-guide");
}
