// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reservation status changes by guides and tourists.

use axum::http::StatusCode;
use local_lingua::models::{Reservation, Role, User};
use local_lingua::AppState;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, json_body, request, seed_user, session_cookie_for};

async fn seed_reservation(state: &AppState, tourist: &User, guide: &User, status: &str) -> String {
    state
        .db
        .create_reservation(&Reservation {
            user_id: tourist.id.clone(),
            guide_id: guide.id.clone(),
            location_id: "loc".to_string(),
            activity_ids: vec!["act".to_string()],
            date: "2025-06-01".to_string(),
            status: status.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn stored_status(state: &AppState, id: &str) -> String {
    state
        .db
        .get_reservation(id)
        .await
        .unwrap()
        .expect("reservation exists")
        .status
}

#[tokio::test]
async fn test_guide_approves_then_completes() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let tourist = seed_user(&state.db, "Ana", Role::Tourist).await;
    let id = seed_reservation(&state, &tourist, &guide, "pending").await;
    let cookie = session_cookie_for(&state, &guide);
    let uri = format!("/tour-guide/reservations/{id}/status");

    let response = app
        .clone()
        .oneshot(request("PUT", &uri, Some(&cookie), Some(json!({"status": "Approved"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "Approved");
    assert_eq!(stored_status(&state, &id).await, "Approved");

    let response = app
        .oneshot(request("PUT", &uri, Some(&cookie), Some(json!({"status": "Completed"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stored_status(&state, &id).await, "Completed");
}

#[tokio::test]
async fn test_illegal_transition_conflicts() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let tourist = seed_user(&state.db, "Ana", Role::Tourist).await;
    let cookie = session_cookie_for(&state, &guide);

    for (from, to) in [("pending", "Completed"), ("Cancelled", "Approved"), ("", "Approved")] {
        let id = seed_reservation(&state, &tourist, &guide, from).await;
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/tour-guide/reservations/{id}/status"),
                Some(&cookie),
                Some(json!({ "status": to })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT, "{from} -> {to}");
        assert_eq!(stored_status(&state, &id).await, from);
    }
}

#[tokio::test]
async fn test_guide_cannot_touch_other_guides_reservation() {
    let (app, state) = create_test_app();
    let ben = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let dan = seed_user(&state.db, "Dan", Role::TourGuide).await;
    let tourist = seed_user(&state.db, "Ana", Role::Tourist).await;
    let id = seed_reservation(&state, &tourist, &ben, "pending").await;

    let response = app
        .oneshot(request(
            "PUT",
            &format!("/tour-guide/reservations/{id}/status"),
            Some(&session_cookie_for(&state, &dan)),
            Some(json!({"status": "Approved"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(stored_status(&state, &id).await, "pending");
}

#[tokio::test]
async fn test_tourist_cancels_pending_only() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let tourist = seed_user(&state.db, "Ana", Role::Tourist).await;
    let cookie = session_cookie_for(&state, &tourist);

    let pending = seed_reservation(&state, &tourist, &guide, "pending").await;
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/tourist/reservations/{pending}/cancel"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stored_status(&state, &pending).await, "Cancelled");

    let approved = seed_reservation(&state, &tourist, &guide, "Approved").await;
    let response = app
        .oneshot(request(
            "POST",
            &format!("/tourist/reservations/{approved}/cancel"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(stored_status(&state, &approved).await, "Approved");
}

#[tokio::test]
async fn test_tourist_cannot_cancel_someone_elses_reservation() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let ana = seed_user(&state.db, "Ana", Role::Tourist).await;
    let cara = seed_user(&state.db, "Cara", Role::Tourist).await;
    let id = seed_reservation(&state, &ana, &guide, "pending").await;

    let response = app
        .oneshot(request(
            "POST",
            &format!("/tourist/reservations/{id}/cancel"),
            Some(&session_cookie_for(&state, &cara)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(stored_status(&state, &id).await, "pending");
}

#[tokio::test]
async fn test_service_area_replaced_wholesale() {
    let (app, state) = create_test_app();
    let guide = seed_user(&state.db, "Ben", Role::TourGuide).await;
    let cookie = session_cookie_for(&state, &guide);

    for selection in [json!(["a", "b", "a"]), json!(["c"])] {
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/tour-guide/locations",
                Some(&cookie),
                Some(json!({ "selectedLocations": selection })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let saved = state.db.get_guide_location(&guide.id).await.unwrap().unwrap();
    assert_eq!(saved.selected_locations, ["c"]);
    assert_eq!(saved.user_id, guide.id);
}
