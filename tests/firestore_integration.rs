// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: FIRESTORE_EMULATOR_HOST=127.0.0.1:8080 cargo test --test firestore_integration
//!
//! Every test writes documents under fresh IDs, so runs do not interfere.

use local_lingua::models::{GuideLocation, Location, Reservation, ReservationStatus, User};
use local_lingua::services::aggregate::ReservationResolver;

mod common;
use common::test_db;

/// Unique suffix for test isolation.
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_create_and_lookup() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let user = User {
        uid: format!("uid-{suffix}"),
        email: format!("{suffix}@example.com"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role: "tourist".to_string(),
        ..Default::default()
    };

    let id = db.create_user(&user).await.unwrap();
    assert_eq!(id.len(), 20);

    let by_id = db.get_user(&id).await.unwrap().expect("user by id");
    assert_eq!(by_id.id, id);
    assert_eq!(by_id.first_name, "Test");

    let by_uid = db.find_user_by_uid(&user.uid).await.unwrap().expect("user by uid");
    assert_eq!(by_uid.id, id);

    let by_email = db
        .find_user_by_email(&user.email)
        .await
        .unwrap()
        .expect("user by email");
    assert_eq!(by_email.id, id);

    println!("✓ User created and found: id={}", id);
}

#[tokio::test]
async fn test_user_merge_preserves_other_fields() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let id = db
        .create_user(&User {
            uid: format!("uid-{suffix}"),
            email: format!("{suffix}@example.com"),
            first_name: "Old".to_string(),
            role: "tour guide".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    db.update_user(&id, &serde_json::json!({ "bio": "Cebu native", "rate": "1200" }))
        .await
        .unwrap();

    let fetched = db.get_user(&id).await.unwrap().unwrap();
    assert_eq!(fetched.first_name, "Old");
    assert_eq!(fetched.role, "tour guide");
    assert_eq!(fetched.bio.as_deref(), Some("Cebu native"));
    assert_eq!(fetched.rate.as_deref(), Some("1200"));
}

// ═══════════════════════════════════════════════════════════════════════════
// GUIDE LOCATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_guide_locations_query_by_location() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let location_id = format!("loc-{suffix}");
    let guide_id = format!("guide-{suffix}");

    db.set_guide_location(&GuideLocation {
        user_id: guide_id.clone(),
        selected_locations: vec![location_id.clone(), "elsewhere".to_string()],
        timestamp: "2025-01-01T00:00:00Z".to_string(),
    })
    .await
    .unwrap();

    let found = db.guide_locations_for(&location_id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user_id, guide_id);

    let saved = db.get_guide_location(&guide_id).await.unwrap().unwrap();
    assert_eq!(saved.selected_locations.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// RESERVATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_reservation_lifecycle_and_view() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();

    let location_id = db
        .create_location(&Location {
            name: format!("Bohol {suffix}"),
            ..Default::default()
        })
        .await
        .unwrap();

    let tourist_id = format!("tourist-{suffix}");
    let reservation_id = db
        .create_reservation(&Reservation {
            user_id: tourist_id.clone(),
            guide_id: format!("missing-guide-{suffix}"),
            location_id: location_id.clone(),
            activity_ids: vec![format!("missing-activity-{suffix}")],
            date: "2025-07-01".to_string(),
            tour_option: Some("Tour Guide Only".to_string()),
            status: ReservationStatus::Pending.as_str().to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mine = db.reservations_for_tourist(&tourist_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, reservation_id);

    db.set_reservation_status(&reservation_id, ReservationStatus::Approved)
        .await
        .unwrap();
    let updated = db.get_reservation(&reservation_id).await.unwrap().unwrap();
    assert_eq!(updated.status(), Some(ReservationStatus::Approved));
    assert_eq!(updated.date, "2025-07-01");

    let view = ReservationResolver::new(db.clone(), local_lingua::models::Role::Admin)
        .resolve(updated)
        .await
        .unwrap();
    assert_eq!(view.location_name, format!("Bohol {suffix}"));
    assert_eq!(view.activity_names, ["Unknown Activity"]);
    assert!(!view.guide.found);

    println!("✓ Reservation lifecycle verified: id={}", reservation_id);
}
