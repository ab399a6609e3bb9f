// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tour guide page tree: bio, service area, and assigned reservations.
//!
//! A guide is identified by their profile document ID everywhere; the
//! auth UID only serves to find that profile.

use axum::{
    extract::{Path, Query, State},
    routing::{any, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{GuideLocation, Location, Reservation, ReservationStatus, Role, User};
use crate::routing::CurrentUser;
use crate::services::aggregate::{ReservationFilter, ReservationResolver, ReservationView};
use crate::time_utils::now_rfc3339;
use crate::validation::{validate_gender, validate_guide_type};
use crate::AppState;

/// Tour guide routes. The role gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tour-guide", get(home))
        .route("/tour-guide/bio", get(get_bio).put(update_bio))
        .route(
            "/tour-guide/locations",
            get(get_service_area).put(set_service_area),
        )
        .route("/tour-guide/reservations", get(list_reservations))
        .route(
            "/tour-guide/reservations/{id}/status",
            put(update_reservation_status),
        )
        .route("/tour-guide/{*rest}", any(super::not_found))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GuideHome {
    user: User,
    pending_count: usize,
}

async fn home(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<GuideHome>> {
    let pending_count = state
        .db
        .reservations_for_guide(current.user_id())
        .await?
        .iter()
        .filter(|r| r.status() == Some(ReservationStatus::Pending))
        .count();

    Ok(Json(GuideHome {
        user: current.user,
        pending_count,
    }))
}

// ─── Bio ─────────────────────────────────────────────────────

async fn get_bio(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

/// Guide profile form. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuideBioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_guide_type"))]
    pub guide_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

async fn update_bio(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<GuideBioRequest>,
) -> Result<Json<User>> {
    body.validate()?;

    state.db.update_user(current.user_id(), &body).await?;
    tracing::info!(user_id = %current.user_id(), "Guide bio updated");

    let updated = state
        .db
        .get_user(current.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", current.user_id())))?;
    Ok(Json(updated))
}

// ─── Service area ────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAreaResponse {
    pub locations: Vec<Location>,
    pub selected_locations: Vec<String>,
}

async fn get_service_area(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ServiceAreaResponse>> {
    let (locations, saved) = tokio::try_join!(
        state.db.list_locations(),
        state.db.get_guide_location(current.user_id()),
    )?;

    Ok(Json(ServiceAreaResponse {
        locations,
        selected_locations: saved.map(|g| g.selected_locations).unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAreaRequest {
    pub selected_locations: Vec<String>,
}

/// Replace the guide's service area wholesale.
async fn set_service_area(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ServiceAreaRequest>,
) -> Result<Json<GuideLocation>> {
    let mut selected_locations = Vec::with_capacity(body.selected_locations.len());
    for id in body.selected_locations {
        if !id.is_empty() && !selected_locations.contains(&id) {
            selected_locations.push(id);
        }
    }

    let record = GuideLocation {
        user_id: current.user_id().to_string(),
        selected_locations,
        timestamp: now_rfc3339(),
    };
    state.db.set_guide_location(&record).await?;

    tracing::info!(
        user_id = %record.user_id,
        count = record.selected_locations.len(),
        "Guide service area saved"
    );
    Ok(Json(record))
}

// ─── Reservations ────────────────────────────────────────────

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<ReservationFilter>,
) -> Result<Json<Vec<ReservationView>>> {
    let reservations = state.db.reservations_for_guide(current.user_id()).await?;
    let views = ReservationResolver::new(state.db.clone(), Role::TourGuide)
        .resolve_all(reservations)
        .await?;
    Ok(Json(filter.apply(views, Role::TourGuide)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ReservationStatus,
}

/// Approve, complete, or cancel one of the guide's reservations.
async fn update_reservation_status(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(reservation_id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Reservation>> {
    let mut reservation = state
        .db
        .get_reservation(&reservation_id)
        .await?
        .filter(|r| r.guide_id == current.user_id())
        .ok_or_else(|| AppError::NotFound(format!("reservation {}", reservation_id)))?;

    let status = reservation.status().ok_or_else(|| {
        AppError::Conflict(format!("unknown reservation status: {}", reservation.status))
    })?;
    let next = status.transition(body.status, Role::TourGuide)?;

    state.db.set_reservation_status(&reservation_id, next).await?;
    reservation.status = next.as_str().to_string();
    Ok(Json(reservation))
}
