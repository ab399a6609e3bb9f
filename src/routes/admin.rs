// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin page tree: catalog management, user list, and all reservations.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{any, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::{image_content_type, ImageUploadQuery, UploadResponse};
use crate::error::{AppError, Result};
use crate::models::location::name_matches;
use crate::models::{Activity, Location, Role, User};
use crate::routing::CurrentUser;
use crate::services::aggregate::{ReservationFilter, ReservationResolver, ReservationView};
use crate::services::storage::ObjectFolder;
use crate::AppState;

/// Admin routes. The role gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(home))
        .route("/admin/locations", get(list_locations).post(create_location))
        .route(
            "/admin/locations/{id}",
            get(get_location).put(update_location),
        )
        .route("/admin/locations/{id}/image", put(upload_location_image))
        .route(
            "/admin/activities",
            get(list_activities).post(create_activity),
        )
        .route(
            "/admin/activities/{id}",
            get(get_activity).put(update_activity),
        )
        .route("/admin/activities/{id}/image", put(upload_activity_image))
        .route("/admin/users", get(list_users))
        .route("/admin/reservations", get(list_reservations))
        .route("/admin/{*rest}", any(super::not_found))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminHome {
    user: User,
    location_count: usize,
    activity_count: usize,
    user_count: usize,
    reservation_count: usize,
}

async fn home(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<AdminHome>> {
    let (locations, activities, users, reservations) = tokio::try_join!(
        state.db.list_locations(),
        state.db.list_activities(),
        state.db.list_users(),
        state.db.list_reservations(),
    )?;

    Ok(Json(AdminHome {
        user: current.user,
        location_count: locations.len(),
        activity_count: activities.len(),
        user_count: users
            .iter()
            .filter(|u| u.role() != Some(Role::Admin))
            .count(),
        reservation_count: reservations.len(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// ─── Locations ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Activity document IDs
    #[serde(default)]
    pub activities: Vec<String>,
}

/// Location edit form. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Location>>> {
    let locations = state
        .db
        .list_locations()
        .await?
        .into_iter()
        .filter(|l| name_matches(&l.name, query.search.as_deref()))
        .collect();
    Ok(Json(locations))
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>)> {
    body.validate()?;

    let mut location = Location {
        id: String::new(),
        name: body.name.trim().to_string(),
        description: body.description,
        image_url: None,
        activities: body.activities,
    };
    location.id = state.db.create_location(&location).await?;

    tracing::info!(location_id = %location.id, name = %location.name, "Location created");
    Ok((StatusCode::CREATED, Json(location)))
}

async fn existing_location(state: &AppState, location_id: &str) -> Result<Location> {
    state
        .db
        .get_location(location_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("location {}", location_id)))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
) -> Result<Json<Location>> {
    Ok(Json(existing_location(&state, &location_id).await?))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Json(body): Json<UpdateLocationRequest>,
) -> Result<Json<Location>> {
    body.validate()?;
    existing_location(&state, &location_id).await?;

    state.db.update_location(&location_id, &body).await?;
    tracing::info!(location_id = %location_id, "Location updated");

    Ok(Json(existing_location(&state, &location_id).await?))
}

async fn upload_location_image(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Query(query): Query<ImageUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = image_content_type(&headers, &body)?;
    existing_location(&state, &location_id).await?;

    let url = state
        .storage
        .upload(
            ObjectFolder::Locations,
            &location_id,
            &query.filename,
            &content_type,
            body.to_vec(),
        )
        .await?;
    state
        .db
        .update_location(&location_id, &serde_json::json!({ "imageUrl": url }))
        .await?;

    Ok(Json(UploadResponse { url }))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Activity edit form. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Activity>>> {
    let activities = state
        .db
        .list_activities()
        .await?
        .into_iter()
        .filter(|a| name_matches(&a.name, query.search.as_deref()))
        .collect();
    Ok(Json(activities))
}

async fn create_activity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>)> {
    body.validate()?;

    let mut activity = Activity {
        id: String::new(),
        name: body.name.trim().to_string(),
        description: body.description,
        image_url: None,
    };
    activity.id = state.db.create_activity(&activity).await?;

    tracing::info!(activity_id = %activity.id, name = %activity.name, "Activity created");
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn existing_activity(state: &AppState, activity_id: &str) -> Result<Activity> {
    state
        .db
        .get_activity(activity_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("activity {}", activity_id)))
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<String>,
) -> Result<Json<Activity>> {
    Ok(Json(existing_activity(&state, &activity_id).await?))
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<String>,
    Json(body): Json<UpdateActivityRequest>,
) -> Result<Json<Activity>> {
    body.validate()?;
    existing_activity(&state, &activity_id).await?;

    state.db.update_activity(&activity_id, &body).await?;
    tracing::info!(activity_id = %activity_id, "Activity updated");

    Ok(Json(existing_activity(&state, &activity_id).await?))
}

async fn upload_activity_image(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<String>,
    Query(query): Query<ImageUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = image_content_type(&headers, &body)?;
    existing_activity(&state, &activity_id).await?;

    let url = state
        .storage
        .upload(
            ObjectFolder::Activities,
            &activity_id,
            &query.filename,
            &content_type,
            body.to_vec(),
        )
        .await?;
    state
        .db
        .update_activity(&activity_id, &serde_json::json!({ "imageUrl": url }))
        .await?;

    Ok(Json(UploadResponse { url }))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    /// Stored role string, e.g. `tour guide`
    pub role: Option<String>,
}

/// Every non-admin account, optionally filtered.
pub fn visible_users(users: Vec<User>, query: &UserListQuery) -> Vec<User> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let role = query.role.as_deref().map(str::trim).filter(|r| !r.is_empty());

    users
        .into_iter()
        .filter(|u| u.role() != Some(Role::Admin))
        .filter(|u| search.is_none_or(|s| u.matches_search(s)))
        .filter(|u| role.is_none_or(|r| u.role == r))
        .collect()
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>> {
    let users = state.db.list_users().await?;
    Ok(Json(visible_users(users, &query)))
}

// ─── Reservations ────────────────────────────────────────────

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReservationFilter>,
) -> Result<Json<Vec<ReservationView>>> {
    let reservations = state.db.list_reservations().await?;
    let views = ReservationResolver::new(state.db.clone(), Role::Admin)
        .resolve_all(reservations)
        .await?;
    Ok(Json(filter.apply(views, Role::Admin)))
}
