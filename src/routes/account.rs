// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes shared by every role (profile, password, photo).

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::{image_content_type, ImageUploadQuery, UploadResponse};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::routing::CurrentUser;
use crate::services::storage::ObjectFolder;
use crate::validation::validate_password;
use crate::AppState;

/// Account routes (any signed-in user with a profile).
/// The gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/account", get(get_profile).put(update_profile))
        .route("/account/password", post(change_password))
        .route("/account/photo", put(upload_photo))
}

async fn get_profile(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePatch {
    first_name: String,
    last_name: String,
    contact_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

/// Update the editable profile fields.
///
/// The sign-in email belongs to the auth provider: an `email` that differs
/// from it is ignored rather than written.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    body.validate()?;

    let email = body
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty() && *e == current.principal.email);

    let patch = ProfilePatch {
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        contact_number: body.contact_number.trim().to_string(),
        email,
    };
    state.db.update_user(current.user_id(), &patch).await?;

    tracing::info!(user_id = %current.user_id(), "Profile updated");

    let updated = state
        .db
        .get_user(current.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", current.user_id())))?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

/// Re-authenticate with the current password, then set the new one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    body.validate()?;

    let email = if current.principal.email.is_empty() {
        current.user.email.as_str()
    } else {
        current.principal.email.as_str()
    };

    let account = state
        .identity
        .sign_in(email, &body.current_password)
        .await?;
    state
        .identity
        .update_password(&account.id_token, &body.new_password)
        .await?;

    tracing::info!(user_id = %current.user_id(), "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a profile picture and store its URL on the profile.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ImageUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = image_content_type(&headers, &body)?;

    let url = state
        .storage
        .upload(
            ObjectFolder::Profiles,
            current.user_id(),
            &query.filename,
            &content_type,
            body.to_vec(),
        )
        .await?;

    state
        .db
        .update_user(
            current.user_id(),
            &serde_json::json!({ "profile_link": url }),
        )
        .await?;

    Ok(Json(UploadResponse { url }))
}
