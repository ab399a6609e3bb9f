// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in, and session routes.
//!
//! Credentials are checked by the auth provider; this service only turns
//! a proven provider identity into a session cookie.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    authenticate, create_session_token, removal_cookie, resolve_session, session_cookie,
};
use crate::models::{Role, User};
use crate::routing::{home_path, Principal, SessionState};
use crate::validation::validate_password;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/session", post(exchange_id_token))
        .route("/forgot-password", post(forgot_password))
        .route("/logout", post(logout))
}

/// Where the client should go next, plus the profile if there is one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub role: Option<Role>,
    pub home: String,
    pub user: Option<User>,
}

impl SessionResponse {
    fn from_session(session: SessionState) -> Self {
        let home = home_path(&session).to_string();
        let role = session.role();
        match session {
            SessionState::Anonymous => Self {
                signed_in: false,
                role: None,
                home,
                user: None,
            },
            SessionState::Resolved { user, .. } => Self {
                signed_in: true,
                role,
                home,
                user,
            },
        }
    }
}

// ─── Landing ─────────────────────────────────────────────────

async fn landing(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Result<Json<SessionResponse>> {
    let principal = authenticate(&state.config, &jar, &headers);
    let session = resolve_session(&state.db, principal).await?;
    Ok(Json(SessionResponse::from_session(session)))
}

// ─── Sign-up ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[serde(default)]
    pub contact_number: String,
    /// `tourist` (default) or `tour guide`
    #[serde(default)]
    pub role: Option<Role>,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    body.validate()?;

    let role = body.role.unwrap_or(Role::Tourist);
    if role == Role::Admin {
        return Err(AppError::Forbidden(
            "admin accounts cannot be self-registered".to_string(),
        ));
    }

    let account = state.identity.sign_up(&body.email, &body.password).await?;

    let mut user = User {
        uid: account.local_id.clone(),
        email: body.email.trim().to_string(),
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        contact_number: body.contact_number.trim().to_string(),
        role: role.as_str().to_string(),
        ..Default::default()
    };
    user.id = state.db.create_user(&user).await?;

    tracing::info!(user_id = %user.id, role = %role, "User registered");

    let principal = Principal {
        uid: account.local_id,
        email: user.email.clone(),
    };
    let jar = jar.add(session_cookie(
        create_session_token(&principal, &state.config.jwt_signing_key)?,
        &state.config,
    ));

    let session = SessionState::Resolved {
        principal,
        user: Some(user),
    };
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse::from_session(session)),
    ))
}

// ─── Sign-in ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    body.validate()?;

    let account = state.identity.sign_in(&body.email, &body.password).await?;
    let verified = state.id_token_verifier.verify(&account.id_token).await?;

    let principal = Principal {
        uid: verified.uid,
        email: verified.email.unwrap_or(account.email),
    };
    start_session(&state, jar, principal).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub id_token: String,
}

/// Exchange a provider ID token obtained client-side for a session.
async fn exchange_id_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SessionRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let verified = state.id_token_verifier.verify(&body.id_token).await?;

    let principal = Principal {
        uid: verified.uid,
        email: verified.email.unwrap_or_default(),
    };
    start_session(&state, jar, principal).await
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    principal: Principal,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_session_token(&principal, &state.config.jwt_signing_key)?;
    let session = resolve_session(&state.db, Some(principal)).await?;

    tracing::info!(role = ?session.role(), "Session started");

    Ok((
        jar.add(session_cookie(token, &state.config)),
        Json(SessionResponse::from_session(session)),
    ))
}

// ─── Password reset / logout ─────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<StatusCode> {
    body.validate()?;
    state.identity.send_password_reset(&body.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, jar.add(removal_cookie(&state.config)))
}
