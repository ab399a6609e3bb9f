// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod account;
pub mod admin;
pub mod auth;
pub mod guide;
pub mod tourist;

use crate::error::{AppError, Result};
use crate::middleware::{require_route, GateState};
use crate::models::Role;
use crate::routing::RouteGuard;
use crate::AppState;
use axum::http::{header, HeaderMap, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Catch-all inside a gated tree, so unknown paths still pass the gate.
async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

/// `?filename=` for raw-body image uploads.
#[derive(Debug, Default, Deserialize)]
pub struct ImageUploadQuery {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    pub url: String,
}

/// Content type of an image upload; anything but a non-empty `image/*` body is refused.
pub(crate) fn image_content_type(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "upload must have an image/* content type".to_string(),
        ));
    }
    if body.is_empty() {
        return Err(AppError::BadRequest("upload body is empty".to_string()));
    }

    Ok(content_type.to_string())
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let gate = |guard: RouteGuard| {
        middleware::from_fn_with_state(
            GateState {
                app: state.clone(),
                guard,
            },
            require_route,
        )
    };

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Gated page trees
    let gated_routes = Router::new()
        .merge(account::routes().route_layer(gate(RouteGuard::SignedIn)))
        .merge(tourist::routes().route_layer(gate(RouteGuard::Role(Role::Tourist))))
        .merge(guide::routes().route_layer(gate(RouteGuard::Role(Role::TourGuide))))
        .merge(admin::routes().route_layer(gate(RouteGuard::Role(Role::Admin))));

    Router::new()
        .merge(public_routes)
        .merge(gated_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
