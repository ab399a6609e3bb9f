// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tourist page tree: browse locations, book, and review reservations.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::location::name_matches;
use crate::models::{Location, Reservation, ReservationStatus, Role, TourOption, User};
use crate::routing::CurrentUser;
use crate::services::aggregate::{ReservationResolver, ReservationView};
use crate::services::booking::{self, BookingWizard, LocationOptions, MAX_ACTIVITIES};
use crate::time_utils::parse_calendar_date;
use crate::AppState;

/// Tourist routes. The role gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tourist", get(home))
        .route("/tourist/locations", get(list_locations))
        .route("/tourist/locations/{id}/options", get(location_options))
        .route(
            "/tourist/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/tourist/reservations/{id}/cancel", post(cancel_reservation))
        .route("/tourist/reservations/{id}/receipt", get(receipt))
        .route("/tourist/{*rest}", any(super::not_found))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TouristHome {
    user: User,
    reservation_count: usize,
}

async fn home(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<TouristHome>> {
    let reservations = state.db.reservations_for_tourist(current.user_id()).await?;
    Ok(Json(TouristHome {
        reservation_count: reservations.len(),
        user: current.user,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
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

/// Activities, guides, and tour options for the chosen location.
async fn location_options(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
) -> Result<Json<LocationOptions>> {
    Ok(Json(
        booking::load_location_options(&state.db, &location_id).await?,
    ))
}

// ─── Reservations ────────────────────────────────────────────

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<ReservationView>>> {
    let reservations = state.db.reservations_for_tourist(current.user_id()).await?;
    let views = ReservationResolver::new(state.db.clone(), Role::Tourist)
        .resolve_all(reservations)
        .await?;
    Ok(Json(views))
}

/// Booking form submission. Every field is optional on the wire so that
/// an incomplete form gets the booking message instead of a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(default)]
    pub location_id: String,
    #[serde(default)]
    pub activity_ids: Vec<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub tour_option: Option<TourOption>,
    #[serde(default)]
    pub guide_id: String,
}

impl CreateReservationRequest {
    /// Replay the form into a wizard, applying the same rules as the UI.
    pub fn into_wizard(self) -> Result<BookingWizard> {
        let mut wizard = BookingWizard::new();
        wizard.select_location(&self.location_id);

        for activity_id in &self.activity_ids {
            if wizard.selected_activities().contains(activity_id) {
                continue;
            }
            if !wizard.toggle_activity(activity_id) {
                return Err(AppError::BadRequest(format!(
                    "You can select up to {} activities.",
                    MAX_ACTIVITIES
                )));
            }
        }

        if !self.date.trim().is_empty() {
            let date = parse_calendar_date(&self.date)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", self.date)))?;
            wizard.set_date(date);
        }

        if let Some(raw) = self.end_date.filter(|d| !d.trim().is_empty()) {
            let end = parse_calendar_date(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid end date: {}", raw)))?;
            if !wizard.set_end_date(Some(end)) {
                let msg = wizard.window().error().unwrap_or_default();
                return Err(AppError::BadRequest(msg.to_string()));
            }
        }

        if let Some(option) = self.tour_option {
            wizard.set_tour_option(option);
        }
        wizard.select_guide(&self.guide_id);

        Ok(wizard)
    }
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let wizard = body.into_wizard()?;
    let reservation = booking::submit(&state.db, &wizard, current.user_id()).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Load a reservation owned by the current tourist. Someone else's
/// reservation is reported as missing.
async fn owned_reservation(
    state: &AppState,
    current: &CurrentUser,
    reservation_id: &str,
) -> Result<Reservation> {
    state
        .db
        .get_reservation(reservation_id)
        .await?
        .filter(|r| r.user_id == current.user_id())
        .ok_or_else(|| AppError::NotFound(format!("reservation {}", reservation_id)))
}

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Reservation>> {
    let mut reservation = owned_reservation(&state, &current, &reservation_id).await?;

    let status = reservation.status().ok_or_else(|| {
        AppError::Conflict(format!("unknown reservation status: {}", reservation.status))
    })?;
    let next = status.transition(ReservationStatus::Cancelled, Role::Tourist)?;

    state.db.set_reservation_status(&reservation_id, next).await?;
    reservation.status = next.as_str().to_string();
    Ok(Json(reservation))
}

async fn receipt(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(reservation_id): Path<String>,
) -> Result<impl IntoResponse> {
    let reservation = owned_reservation(&state, &current, &reservation_id).await?;
    let view = ReservationResolver::new(state.db.clone(), Role::Tourist)
        .resolve(reservation)
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_receipt(&view),
    ))
}

/// Printable receipt for a tourist's reservation.
pub fn render_receipt(view: &ReservationView) -> String {
    let timestamp = if view.timestamp.is_empty() {
        "N/A"
    } else {
        view.timestamp.as_str()
    };
    let dates = match &view.end_date {
        Some(end) => format!("{} to {}", view.date, end),
        None => view.date.clone(),
    };

    let activities = view.activity_names.join(", ");

    let mut out = String::from("Reservation Receipt\n\n");
    let lines = [
        ("Reservation ID", view.id.as_str()),
        ("Location", view.location_name.as_str()),
        ("Activities", activities.as_str()),
        ("Date", dates.as_str()),
        ("Tour Option", view.tour_option.as_deref().unwrap_or("N/A")),
        ("Guide", view.guide.full_name.as_str()),
        ("Contact", view.guide.contact_number.as_str()),
        ("Email", view.guide.email.as_str()),
        ("Rate", view.guide.rate.as_str()),
        ("Status", view.status.as_str()),
        ("Timestamp", timestamp),
    ];
    for (label, value) in lines {
        let _ = writeln!(out, "{label}: {value}");
    }
    out.push_str("\nThank you for your reservation!\n");
    out
}
