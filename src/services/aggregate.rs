// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reservation aggregation: denormalized read models.
//!
//! A stored reservation only holds foreign keys. Views resolve each key
//! with an independent point read and substitute a per-role placeholder
//! when the referenced document is gone. A missing document is a normal
//! outcome; a failed read is an error.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{Activity, Location, Reservation, ReservationStatus, Role, User};
use crate::time_utils::parse_calendar_date;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Collections the resolver reads from.
#[derive(Debug, Clone, Copy)]
pub struct CollectionNames {
    pub users: &'static str,
    pub locations: &'static str,
    pub activities: &'static str,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: collections::USERS,
            locations: collections::LOCATIONS,
            activities: collections::ACTIVITIES,
        }
    }
}

/// Display text used when a referenced document or field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholders {
    pub location: &'static str,
    pub activity: &'static str,
    pub tourist_name: &'static str,
    pub guide_name: &'static str,
    /// Email, contact number, and rate
    pub detail: &'static str,
    pub date: &'static str,
    pub status: &'static str,
}

impl Placeholders {
    pub const TOURIST: Placeholders = Placeholders {
        location: "Location not found",
        activity: "Activity not found",
        tourist_name: "Unknown",
        guide_name: "No guide selected",
        detail: "N/A",
        date: "N/A",
        status: "Unknown",
    };

    pub const TOUR_GUIDE: Placeholders = Placeholders {
        location: "Deleted Location",
        activity: "Deleted Activity",
        tourist_name: "Unknown",
        guide_name: "Unknown",
        detail: "N/A",
        date: "No Date",
        status: "Pending",
    };

    pub const ADMIN: Placeholders = Placeholders {
        location: "Unknown Location",
        activity: "Unknown Activity",
        tourist_name: "Unknown",
        guide_name: "Unknown",
        detail: "N/A",
        date: "No Date",
        status: "Pending",
    };

    pub const fn for_role(role: Role) -> Placeholders {
        match role {
            Role::Tourist => Placeholders::TOURIST,
            Role::TourGuide => Placeholders::TOUR_GUIDE,
            Role::Admin => Placeholders::ADMIN,
        }
    }
}

/// A person on a reservation, resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PartyView {
    pub id: String,
    /// False when the user document is missing
    pub found: bool,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub rate: String,
}

impl PartyView {
    fn resolve(id: &str, user: Option<User>, name_placeholder: &str, detail: &str) -> Self {
        let Some(user) = user else {
            return Self {
                id: id.to_string(),
                found: false,
                first_name: name_placeholder.to_string(),
                last_name: String::new(),
                full_name: name_placeholder.to_string(),
                email: detail.to_string(),
                contact_number: detail.to_string(),
                rate: detail.to_string(),
            };
        };

        let full_name = match user.full_name() {
            name if name.is_empty() => name_placeholder.to_string(),
            name => name,
        };

        Self {
            id: id.to_string(),
            found: true,
            first_name: or_placeholder(&user.first_name, name_placeholder),
            last_name: user.last_name.clone(),
            full_name,
            email: or_placeholder(&user.email, detail),
            contact_number: or_placeholder(&user.contact_number, detail),
            rate: user
                .rate
                .as_deref()
                .map(|rate| or_placeholder(rate, detail))
                .unwrap_or_else(|| detail.to_string()),
        }
    }
}

/// Display-ready reservation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReservationView {
    pub id: String,
    pub location_id: String,
    pub location_name: String,
    pub activity_ids: Vec<String>,
    pub activity_names: Vec<String>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_option: Option<String>,
    pub status: String,
    pub timestamp: String,
    pub tourist: PartyView,
    pub guide: PartyView,
}

/// Turns stored reservations into views for one perspective.
#[derive(Clone)]
pub struct ReservationResolver {
    db: FirestoreDb,
    names: CollectionNames,
    placeholders: Placeholders,
}

impl ReservationResolver {
    pub fn new(db: FirestoreDb, perspective: Role) -> Self {
        Self {
            db,
            names: CollectionNames::default(),
            placeholders: Placeholders::for_role(perspective),
        }
    }

    pub fn with_collections(mut self, names: CollectionNames) -> Self {
        self.names = names;
        self
    }

    pub fn placeholders(&self) -> Placeholders {
        self.placeholders
    }

    /// Resolve one reservation. Every referenced document is read concurrently.
    pub async fn resolve(&self, reservation: Reservation) -> Result<ReservationView, AppError> {
        let names = self.names;
        let (tourist, guide, location, activities) = tokio::try_join!(
            self.db.get_doc::<User>(names.users, &reservation.user_id),
            self.db.get_doc::<User>(names.users, &reservation.guide_id),
            self.db
                .get_doc::<Location>(names.locations, &reservation.location_id),
            self.db
                .get_docs::<Activity>(names.activities, &reservation.activity_ids),
        )?;

        Ok(self.assemble(reservation, tourist, guide, location, activities))
    }

    /// Resolve a list of reservations concurrently, preserving order.
    pub async fn resolve_all(
        &self,
        reservations: Vec<Reservation>,
    ) -> Result<Vec<ReservationView>, AppError> {
        try_join_all(reservations.into_iter().map(|r| self.resolve(r))).await
    }

    fn assemble(
        &self,
        reservation: Reservation,
        tourist: Option<User>,
        guide: Option<User>,
        location: Option<Location>,
        activities: Vec<Option<Activity>>,
    ) -> ReservationView {
        let p = self.placeholders;

        let location_name = location
            .map(|l| or_placeholder(&l.name, p.location))
            .unwrap_or_else(|| p.location.to_string());

        let activity_names = activities
            .into_iter()
            .map(|a| {
                a.map(|a| or_placeholder(&a.name, p.activity))
                    .unwrap_or_else(|| p.activity.to_string())
            })
            .collect();

        ReservationView {
            tourist: PartyView::resolve(&reservation.user_id, tourist, p.tourist_name, p.detail),
            guide: PartyView::resolve(&reservation.guide_id, guide, p.guide_name, p.detail),
            location_name,
            activity_names,
            date: or_placeholder(&reservation.date, p.date),
            status: or_placeholder(&reservation.status, p.status),
            id: reservation.id,
            location_id: reservation.location_id,
            activity_ids: reservation.activity_ids,
            end_date: reservation.end_date.filter(|d| !d.is_empty()),
            tour_option: reservation.tour_option.filter(|o| !o.is_empty()),
            timestamp: reservation.timestamp,
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// List filters from the query string. Empty values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationFilter {
    pub search: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl ReservationFilter {
    /// Apply the filter and ordering rules of a perspective.
    pub fn apply(&self, views: Vec<ReservationView>, perspective: Role) -> Vec<ReservationView> {
        let search = non_empty(&self.search).map(str::to_lowercase);
        let date = non_empty(&self.date);
        let status = non_empty(&self.status);

        match perspective {
            Role::Tourist => views,
            Role::TourGuide => {
                let mut filtered: Vec<_> = views
                    .into_iter()
                    .filter(|v| {
                        search
                            .as_deref()
                            .is_none_or(|s| v.location_name.to_lowercase().contains(s))
                    })
                    .filter(|v| date.is_none_or(|d| v.date == d))
                    .filter(|v| status.is_none_or(|s| v.status == s))
                    .collect();
                filtered.sort_by_key(|v| status_rank(&v.status));
                filtered
            }
            Role::Admin => {
                let wanted_day = date.map(|d| (d, parse_calendar_date(d)));
                views
                    .into_iter()
                    .filter(|v| {
                        search.as_deref().is_none_or(|s| {
                            v.location_name.to_lowercase().contains(s)
                                || v.tourist.first_name.to_lowercase().contains(s)
                                || v.tourist.last_name.to_lowercase().contains(s)
                        })
                    })
                    .filter(|v| {
                        wanted_day.is_none_or(|(raw, day)| match day {
                            Some(day) => parse_calendar_date(&v.date) == Some(day),
                            None => v.date == raw,
                        })
                    })
                    .filter(|v| status.is_none_or(|s| v.status == s))
                    .collect()
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Lifecycle order; unknown statuses sort last.
fn status_rank(status: &str) -> u8 {
    ReservationStatus::parse(status)
        .map(ReservationStatus::rank)
        .unwrap_or(u8::MAX)
}
