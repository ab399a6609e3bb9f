// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reservation model, status transitions, and guide service areas.

use crate::models::Role;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored reservation record (`reservations` collection).
///
/// Every `*_id` field is a document ID in another collection. Nothing
/// guarantees the referenced document still exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default, alias = "_firestore_id")]
    pub id: String,
    /// Tourist's user document ID
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub location_id: String,
    /// Guide's user document ID
    #[serde(default)]
    pub guide_id: String,
    #[serde(default)]
    pub activity_ids: Vec<String>,
    /// Tour date (YYYY-MM-DD)
    #[serde(default)]
    pub date: String,
    /// Last day of a multi-day tour (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_option: Option<String>,
    /// Raw status string, see [`ReservationStatus`]
    #[serde(default)]
    pub status: String,
    /// Creation time (RFC3339)
    #[serde(default)]
    pub timestamp: String,
}

impl Reservation {
    /// Interpreted status, `None` for strings outside the known set.
    pub fn status(&self) -> Option<ReservationStatus> {
        ReservationStatus::parse(&self.status)
    }
}

/// Reservation lifecycle: `pending → Approved → Completed`, with
/// `Cancelled` reachable from `pending` or `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ReservationStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Cancelled")]
    Cancelled,
    #[serde(rename = "Completed")]
    Completed,
}

impl ReservationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "Approved",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ReservationStatus::Pending),
            "Approved" => Some(ReservationStatus::Approved),
            "Cancelled" => Some(ReservationStatus::Cancelled),
            "Completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }

    /// Sort rank used by the guide's reservation list.
    pub const fn rank(self) -> u8 {
        match self {
            ReservationStatus::Pending => 1,
            ReservationStatus::Approved => 2,
            ReservationStatus::Completed => 3,
            ReservationStatus::Cancelled => 4,
        }
    }

    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_become(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Cancelled) | (Approved, Completed)
        )
    }

    /// Validate a status change requested by `actor`.
    ///
    /// Guides drive the lifecycle; tourists may only cancel while the
    /// reservation is still pending; admins only read.
    pub fn transition(
        self,
        next: ReservationStatus,
        actor: Role,
    ) -> Result<ReservationStatus, TransitionError> {
        let permitted = match actor {
            Role::TourGuide => true,
            Role::Tourist => {
                self == ReservationStatus::Pending && next == ReservationStatus::Cancelled
            }
            Role::Admin => false,
        };

        if !permitted {
            return Err(TransitionError::NotPermitted { actor, to: next });
        }
        if !self.can_become(next) {
            return Err(TransitionError::Illegal {
                from: self,
                to: next,
            });
        }
        Ok(next)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a {actor} cannot mark a reservation as {to}")]
    NotPermitted { actor: Role, to: ReservationStatus },

    #[error("reservation cannot move from {from} to {to}")]
    Illegal {
        from: ReservationStatus,
        to: ReservationStatus,
    },
}

/// Service package chosen at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TourOption {
    #[serde(rename = "Tour Guide Only")]
    GuideOnly,
    #[serde(rename = "Tour Guide and Translator")]
    GuideAndTranslator,
    #[serde(rename = "Tour Guide + Transportation")]
    GuideAndTransportation,
    #[serde(rename = "Tour Guide + Transportation + Translator")]
    GuideTransportationAndTranslator,
}

impl TourOption {
    pub const ALL: [TourOption; 4] = [
        TourOption::GuideOnly,
        TourOption::GuideAndTranslator,
        TourOption::GuideAndTransportation,
        TourOption::GuideTransportationAndTranslator,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TourOption::GuideOnly => "Tour Guide Only",
            TourOption::GuideAndTranslator => "Tour Guide and Translator",
            TourOption::GuideAndTransportation => "Tour Guide + Transportation",
            TourOption::GuideTransportationAndTranslator => {
                "Tour Guide + Transportation + Translator"
            }
        }
    }
}

/// Locations a guide services (`guide_location` collection).
///
/// Keyed by the guide's user document ID and always written whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideLocation {
    /// Guide's user document ID (also the document ID)
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub selected_locations: Vec<String>,
    /// Last save (RFC3339)
    #[serde(default)]
    pub timestamp: String,
}
