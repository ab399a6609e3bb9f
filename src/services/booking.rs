// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tourist booking flow.
//!
//! The wizard walks location → activities → date → tour option → guide
//! and only produces a reservation once every selection is present.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{Activity, Location, Reservation, ReservationStatus, Role, TourOption, User};
use crate::time_utils::{format_calendar_date, now_rfc3339};
use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Most activities one reservation may include.
pub const MAX_ACTIVITIES: usize = 3;

pub const END_BEFORE_START: &str = "End date cannot be before start date";
pub const INCOMPLETE_BOOKING: &str =
    "Please select a location, activities, date, guide, and tour option.";

/// Shown for guide profile fields that were never filled in.
const MISSING_FIELD: &str = "---";

/// Where the wizard currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BookingStep {
    NoLocation,
    LocationSelected,
    ActivitiesSelected,
    DateSet,
    TourOptionSet,
    GuideSelected,
}

/// Tour dates: a start day and an optional last day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    error: Option<&'static str>,
}

impl TourWindow {
    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Last validation error, cleared by the next accepted change.
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Set the start day. An end day that would now precede it is dropped.
    pub fn set_start(&mut self, date: NaiveDate) {
        self.start = Some(date);
        self.error = None;
        if self.end.is_some_and(|end| end < date) {
            self.end = None;
        }
    }

    /// Set or clear the end day. An end before the start is refused and
    /// the previous end day is kept.
    pub fn set_end(&mut self, date: Option<NaiveDate>) -> bool {
        if let (Some(start), Some(end)) = (self.start, date) {
            if end < start {
                self.error = Some(END_BEFORE_START);
                return false;
            }
        }
        self.end = date;
        self.error = None;
        true
    }
}

/// Selection state for one booking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingWizard {
    location_id: Option<String>,
    selected_activities: Vec<String>,
    window: TourWindow,
    tour_option: Option<TourOption>,
    guide_id: Option<String>,
}

impl BookingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    pub fn selected_activities(&self) -> &[String] {
        &self.selected_activities
    }

    pub fn window(&self) -> &TourWindow {
        &self.window
    }

    pub fn tour_option(&self) -> Option<TourOption> {
        self.tour_option
    }

    pub fn guide_id(&self) -> Option<&str> {
        self.guide_id.as_deref()
    }

    /// Choose a location. Switching to a different one clears the
    /// activity and guide selections, which belong to the old location.
    pub fn select_location(&mut self, location_id: &str) {
        if self.location_id.as_deref() == Some(location_id) {
            return;
        }
        self.location_id = Some(location_id.to_string()).filter(|id| !id.is_empty());
        self.selected_activities.clear();
        self.guide_id = None;
    }

    /// Toggle an activity. Returns false when the selection did not change
    /// because it is already full.
    pub fn toggle_activity(&mut self, activity_id: &str) -> bool {
        if let Some(pos) = self
            .selected_activities
            .iter()
            .position(|id| id == activity_id)
        {
            self.selected_activities.remove(pos);
            return true;
        }

        if self.selected_activities.len() >= MAX_ACTIVITIES {
            return false;
        }

        self.selected_activities.push(activity_id.to_string());
        true
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.window.set_start(date);
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) -> bool {
        self.window.set_end(date)
    }

    pub fn set_tour_option(&mut self, option: TourOption) {
        self.tour_option = Some(option);
    }

    pub fn select_guide(&mut self, guide_id: &str) {
        self.guide_id = Some(guide_id.to_string()).filter(|id| !id.is_empty());
    }

    pub fn step(&self) -> BookingStep {
        if self.location_id.is_none() {
            BookingStep::NoLocation
        } else if self.selected_activities.is_empty() {
            BookingStep::LocationSelected
        } else if self.window.start.is_none() {
            BookingStep::ActivitiesSelected
        } else if self.tour_option.is_none() {
            BookingStep::DateSet
        } else if self.guide_id.is_none() {
            BookingStep::TourOptionSet
        } else {
            BookingStep::GuideSelected
        }
    }

    /// Build the reservation this wizard describes for `user_id`.
    ///
    /// New reservations always start as `pending`.
    pub fn to_reservation(&self, user_id: &str) -> Result<Reservation, AppError> {
        let (Some(location_id), Some(date), Some(tour_option), Some(guide_id)) = (
            self.location_id.as_ref(),
            self.window.start,
            self.tour_option,
            self.guide_id.as_ref(),
        ) else {
            return Err(AppError::BadRequest(INCOMPLETE_BOOKING.to_string()));
        };
        if self.selected_activities.is_empty() {
            return Err(AppError::BadRequest(INCOMPLETE_BOOKING.to_string()));
        }

        Ok(Reservation {
            id: String::new(),
            user_id: user_id.to_string(),
            location_id: location_id.clone(),
            guide_id: guide_id.clone(),
            activity_ids: self.selected_activities.clone(),
            date: format_calendar_date(date),
            end_date: self.window.end.map(format_calendar_date),
            tour_option: Some(tour_option.as_str().to_string()),
            status: ReservationStatus::Pending.as_str().to_string(),
            timestamp: now_rfc3339(),
        })
    }
}

/// Persist the booking. Referenced documents are not re-checked.
pub async fn submit(
    db: &FirestoreDb,
    wizard: &BookingWizard,
    user_id: &str,
) -> Result<Reservation, AppError> {
    let mut reservation = wizard.to_reservation(user_id)?;
    reservation.id = db.create_reservation(&reservation).await?;
    Ok(reservation)
}

/// Guide card shown when picking a guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GuideSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub bio: String,
    pub rate: String,
    pub guide_type: String,
    pub gender: String,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,
}

impl From<User> for GuideSummary {
    fn from(user: User) -> Self {
        let field = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| MISSING_FIELD.to_string())
        };
        let full_name = field(Some(user.full_name()));

        Self {
            full_name,
            email: field(Some(user.email)),
            contact_number: field(Some(user.contact_number)),
            bio: field(user.bio),
            rate: field(user.rate),
            guide_type: field(user.guide_type),
            gender: field(user.gender),
            nationality: field(user.nationality),
            profile_link: user.profile_link,
            id: user.id,
        }
    }
}

/// Everything the wizard shows once a location is picked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptions {
    pub location: Location,
    pub activities: Vec<Activity>,
    pub guides: Vec<GuideSummary>,
    pub tour_options: Vec<TourOption>,
}

/// Load the location, its activities, and the guides who serve it.
pub async fn load_location_options(
    db: &FirestoreDb,
    location_id: &str,
) -> Result<LocationOptions, AppError> {
    let location = db
        .get_location(location_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("location {}", location_id)))?;

    let (activities, guides) = tokio::try_join!(
        db.get_docs::<Activity>(collections::ACTIVITIES, &location.activities),
        guides_for_location(db, location_id),
    )?;

    Ok(LocationOptions {
        location,
        activities: activities.into_iter().flatten().collect(),
        guides,
        tour_options: TourOption::ALL.to_vec(),
    })
}

/// Guides whose service area includes the location. Records that are
/// missing or no longer have the guide role are skipped.
pub async fn guides_for_location(
    db: &FirestoreDb,
    location_id: &str,
) -> Result<Vec<GuideSummary>, AppError> {
    let guide_ids: Vec<String> = db
        .guide_locations_for(location_id)
        .await?
        .into_iter()
        .map(|record| record.user_id)
        .collect();

    let users = db
        .get_docs::<User>(collections::USERS, &guide_ids)
        .await?;

    Ok(users
        .into_iter()
        .flatten()
        .filter(|user| user.role() == Some(Role::TourGuide))
        .map(GuideSummary::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn complete_wizard() -> BookingWizard {
        let mut wizard = BookingWizard::new();
        wizard.select_location("loc1");
        wizard.toggle_activity("a1");
        wizard.set_date(day(10));
        wizard.set_tour_option(TourOption::GuideOnly);
        wizard.select_guide("guide1");
        wizard
    }

    #[test]
    fn fourth_activity_is_ignored() {
        let mut wizard = BookingWizard::new();
        wizard.select_location("loc1");
        for id in ["a1", "a2", "a3"] {
            assert!(wizard.toggle_activity(id));
        }

        assert!(!wizard.toggle_activity("a4"));
        assert_eq!(wizard.selected_activities(), ["a1", "a2", "a3"]);

        // Deselecting frees a slot.
        assert!(wizard.toggle_activity("a2"));
        assert!(wizard.toggle_activity("a4"));
        assert_eq!(wizard.selected_activities(), ["a1", "a3", "a4"]);
    }

    #[test]
    fn end_before_start_keeps_previous_end() {
        let mut window = TourWindow::default();
        window.set_start(day(10));
        assert!(window.set_end(Some(day(12))));

        assert!(!window.set_end(Some(day(9))));
        assert_eq!(window.error(), Some(END_BEFORE_START));
        assert_eq!(window.end(), Some(day(12)));

        assert!(window.set_end(Some(day(10))));
        assert_eq!(window.error(), None);
    }

    #[test]
    fn changing_location_resets_selection() {
        let mut wizard = complete_wizard();
        wizard.select_location("loc1");
        assert_eq!(wizard.step(), BookingStep::GuideSelected);

        wizard.select_location("loc2");
        assert!(wizard.selected_activities().is_empty());
        assert_eq!(wizard.guide_id(), None);
        assert_eq!(wizard.step(), BookingStep::LocationSelected);
    }

    #[test]
    fn steps_advance_in_order() {
        let mut wizard = BookingWizard::new();
        assert_eq!(wizard.step(), BookingStep::NoLocation);
        wizard.select_location("loc1");
        assert_eq!(wizard.step(), BookingStep::LocationSelected);
        wizard.toggle_activity("a1");
        assert_eq!(wizard.step(), BookingStep::ActivitiesSelected);
        wizard.set_date(day(1));
        assert_eq!(wizard.step(), BookingStep::DateSet);
        wizard.set_tour_option(TourOption::GuideAndTranslator);
        assert_eq!(wizard.step(), BookingStep::TourOptionSet);
        wizard.select_guide("g1");
        assert_eq!(wizard.step(), BookingStep::GuideSelected);
    }

    #[test]
    fn incomplete_wizard_is_rejected() {
        let mut wizard = complete_wizard();
        wizard.toggle_activity("a1");

        match wizard.to_reservation("u1") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, INCOMPLETE_BOOKING),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn every_tour_option_creates_pending() {
        for option in TourOption::ALL {
            let mut wizard = complete_wizard();
            wizard.set_tour_option(option);
            wizard.set_end_date(Some(day(11)));

            let reservation = wizard.to_reservation("tourist1").unwrap();
            assert_eq!(reservation.status, "pending");
            assert_eq!(reservation.tour_option.as_deref(), Some(option.as_str()));
            assert_eq!(reservation.date, "2025-06-10");
            assert_eq!(reservation.end_date.as_deref(), Some("2025-06-11"));
            assert_eq!(reservation.user_id, "tourist1");
        }
    }

    #[test]
    fn guide_summary_fills_blanks() {
        let summary = GuideSummary::from(User {
            id: "g1".to_string(),
            first_name: "Lea".to_string(),
            email: "lea@example.com".to_string(),
            bio: Some(" ".to_string()),
            rate: Some("1500".to_string()),
            ..Default::default()
        });
        assert_eq!(summary.full_name, "Lea");
        assert_eq!(summary.bio, "---");
        assert_eq!(summary.rate, "1500");
        assert_eq!(summary.contact_number, "---");
    }
}
