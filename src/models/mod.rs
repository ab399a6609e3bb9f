// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod reservation;
pub mod user;

pub use location::{Activity, Location};
pub use reservation::{GuideLocation, Reservation, ReservationStatus, TourOption, TransitionError};
pub use user::{Role, User};
