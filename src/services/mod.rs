// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod booking;
pub mod id_token;
pub mod identity;
pub mod storage;

pub use aggregate::{ReservationFilter, ReservationResolver, ReservationView};
pub use booking::{BookingStep, BookingWizard, TourWindow};
pub use id_token::{IdTokenError, IdTokenVerifier, VerifiedPrincipal};
pub use identity::{IdentityClient, ProviderSession};
pub use storage::{ObjectFolder, StorageService};
