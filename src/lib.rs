// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Local Lingua: tour booking backend for tourists, tour guides, and admins.
//!
//! This crate provides the role-gated HTTP API in front of Firebase
//! (Firestore, Auth, and Storage): booking, denormalized reservation
//! views, and catalog management.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod routing;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::FirestoreDb;
use services::{IdTokenVerifier, IdentityClient, StorageService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity: IdentityClient,
    pub id_token_verifier: Arc<IdTokenVerifier>,
    pub storage: StorageService,
}
