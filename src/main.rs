// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local Lingua API Server
//!
//! Serves the tourist, tour guide, and admin page trees on top of
//! Firebase Auth, Firestore, and Storage.

use local_lingua::{
    config::Config,
    db::FirestoreDb,
    services::{IdTokenVerifier, IdentityClient, StorageService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Local Lingua API");

    // Document store and object storage
    let (db, storage) = if config.local_store {
        tracing::warn!("LOCAL_STORE=memory: data lives in process memory only");
        (
            FirestoreDb::new_in_memory(),
            StorageService::new_in_memory(&config.storage_bucket),
        )
    } else {
        (
            FirestoreDb::new(&config.gcp_project_id).await?,
            StorageService::new(&config.storage_bucket),
        )
    };
    tracing::info!(bucket = %config.storage_bucket, "Storage service initialized");

    let identity = IdentityClient::new(&config);
    let id_token_verifier = Arc::new(IdTokenVerifier::new(&config)?);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity,
        id_token_verifier,
        storage,
    });

    // Build router
    let app = local_lingua::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("local_lingua=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
