// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides generic document primitives (point read, scan, equality and
//! array-contains queries, replace, field merge) over three backends:
//! - Firestore (production or emulator)
//! - an in-memory store (tests and `LOCAL_STORE=memory`)
//! - offline (every call fails)
//!
//! and typed operations on top for:
//! - Users (profiles and roles)
//! - Locations and Activities (admin catalog)
//! - Guide-Location (guide service areas)
//! - Reservations

use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::{Activity, GuideLocation, Location, Reservation, ReservationStatus, User};
use futures_util::future::try_join_all;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Same shape as Firestore auto-generated IDs.
const DOCUMENT_ID_LEN: usize = 20;
const DOCUMENT_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not accept real credentials, so skip the
        // default credential lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory document store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    // ─── Document Primitives ─────────────────────────────────────

    /// Point read. An empty ID never matches a document.
    pub async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        if id.trim().is_empty() {
            return Ok(None);
        }

        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.get(collection, id).map(from_document).transpose(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Independent point reads issued concurrently, in input order.
    pub async fn get_docs<T>(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<T>>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        try_join_all(ids.iter().map(|id| self.get_doc(collection, id))).await
    }

    /// Every document in a collection.
    pub async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store
                .list(collection)
                .into_iter()
                .map(from_document)
                .collect(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Documents whose string `field` equals `value`.
    pub async fn query_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let field = field.to_string();
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| q.for_all([q.field(field.as_str()).eq(value.as_str())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => store
                .query_eq(collection, field, value)
                .into_iter()
                .map(from_document)
                .collect(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Documents whose array `field` contains `value`.
    pub async fn query_array_contains<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let field = field.to_string();
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| {
                        q.for_all([q.field(field.as_str()).array_contains(value.as_str())])
                    })
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => store
                .query_array_contains(collection, field, value)
                .into_iter()
                .map(from_document)
                .collect(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Replace a document wholesale (create if missing).
    pub async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let body = document_body(doc)?;

        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(&body)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.set(collection, id, body);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Overwrite only the fields present in `patch`; other fields are kept.
    pub async fn merge_doc<T>(&self, collection: &str, id: &str, patch: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let body = document_body(patch)?;
        if body.is_empty() {
            return Ok(());
        }

        match &self.backend {
            Backend::Firestore(client) => {
                let fields: Vec<String> = body.keys().cloned().collect();
                let _: () = client
                    .fluent()
                    .update()
                    .fields(fields)
                    .in_col(collection)
                    .document_id(id)
                    .object(&body)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.merge(collection, id, body);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Store a new document under a generated ID and return the ID.
    pub async fn insert_doc<T>(&self, collection: &str, doc: &T) -> Result<String, AppError>
    where
        T: Serialize,
    {
        let id = new_document_id()?;
        self.set_doc(collection, &id, doc).await?;
        Ok(id)
    }

    pub async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.delete(collection, id);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    /// Find the user record for an auth provider UID.
    pub async fn find_user_by_uid(&self, uid: &str) -> Result<Option<User>, AppError> {
        if uid.is_empty() {
            return Ok(None);
        }
        let users: Vec<User> = self.query_eq(collections::USERS, "uid", uid).await?;
        Ok(users.into_iter().next())
    }

    /// Find the user record for an email address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        if email.is_empty() {
            return Ok(None);
        }
        let users: Vec<User> = self.query_eq(collections::USERS, "email", email).await?;
        Ok(users.into_iter().next())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.list_docs(collections::USERS).await
    }

    /// Create a user profile, returning its document ID.
    pub async fn create_user(&self, user: &User) -> Result<String, AppError> {
        self.insert_doc(collections::USERS, user).await
    }

    /// Field-level update of a user profile.
    pub async fn update_user<P: Serialize>(&self, user_id: &str, patch: &P) -> Result<(), AppError> {
        self.merge_doc(collections::USERS, user_id, patch).await
    }

    // ─── Location Operations ─────────────────────────────────────

    pub async fn get_location(&self, location_id: &str) -> Result<Option<Location>, AppError> {
        self.get_doc(collections::LOCATIONS, location_id).await
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        self.list_docs(collections::LOCATIONS).await
    }

    pub async fn create_location(&self, location: &Location) -> Result<String, AppError> {
        self.insert_doc(collections::LOCATIONS, location).await
    }

    pub async fn update_location<P: Serialize>(
        &self,
        location_id: &str,
        patch: &P,
    ) -> Result<(), AppError> {
        self.merge_doc(collections::LOCATIONS, location_id, patch)
            .await
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        self.get_doc(collections::ACTIVITIES, activity_id).await
    }

    pub async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        self.list_docs(collections::ACTIVITIES).await
    }

    pub async fn create_activity(&self, activity: &Activity) -> Result<String, AppError> {
        self.insert_doc(collections::ACTIVITIES, activity).await
    }

    pub async fn update_activity<P: Serialize>(
        &self,
        activity_id: &str,
        patch: &P,
    ) -> Result<(), AppError> {
        self.merge_doc(collections::ACTIVITIES, activity_id, patch)
            .await
    }

    // ─── Guide-Location Operations ───────────────────────────────

    /// Get the service area saved by a guide.
    pub async fn get_guide_location(
        &self,
        guide_id: &str,
    ) -> Result<Option<GuideLocation>, AppError> {
        self.get_doc(collections::GUIDE_LOCATION, guide_id).await
    }

    /// Replace a guide's service area (full replace, not merge).
    pub async fn set_guide_location(&self, record: &GuideLocation) -> Result<(), AppError> {
        self.set_doc(collections::GUIDE_LOCATION, &record.user_id, record)
            .await
    }

    /// All guide service areas that include a location.
    pub async fn guide_locations_for(
        &self,
        location_id: &str,
    ) -> Result<Vec<GuideLocation>, AppError> {
        self.query_array_contains(
            collections::GUIDE_LOCATION,
            "selectedLocations",
            location_id,
        )
        .await
    }

    // ─── Reservation Operations ──────────────────────────────────

    pub async fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, AppError> {
        self.get_doc(collections::RESERVATIONS, reservation_id)
            .await
    }

    pub async fn list_reservations(&self) -> Result<Vec<Reservation>, AppError> {
        self.list_docs(collections::RESERVATIONS).await
    }

    /// Reservations booked by a tourist (user document ID).
    pub async fn reservations_for_tourist(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, AppError> {
        self.query_eq(collections::RESERVATIONS, "userId", user_id)
            .await
    }

    /// Reservations assigned to a guide (user document ID, not auth UID).
    pub async fn reservations_for_guide(
        &self,
        guide_id: &str,
    ) -> Result<Vec<Reservation>, AppError> {
        self.query_eq(collections::RESERVATIONS, "guideId", guide_id)
            .await
    }

    pub async fn create_reservation(&self, reservation: &Reservation) -> Result<String, AppError> {
        let id = self
            .insert_doc(collections::RESERVATIONS, reservation)
            .await?;
        tracing::info!(
            reservation_id = %id,
            user_id = %reservation.user_id,
            guide_id = %reservation.guide_id,
            location_id = %reservation.location_id,
            "Reservation created"
        );
        Ok(id)
    }

    /// Overwrite the status field only.
    pub async fn set_reservation_status(
        &self,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> Result<(), AppError> {
        let patch = serde_json::json!({ "status": status.as_str() });
        self.merge_doc(collections::RESERVATIONS, reservation_id, &patch)
            .await?;
        tracing::info!(reservation_id, status = %status, "Reservation status updated");
        Ok(())
    }
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

fn from_document<T: DeserializeOwned>(doc: Value) -> Result<T, AppError> {
    serde_json::from_value(doc).map_err(|e| AppError::Database(format!("Malformed document: {}", e)))
}

/// Serialize a model into a document body. The `id` field is the
/// document ID and never part of the stored body.
fn document_body<T: Serialize>(doc: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(mut body)) => {
            body.remove("id");
            Ok(body)
        }
        Ok(_) => Err(AppError::Internal(anyhow::anyhow!(
            "document must serialize to an object"
        ))),
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// Generate a random 20-character alphanumeric document ID.
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; DOCUMENT_ID_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Random generator unavailable")))?;

    Ok(bytes
        .iter()
        .map(|b| DOCUMENT_ID_ALPHABET[*b as usize % DOCUMENT_ID_ALPHABET.len()] as char)
        .collect())
}
