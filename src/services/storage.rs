// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object storage for uploaded images.
//!
//! Production uploads go to the Firebase Storage bucket through the GCS
//! JSON upload API, authenticated with the runtime service account's
//! metadata-server token. Objects are served from the Firebase download
//! URL, which is what gets persisted on the owning document.

use crate::error::AppError;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const UPLOAD_BASE_URL: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const DOWNLOAD_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
/// Refresh the access token this long before it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Top-level folder an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFolder {
    Profiles,
    Activities,
    Locations,
}

impl ObjectFolder {
    pub const fn as_str(self) -> &'static str {
        match self {
            ObjectFolder::Profiles => "profiles",
            ObjectFolder::Activities => "activities",
            ObjectFolder::Locations => "locations",
        }
    }
}

/// A stored object held by the in-memory backend.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Clone)]
enum Backend {
    Gcs {
        http: reqwest::Client,
        token: Arc<RwLock<Option<CachedToken>>>,
    },
    Memory(Arc<DashMap<String, StoredObject>>),
}

/// Upload service for one bucket.
#[derive(Clone)]
pub struct StorageService {
    bucket: String,
    backend: Backend,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

impl StorageService {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            backend: Backend::Gcs {
                http: reqwest::Client::new(),
                token: Arc::new(RwLock::new(None)),
            },
        }
    }

    /// Store objects in process memory.
    pub fn new_in_memory(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Upload an object and return its public download URL.
    pub async fn upload(
        &self,
        folder: ObjectFolder,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, AppError> {
        let path = object_path(folder, owner_id, filename);
        let size = data.len();

        match &self.backend {
            Backend::Gcs { http, token } => {
                let access_token = self.access_token(http, token).await?;
                let url = format!("{}/{}/o", UPLOAD_BASE_URL, self.bucket);

                let response = http
                    .post(&url)
                    .query(&[("uploadType", "media"), ("name", path.as_str())])
                    .bearer_auth(access_token)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(data)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
                }
            }
            Backend::Memory(objects) => {
                objects.insert(
                    path.clone(),
                    StoredObject {
                        content_type: content_type.to_string(),
                        data,
                    },
                );
            }
        }

        tracing::info!(path = %path, size, "Object uploaded");
        Ok(self.public_url(&path))
    }

    /// Fetch an object held by the in-memory backend.
    pub fn stored_object(&self, path: &str) -> Option<StoredObject> {
        match &self.backend {
            Backend::Memory(objects) => objects.get(path).map(|o| o.clone()),
            Backend::Gcs { .. } => None,
        }
    }

    /// Firebase download URL for an object path.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/o/{}?alt=media",
            DOWNLOAD_BASE_URL,
            self.bucket,
            urlencoding::encode(path)
        )
    }

    async fn access_token(
        &self,
        http: &reqwest::Client,
        cache: &RwLock<Option<CachedToken>>,
    ) -> Result<String, AppError> {
        if let Some(token) = cache
            .read()
            .await
            .as_ref()
            .filter(|t| t.expires_at > Instant::now())
        {
            return Ok(token.value.clone());
        }

        let mut guard = cache.write().await;
        if let Some(token) = guard.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let response = http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "Metadata token request returned status {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Invalid metadata token: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(expires_in = token.expires_in, "Storage access token refreshed");
        Ok(token.access_token)
    }
}

/// `{folder}/{owner_id}/{filename}` with the filename reduced to safe characters.
pub fn object_path(folder: ObjectFolder, owner_id: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        folder.as_str(),
        owner_id,
        sanitize_filename(filename)
    )
}

fn sanitize_filename(filename: &str) -> String {
    // Only the final path component counts.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
