// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup (Cloud Run injects them as env vars
//! through secret bindings) and kept in memory.

use std::env;

/// Default Identity Toolkit endpoint (Firebase Auth REST API).
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie security)
    pub frontend_url: String,
    /// GCP / Firebase project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Firebase Storage bucket for uploaded images
    pub storage_bucket: String,
    /// Identity Toolkit base URL (overridable for the auth emulator)
    pub identity_toolkit_url: String,
    /// Use the in-memory document store and object storage instead of GCP.
    pub local_store: bool,

    // --- Secrets ---
    /// Firebase Web API key used for Identity Toolkit calls
    pub firebase_api_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
        let storage_bucket = env::var("STORAGE_BUCKET")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id));

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage_bucket,
            identity_toolkit_url: env::var("IDENTITY_TOOLKIT_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
            local_store: env::var("LOCAL_STORE")
                .map(|v| v.eq_ignore_ascii_case("memory"))
                .unwrap_or(false),
            gcp_project_id,

            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage_bucket: "test-project.appspot.com".to_string(),
            identity_toolkit_url: "http://127.0.0.1:9099/identitytoolkit.googleapis.com"
                .to_string(),
            local_store: true,
            firebase_api_key: "test_api_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_API_KEY", " test_key ");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("GCP_PROJECT_ID", "lingua-test");
        env::remove_var("STORAGE_BUCKET");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_api_key, "test_key");
        assert_eq!(config.storage_bucket, "lingua-test.appspot.com");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_secure_cookies_follow_frontend_scheme() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());

        config.frontend_url = "https://locallingua.example".to_string();
        assert!(config.secure_cookies());
    }
}
