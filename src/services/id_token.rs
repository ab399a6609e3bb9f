// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! ID tokens are RS256 JWTs signed by the `securetoken` service account.
//! Signing keys are fetched as JWKS and cached for the `max-age` the
//! endpoint advertises.

use crate::config::Config;
use crate::error::AppError;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Auth principal proven by a valid ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPrincipal {
    pub uid: String,
    pub email: Option<String>,
}

/// ID token verification error categories.
#[derive(Debug, Clone)]
pub enum IdTokenError {
    /// The token is malformed, expired, or issued for another project.
    Rejected(String),
    /// Signing keys could not be fetched.
    Transient(String),
}

impl std::fmt::Display for IdTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdTokenError::Rejected(msg) => write!(f, "ID token rejected: {msg}"),
            IdTokenError::Transient(msg) => write!(f, "ID token keys unavailable: {msg}"),
        }
    }
}

impl From<IdTokenError> for AppError {
    fn from(err: IdTokenError) -> Self {
        match err {
            IdTokenError::Rejected(msg) => {
                tracing::warn!(reason = %msg, "ID token rejected");
                AppError::InvalidToken
            }
            IdTokenError::Transient(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

#[derive(Clone)]
enum VerifierMode {
    Firebase,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase Auth ID tokens.
pub struct IdTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl IdTokenVerifier {
    /// Create a verifier that fetches and caches the Firebase signing keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building ID token HTTP client")?;

        tracing::info!(
            project = %config.gcp_project_id,
            "Initialized Firebase ID token verifier"
        );

        Ok(Self {
            http_client,
            project_id: config.gcp_project_id.clone(),
            mode: VerifierMode::Firebase,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static ID token kid must not be empty");
        }

        let mut verifier = Self::new(config)?;
        verifier.mode = VerifierMode::StaticKey {
            kid,
            decoding_key: Arc::new(decoding_key),
        };
        Ok(verifier)
    }

    /// Verify an ID token issued for this project.
    pub async fn verify(&self, token: &str) -> Result<VerifiedPrincipal, IdTokenError> {
        let header = decode_header(token)
            .map_err(|e| IdTokenError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(IdTokenError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| IdTokenError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let issuer = format!("{ISSUER_PREFIX}{}", self.project_id);
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| IdTokenError::Rejected(format!("JWT validation failed: {e}")))?;

        check_claims(token_data.claims, now_unix_secs())
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, IdTokenError> {
        if let VerifierMode::StaticKey {
            kid: static_kid,
            decoding_key,
        } = &self.mode
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }
            return Err(IdTokenError::Rejected(format!(
                "unknown JWT kid for static verifier: {kid}"
            )));
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(IdTokenError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), IdTokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = JWKS_URL, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| IdTokenError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IdTokenError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_cache_control_max_age)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| IdTokenError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
                continue;
            }
            if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
                continue;
            }

            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(IdTokenError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    email: Option<String>,
}

/// Checks beyond signature, issuer, audience, and expiry.
fn check_claims(
    claims: FirebaseIdTokenClaims,
    now: u64,
) -> Result<VerifiedPrincipal, IdTokenError> {
    if claims.sub.trim().is_empty() {
        return Err(IdTokenError::Rejected("empty sub claim".to_string()));
    }

    let Some(iat) = claims.iat else {
        return Err(IdTokenError::Rejected("missing iat claim".to_string()));
    };
    if iat > now + CLOCK_SKEW_SECS {
        return Err(IdTokenError::Rejected(
            "iat claim is in the future".to_string(),
        ));
    }

    if claims
        .auth_time
        .is_some_and(|auth_time| auth_time > now + CLOCK_SKEW_SECS)
    {
        return Err(IdTokenError::Rejected(
            "auth_time claim is in the future".to_string(),
        ));
    }

    Ok(VerifiedPrincipal {
        uid: claims.sub,
        email: claims.email.filter(|e| !e.is_empty()),
    })
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_750_000_000;

    fn claims(sub: &str, iat: Option<u64>) -> FirebaseIdTokenClaims {
        FirebaseIdTokenClaims {
            sub: sub.to_string(),
            iat,
            auth_time: iat,
            email: Some("guide@example.com".to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_claims() {
        let principal = check_claims(claims("uid-1", Some(NOW - 10)), NOW).unwrap();
        assert_eq!(principal.uid, "uid-1");
        assert_eq!(principal.email.as_deref(), Some("guide@example.com"));
    }

    #[test]
    fn rejects_empty_subject_and_future_iat() {
        assert!(matches!(
            check_claims(claims("", Some(NOW)), NOW),
            Err(IdTokenError::Rejected(_))
        ));
        assert!(matches!(
            check_claims(claims("uid-1", Some(NOW + 3600)), NOW),
            Err(IdTokenError::Rejected(_))
        ));
        assert!(matches!(
            check_claims(claims("uid-1", None), NOW),
            Err(IdTokenError::Rejected(_))
        ));
    }

    #[test]
    fn parse_cache_control() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=19845, must-revalidate"),
            Some(19845)
        );
        assert_eq!(parse_cache_control_max_age("no-cache"), None);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_without_network() {
        let verifier = IdTokenVerifier::new(&Config::test_default()).unwrap();
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(IdTokenError::Rejected(_))
        ));
    }
}
