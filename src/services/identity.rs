// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Identity Toolkit client.
//!
//! Handles:
//! - Account creation (email/password)
//! - Password sign-in
//! - Password reset emails
//! - Password changes for a signed-in account
//!
//! Provider rejections surface as [`AppError::AuthProvider`] carrying the
//! provider's error code (e.g. `EMAIL_EXISTS`, `INVALID_LOGIN_CREDENTIALS`).

use crate::config::Config;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Tokens returned by sign-up and sign-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSession {
    pub id_token: String,
    /// Auth provider UID
    pub local_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

impl IdentityClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.identity_toolkit_url.clone(),
            api_key: config.firebase_api_key.clone(),
        }
    }

    /// Create an email/password account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let session: ProviderSession = self.post("accounts:signUp", &body).await?;
        tracing::info!(uid = %session.local_id, "Auth account created");
        Ok(session)
    }

    /// Verify an email/password pair.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post("accounts:signInWithPassword", &body).await
    }

    /// Ask the provider to email a password reset link.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let body = serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        let _: serde_json::Value = self.post("accounts:sendOobCode", &body).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }

    /// Set a new password for the account behind `id_token`.
    pub async fn update_password(&self, id_token: &str, new_password: &str) -> Result<(), AppError> {
        let body = serde_json::json!({
            "idToken": id_token,
            "password": new_password,
            "returnSecureToken": false,
        });
        let _: serde_json::Value = self.post("accounts:update", &body).await?;
        Ok(())
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/v1/{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Auth provider unreachable: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = provider_error_code(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::warn!(status = %status, code = %code, "Auth provider rejected request");
            return Err(AppError::AuthProvider(code));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid auth provider response: {}", e)))
    }
}

/// Extract the provider error code from an error body.
///
/// Messages look like `"WEAK_PASSWORD : Password should be at least 6
/// characters"`; the code is kept with its explanation.
fn provider_error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .filter(|message| !message.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_provider_error_code() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        assert_eq!(provider_error_code(body).as_deref(), Some("EMAIL_EXISTS"));

        let err = AppError::AuthProvider(provider_error_code(body).unwrap());
        assert!(!err.is_credential_error());
    }

    #[test]
    fn credential_codes_are_recognized() {
        let body = r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS"}}"#;
        let err = AppError::AuthProvider(provider_error_code(body).unwrap());
        assert!(err.is_credential_error());
    }

    #[test]
    fn non_json_error_body_has_no_code() {
        assert_eq!(provider_error_code("<html>Bad Gateway</html>"), None);
        assert_eq!(provider_error_code(r#"{"error":{"code":500}}"#), None);
    }
}
