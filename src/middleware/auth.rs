// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication and the role-gate middleware.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::routing::{decide, GateDecision, Principal, RouteGuard, SessionState};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "lingua_session";
const SESSION_TTL_DAYS: i64 = 7;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (auth provider UID)
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Create a JWT for a user session.
pub fn create_session_token(principal: &Principal, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: principal.uid.clone(),
        email: principal.email.clone(),
        iat: now,
        exp: now + (SESSION_TTL_DAYS as usize) * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session JWT, returning the principal it names.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<Principal> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(token, &key, &validation).ok()?.claims;
    if claims.sub.is_empty() {
        return None;
    }

    Some(Principal {
        uid: claims.sub,
        email: claims.email,
    })
}

/// Session cookie carrying `token`.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Cookie that clears the session. Attributes match [`session_cookie`].
pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::ZERO)
        .build()
}

/// Principal from the session cookie, or else a bearer token.
pub fn authenticate(config: &Config, jar: &CookieJar, headers: &HeaderMap) -> Option<Principal> {
    // Try cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))?
            .to_string(),
    };

    decode_session_token(&token, &config.jwt_signing_key)
}

/// Look up the profile for a principal: by UID first, then by email.
pub async fn resolve_session(
    db: &FirestoreDb,
    principal: Option<Principal>,
) -> Result<SessionState, AppError> {
    let Some(principal) = principal else {
        return Ok(SessionState::Anonymous);
    };

    let user = match db.find_user_by_uid(&principal.uid).await? {
        Some(user) => Some(user),
        None => db.find_user_by_email(&principal.email).await?,
    };

    if user.is_none() {
        tracing::debug!(uid = %principal.uid, "No profile for signed-in principal");
    }

    Ok(SessionState::Resolved { principal, user })
}

/// Gate configuration for one page tree.
#[derive(Clone)]
pub struct GateState {
    pub app: Arc<AppState>,
    pub guard: RouteGuard,
}

/// Middleware that admits only sessions satisfying the tree's guard.
///
/// Admitted requests carry a [`crate::routing::CurrentUser`] extension;
/// everyone else is redirected.
pub async fn require_route(
    State(gate): State<GateState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = authenticate(&gate.app.config, &jar, request.headers());

    let session = match resolve_session(&gate.app.db, principal).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    match decide(session, gate.guard) {
        GateDecision::Allow(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        GateDecision::Redirect(to) => {
            tracing::debug!(
                path = %request.uri().path(),
                guard = ?gate.guard,
                redirect = to,
                "Route gate redirect"
            );
            Redirect::to(to).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            uid: "uid-1".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    #[test]
    fn session_token_round_trip() {
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let token = create_session_token(&principal(), key).unwrap();
        assert_eq!(decode_session_token(&token, key), Some(principal()));
        assert_eq!(decode_session_token(&token, b"some_other_key_entirely_here!!"), None);
        assert_eq!(decode_session_token("garbage", key), None);
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let config = Config::test_default();
        let token = create_session_token(&principal(), &config.jwt_signing_key).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        assert_eq!(
            authenticate(&config, &CookieJar::new(), &headers),
            Some(principal())
        );

        let jar = CookieJar::new().add(session_cookie(token, &config));
        assert_eq!(
            authenticate(&config, &jar, &HeaderMap::new()),
            Some(principal())
        );
        assert_eq!(authenticate(&config, &CookieJar::new(), &HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn session_falls_back_to_email_lookup() {
        let db = FirestoreDb::new_in_memory();
        db.create_user(&crate::models::User {
            uid: String::new(),
            email: "ana@example.com".to_string(),
            role: "tourist".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let session = resolve_session(&db, Some(principal())).await.unwrap();
        assert_eq!(session.role(), Some(crate::models::Role::Tourist));

        let session = resolve_session(&db, None).await.unwrap();
        assert_eq!(session, SessionState::Anonymous);
    }
}
