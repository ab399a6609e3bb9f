// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role gate: decides whether a session may enter a page tree.
//!
//! The session is resolved once per request (see
//! [`crate::middleware::auth::require_route`]) and then judged here
//! without any I/O, so the rules are plain data in, decision out.

use crate::models::{Role, User};

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/";

/// Identity proven by the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Auth provider UID
    pub uid: String,
    pub email: String,
}

/// Outcome of resolving the request's session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No token, or the token did not verify.
    Anonymous,
    /// Valid token; `user` is the matching profile, if any.
    Resolved {
        principal: Principal,
        user: Option<User>,
    },
}

impl SessionState {
    /// Role of the resolved profile, `None` when anonymous, missing, or unknown.
    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Resolved { user, .. } => user.as_ref().and_then(User::role),
        }
    }
}

/// What a route requires of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    Role(Role),
    /// Any signed-in account with a profile.
    SignedIn,
}

/// Signed-in account admitted by the gate, stored as a request extension.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub principal: Principal,
    pub user: User,
    pub role: Option<Role>,
}

impl CurrentUser {
    /// Profile document ID.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allow(CurrentUser),
    Redirect(&'static str),
}

/// Judge a session against a route guard.
pub fn decide(session: SessionState, guard: RouteGuard) -> GateDecision {
    let SessionState::Resolved { principal, user } = session else {
        return GateDecision::Redirect(LOGIN_PATH);
    };

    let Some(user) = user else {
        return GateDecision::Redirect(LANDING_PATH);
    };

    let role = user.role();
    let admitted = match guard {
        RouteGuard::Role(required) => role == Some(required),
        RouteGuard::SignedIn => true,
    };

    if admitted {
        GateDecision::Allow(CurrentUser {
            principal,
            user,
            role,
        })
    } else {
        GateDecision::Redirect(LANDING_PATH)
    }
}

/// Where a session lands after sign-in.
pub fn home_path(session: &SessionState) -> &'static str {
    session.role().map(Role::home_path).unwrap_or(LANDING_PATH)
}
