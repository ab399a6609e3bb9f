// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model and roles.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. Every gated route requires exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    #[serde(rename = "tourist")]
    Tourist,
    #[serde(rename = "tour guide")]
    TourGuide,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Tourist => "tourist",
            Role::TourGuide => "tour guide",
            Role::Admin => "admin",
        }
    }

    /// Parse the stored role string. Unknown strings have no role.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tourist" => Some(Role::Tourist),
            "tour guide" => Some(Role::TourGuide),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Root of the page tree mounted for this role.
    pub const fn home_path(self) -> &'static str {
        match self {
            Role::Tourist => "/tourist",
            Role::TourGuide => "/tour-guide",
            Role::Admin => "/admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile stored in Firestore (`users` collection).
///
/// The role is kept as the raw stored string so that a record with an
/// unexpected role still loads; use [`User::role`] to interpret it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Firestore document ID (never stored in the body)
    #[serde(default, alias = "_firestore_id")]
    pub id: String,
    /// Auth provider UID
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub role: String,
    /// Public URL of the uploaded profile picture
    #[serde(default, rename = "profile_link", skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,

    // ─── Tour guide profile ──────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl User {
    /// Interpreted role, `None` when the stored string is not a known role.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    /// "First Last", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Case-insensitive match against "first last email".
    pub fn matches_search(&self, needle: &str) -> bool {
        let haystack = format!("{} {} {}", self.first_name, self.last_name, self.email);
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}
