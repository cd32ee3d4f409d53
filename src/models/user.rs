// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model as served by the meal API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Housemate record. Owned by the meal API; the shell only mirrors it.
///
/// Older records may carry `null` or omit fields, so everything except the
/// document ID falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend document ID
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Linked identity-provider subject
    #[serde(rename = "firebaseUid", alias = "authUid", default)]
    pub auth_uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Reset by the backend at every meal period boundary
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_eaten: bool,
    #[serde(default)]
    pub last_eaten_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_away: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missed_meals_count: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl User {
    /// Whether this record belongs to the signed-in identity.
    ///
    /// Matches on the identity subject first and falls back to email for
    /// records created before the subject was linked.
    pub fn is_identity(&self, uid: &str, email: Option<&str>) -> bool {
        if let Some(auth_uid) = self.auth_uid.as_deref() {
            return auth_uid == uid;
        }
        match (self.email.as_deref(), email) {
            (Some(mine), Some(theirs)) => mine.eq_ignore_ascii_case(theirs),
            _ => false,
        }
    }
}

/// Body of the sign-up call.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
}
