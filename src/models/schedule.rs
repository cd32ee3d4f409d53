// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal schedule model.

use serde::{Deserialize, Serialize};

/// Household meal times as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub lunch_time: String,
    pub dinner_time: String,
}

impl Schedule {
    /// Schedule shown on Home before the first successful fetch.
    pub fn home_default() -> Self {
        Self {
            lunch_time: "12:00".to_string(),
            dinner_time: "21:00".to_string(),
        }
    }

    /// Schedule pre-filled on the settings form when the fetch fails.
    pub fn settings_default() -> Self {
        Self {
            lunch_time: "12:00".to_string(),
            dinner_time: "19:00".to_string(),
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::home_default()
    }
}
