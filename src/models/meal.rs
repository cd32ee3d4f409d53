// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal period classification from local wall-clock time.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First hour (inclusive) of the lunch window.
pub const LUNCH_START_HOUR: u32 = 7;
/// First hour of the dinner window; dinner wraps past midnight until lunch.
pub const DINNER_START_HOUR: u32 = 17;

/// Meal period derived from the local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    Lunch,
    Dinner,
    /// No period observed yet.
    None,
}

impl MealPeriod {
    /// Classify an hour of the day (0-23): lunch in [7, 17), dinner otherwise.
    pub fn at_hour(hour: u32) -> Self {
        if (LUNCH_START_HOUR..DINNER_START_HOUR).contains(&hour) {
            MealPeriod::Lunch
        } else {
            MealPeriod::Dinner
        }
    }

    /// Period for the current local time.
    pub fn current() -> Self {
        Self::at_hour(Local::now().hour())
    }

    /// Banner text on the Home view.
    pub fn status_label(self) -> &'static str {
        match self {
            MealPeriod::Lunch => "Lunch is ready",
            MealPeriod::Dinner => "Dinner is ready",
            MealPeriod::None => "No meal is currently scheduled",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MealPeriod::Lunch => "lunch",
            MealPeriod::Dinner => "dinner",
            MealPeriod::None => "none",
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealPeriod::Lunch => "Lunch",
            MealPeriod::Dinner => "Dinner",
            MealPeriod::None => "No meal",
        };
        f.write_str(name)
    }
}
