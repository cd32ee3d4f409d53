// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod meal;
pub mod roster;
pub mod schedule;
pub mod user;

pub use meal::MealPeriod;
pub use roster::{rank_by_missed_meals, FoodStatusGroups, RankedUser};
pub use schedule::Schedule;
pub use user::{Registration, User};
