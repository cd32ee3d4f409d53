// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Local, Utc};

/// Format a timestamp as local wall-clock time, e.g. `12:30:05`.
pub fn format_local_time(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Today's local date, e.g. `2026-10-19`.
pub fn local_date_today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
