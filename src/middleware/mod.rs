// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session gating, security headers).

pub mod security;
pub mod session;

pub use session::{end_lost_session, require_session, CurrentSession};
