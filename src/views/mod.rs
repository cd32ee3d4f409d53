// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML views, rendered server-side with Leptos.
//!
//! Pages are component trees built from owned state and turned into a
//! string for an axum `Html` response. There is no client-side hydration.

use leptos::prelude::*;

pub mod components;
pub mod home;
pub mod layout;
pub mod login;
pub mod schedule;

/// Render a view tree to an HTML string under a fresh reactive owner.
pub fn render<F, V>(view: F) -> String
where
    F: FnOnce() -> V,
    V: IntoView + 'static,
{
    Owner::new().with(|| view().to_html())
}
