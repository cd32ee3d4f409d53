// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login page.

use super::components::MaxUsersModal;
use super::layout::Page;
use leptos::prelude::*;

/// Why the last sign-in attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    SignIn,
    Register,
}

impl LoginError {
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "signin" => Some(Self::SignIn),
            "register" => Some(Self::Register),
            _ => None,
        }
    }

    pub fn as_query(self) -> &'static str {
        match self {
            Self::SignIn => "signin",
            Self::Register => "register",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::SignIn => "Failed to sign in with Google. Please try again.",
            Self::Register => "Failed to register user. Please try again.",
        }
    }
}

pub fn render(household: &str, error: Option<LoginError>, show_max_users: bool) -> String {
    let household = household.to_string();
    super::render(move || {
        view! { <LoginPage household=household error=error show_max_users=show_max_users/> }
    })
}

#[component]
fn LoginPage(household: String, error: Option<LoginError>, show_max_users: bool) -> impl IntoView {
    let heading = format!("{household} Meal Tracker");

    view! {
        <Page title="Sign in - Meal Tracker" refresh_secs=None>
            <div class="card" style="margin-top:4rem">
                <h1 style="text-align:center;margin-bottom:2rem">{heading}</h1>
                {error.map(|e| view! { <div class="error">{e.message()}</div> })}
                <a class="button secondary" href="/auth/google">"Sign in with Google"</a>
            </div>
            {show_max_users.then(move || view! { <MaxUsersModal household=household/> })}
        </Page>
    }
}
