// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schedule settings form.

use super::layout::Page;
use crate::models::Schedule;
use leptos::prelude::*;

/// Outcome banner after a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
    Invalid,
}

impl SaveOutcome {
    /// Banner CSS class and text.
    fn banner(self) -> (&'static str, &'static str) {
        match self {
            SaveOutcome::Saved => ("notice", "Schedule updated successfully!"),
            SaveOutcome::Failed => ("error", "Failed to update schedule. Please try again."),
            SaveOutcome::Invalid => ("error", "Both lunch and dinner times are required."),
        }
    }
}

pub fn render(schedule: Schedule, outcome: Option<SaveOutcome>) -> String {
    super::render(move || view! { <SchedulePage schedule=schedule outcome=outcome/> })
}

#[component]
fn SchedulePage(schedule: Schedule, outcome: Option<SaveOutcome>) -> impl IntoView {
    let banner = outcome.map(|outcome| {
        let (tone, text) = outcome.banner();
        view! { <div class=tone>{text}</div> }
    });
    let Schedule {
        lunch_time,
        dinner_time,
    } = schedule;

    view! {
        <Page title="Schedule - Meal Tracker" refresh_secs=None>
            <div class="header">
                <a class="link" href="/">"← Back"</a>
                <h1>"Meal Schedule Settings"</h1>
            </div>
            {banner}
            <form method="post" action="/settings" class="card">
                <label>
                    "Lunch Time"
                    <input type="time" name="lunchTime" value=lunch_time required=true/>
                </label>
                <label>
                    "Dinner Time"
                    <input type="time" name="dinnerTime" value=dinner_time required=true/>
                </label>
                <button type="submit">"Save Schedule"</button>
            </form>
        </Page>
    }
}
