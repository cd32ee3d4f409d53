// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home page: meal status, roster, ranking, and actions.

use super::components::{mark_eaten_disabled, AwayButton, FoodStatusModal, RankingList};
use super::layout::Page;
use crate::models::User;
use crate::services::{HomeSnapshot, SessionUser};
use crate::time_utils::{format_local_time, local_date_today};
use leptos::prelude::*;

/// Inputs of the Home view.
pub struct HomeView {
    pub household: String,
    pub user: SessionUser,
    pub snapshot: HomeSnapshot,
    /// Open the food-status report, optionally with the server's message.
    pub report: Option<String>,
    pub refresh_secs: u64,
}

pub fn render(view: HomeView) -> String {
    super::render(move || home_page(view))
}

/// One roster row with the flatmate's badge.
#[component]
fn FlatmateRow(flatmate: User) -> impl IntoView {
    let (badge_class, badge) = if flatmate.is_away {
        ("badge badge-away", "Away")
    } else if flatmate.has_eaten {
        ("badge badge-eaten", "Has eaten")
    } else {
        ("badge badge-waiting", "Not eaten yet")
    };
    let last_ate = flatmate
        .last_eaten_at
        .map(|t| format!("Last ate at {}", format_local_time(t)));

    view! {
        <div class="row">
            <span>{flatmate.name}<span class=badge_class>{badge}</span></span>
            {last_ate.map(|text| view! { <span class="muted">{text}</span> })}
        </div>
    }
}

fn home_page(view: HomeView) -> impl IntoView {
    let HomeView {
        household,
        user,
        snapshot,
        report,
        refresh_secs,
    } = view;

    let me = snapshot
        .users
        .iter()
        .find(|u| u.is_identity(&user.uid, Some(user.email.as_str())));
    let mark_disabled = mark_eaten_disabled(me);
    let is_away = me.is_some_and(|u| u.is_away);

    let status = snapshot.meal_period.status_label();
    let summary = format!(
        "{household} · lunch {} · dinner {}",
        snapshot.schedule.lunch_time, snapshot.schedule.dinner_time
    );
    let not_loaded = (!snapshot.loaded).then(|| {
        view! { <p class="muted">"Couldn't load housemates yet. Retrying shortly."</p> }
    });
    let roster = snapshot
        .users
        .iter()
        .cloned()
        .map(|flatmate| view! { <FlatmateRow flatmate=flatmate/> })
        .collect_view();

    // A reload would close the report
    let refresh = report.is_none().then_some(refresh_secs);
    let period = snapshot.meal_period;
    let modal = report.map(|message| {
        view! {
            <FoodStatusModal
                users={snapshot.users.clone()}
                period=period
                today={local_date_today()}
                message=Some(message)
            />
        }
    });
    let users = snapshot.users;

    view! {
        <Page title="Meal Tracker" refresh_secs=refresh>
            <div class="header">
                <h1>"Meal Tracker"</h1>
                <span>
                    <a class="link" href="/settings">"Schedule"</a>
                    <form method="post" action="/auth/logout" style="display:inline">
                        <button type="submit" class="link" aria-label="Logout">"Sign out"</button>
                    </form>
                </span>
            </div>
            <div class="card">
                <div class="header" style="margin-bottom:1.5rem">
                    <h2 style="margin:0">"Current Status"</h2>
                    <span class="status">{status}</span>
                </div>
                <p class="muted">{summary}</p>
                {not_loaded}
                {roster}
            </div>
            <RankingList users=users/>
            <div class="actions">
                <form method="post" action="/actions/mark-eaten">
                    <button type="submit" disabled=mark_disabled>"Mark as ate"</button>
                </form>
                <AwayButton is_away=is_away/>
                <form method="post" action="/actions/report-finished">
                    <button type="submit" class="danger">"Report food finished"</button>
                </form>
            </div>
            {modal}
        </Page>
    }
}
