// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation-only pieces shared by the pages: food-status modal,
//! missed-meals ranking, house-full modal, and the away-mode button.

use crate::models::{rank_by_missed_meals, FoodStatusGroups, MealPeriod, User};
use crate::time_utils::format_local_time;
use leptos::prelude::*;

/// Mark-eaten is unavailable once you've eaten or while you're away.
pub fn mark_eaten_disabled(me: Option<&User>) -> bool {
    me.is_some_and(|u| u.has_eaten || u.is_away)
}

/// Form button flipping the away flag.
#[component]
pub fn AwayButton(is_away: bool) -> impl IntoView {
    let label = if is_away { "I'm back" } else { "I'm away" };
    view! {
        <form method="post" action="/actions/toggle-away">
            <button type="submit" class="secondary">{label}</button>
        </form>
    }
}

fn rank_class(rank: usize) -> &'static str {
    match rank {
        1 => "rank rank-1",
        2 => "rank rank-2",
        3 => "rank rank-3",
        _ => "rank rank-n",
    }
}

/// Missed-meals ranking card.
#[component]
pub fn RankingList(users: Vec<User>) -> impl IntoView {
    let ranked = rank_by_missed_meals(&users);
    let everyone_away = ranked.is_empty();

    let rows = ranked
        .into_iter()
        .map(|entry| {
            let count = entry.user.missed_meals_count;
            let noun = if count == 1 { "meal" } else { "meals" };
            let rank = format!("#{}", entry.rank);
            let name = entry.user.name.clone();
            let missed = format!("{count} missed {noun}");
            view! {
                <div class="row">
                    <span><span class={rank_class(entry.rank)}>{rank}</span>{name}</span>
                    <span class="muted">{missed}</span>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="card">
            <h2>"Missed Meals Ranking"</h2>
            {everyone_away.then(|| view! { <p class="muted">"Everyone has eaten!"</p> })}
            {rows}
        </div>
    }
}

/// One heading plus name/detail rows; renders nothing when empty.
#[component]
fn StatusGroup(heading: &'static str, tone: &'static str, rows: Vec<(String, String)>) -> impl IntoView {
    (!rows.is_empty()).then(move || {
        let rows = rows
            .into_iter()
            .map(|(name, detail)| {
                view! {
                    <div class="row">
                        <span>{name}</span>
                        <span class="muted">{detail}</span>
                    </div>
                }
            })
            .collect_view();
        view! {
            <h3 class=tone>{heading}</h3>
            {rows}
        }
    })
}

/// Food-status report shown after someone reports the food finished.
///
/// `today` is the local date used in "Missed <meal> on <date>".
#[component]
pub fn FoodStatusModal(
    users: Vec<User>,
    period: MealPeriod,
    #[prop(into)] today: String,
    message: Option<String>,
) -> impl IntoView {
    let groups = FoodStatusGroups::from_users(&users);

    let not_eaten: Vec<(String, String)> = groups
        .not_eaten
        .iter()
        .map(|u| (u.name.clone(), format!("Missed {period} on {today}")))
        .collect();
    let eaten: Vec<(String, String)> = groups
        .eaten
        .iter()
        .map(|u| {
            let when = u
                .last_eaten_at
                .map(format_local_time)
                .unwrap_or_else(|| "Time not recorded".to_string());
            (u.name.clone(), when)
        })
        .collect();
    let away: Vec<(String, String)> = groups
        .away
        .iter()
        .map(|u| (u.name.clone(), "Away".to_string()))
        .collect();

    let notice = message
        .filter(|m| !m.is_empty())
        .map(|m| view! { <div class="notice">{m}</div> });

    view! {
        <div class="overlay">
            <div class="modal">
                <div class="header">
                    <h2>"Food Status Report"</h2>
                    <a class="link" href="/">"Close"</a>
                </div>
                {notice}
                <StatusGroup heading="Haven't Eaten Yet" tone="rank-1" rows=not_eaten/>
                <StatusGroup heading="Have Eaten" tone="badge-eaten" rows=eaten/>
                <StatusGroup heading="Away" tone="muted" rows=away/>
                <RankingList users=users/>
                <a class="button secondary" href="/">"Close"</a>
            </div>
        </div>
    }
}

/// "House Full!" modal shown when registration hit the household capacity.
#[component]
pub fn MaxUsersModal(#[prop(into)] household: String) -> impl IntoView {
    let explanation = format!(
        "Looks like {household} is already at full capacity with all 5 flatmates registered. \
         Please contact current residents if you believe this is a mistake."
    );
    view! {
        <div class="overlay">
            <div class="modal" style="text-align:center">
                <h2>"House Full!"</h2>
                <p class="muted">{explanation}</p>
                <form method="post" action="/login/dismiss-max-users">
                    <button type="submit">"Understood"</button>
                </form>
            </div>
        </div>
    }
}
