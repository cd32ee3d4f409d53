// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home page and the housemate actions posted from it.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::{end_lost_session, CurrentSession};
use crate::models::MealPeriod;
use crate::services::backend::ReportResponse;
use crate::services::home_watcher::{refresh_home, refresh_roster};
use crate::views::home::{self, HomeView};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_page))
        .route("/actions/mark-eaten", post(mark_eaten))
        .route("/actions/toggle-away", post(toggle_away))
        .route("/actions/report-finished", post(report_finished))
}

#[derive(Deserialize)]
pub struct HomeParams {
    #[serde(default)]
    report: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

async fn home_page(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(params): Query<HomeParams>,
) -> Response {
    let mut snapshot = session.home.snapshot().await;

    // The watcher may not have completed its first fetch yet
    if !snapshot.loaded {
        if let Err(e) = refresh_home(&state.home, &session).await {
            if e.is_session_lost() {
                return end_lost_session(&state, &session);
            }
            tracing::warn!(error = %e, session_id = %session.id, "Error fetching data");
        }
        if snapshot.meal_period == MealPeriod::None {
            session.home.set_meal_period(MealPeriod::current()).await;
        }
        snapshot = session.home.snapshot().await;
    }

    let report = params
        .report
        .is_some()
        .then(|| params.message.unwrap_or_default());

    Html(home::render(HomeView {
        household: state.config.household_name.clone(),
        user: session.user.clone(),
        snapshot,
        report,
        refresh_secs: state.config.roster_poll_interval.as_secs(),
    }))
    .into_response()
}

/// Re-fetch the roster after a write; failures keep the current data.
async fn refresh_after_write(state: &AppState, session: &CurrentSession) {
    if let Err(e) = refresh_roster(&state.home, &session.0).await {
        tracing::warn!(error = %e, session_id = %session.0.id, "Error fetching users");
    }
}

/// Response for a failed action: back to Home, or to Login when the
/// session's credential is gone.
fn action_failed(state: &AppState, current: &CurrentSession, e: AppError, what: &str) -> Response {
    if e.is_session_lost() {
        return end_lost_session(state, &current.0);
    }
    tracing::warn!(error = %e, session_id = %current.0.id, "Error {}", what);
    Redirect::to("/").into_response()
}

async fn mark_eaten(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Response {
    let result: Result<()> = async {
        let bearer = current.0.bearer(&state.identity).await?;
        state.backend.mark_eaten(&bearer).await
    }
    .await;

    match result {
        Ok(()) => {
            tracing::info!(session_id = %current.0.id, "Marked as eaten");
            refresh_after_write(&state, &current).await;
            Redirect::to("/").into_response()
        }
        Err(e) => action_failed(&state, &current, e, "marking as eaten"),
    }
}

async fn toggle_away(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Response {
    let result: Result<()> = async {
        let bearer = current.0.bearer(&state.identity).await?;
        state.backend.toggle_away(&bearer).await
    }
    .await;

    match result {
        Ok(()) => {
            tracing::info!(session_id = %current.0.id, "Away status toggled");
            refresh_after_write(&state, &current).await;
            Redirect::to("/").into_response()
        }
        Err(e) => action_failed(&state, &current, e, "toggling away status"),
    }
}

async fn report_finished(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Response {
    let result: Result<ReportResponse> = async {
        let bearer = current.0.bearer(&state.identity).await?;
        state.backend.report_food_finished(&bearer).await
    }
    .await;

    match result {
        Ok(report) => {
            tracing::info!(session_id = %current.0.id, "Food reported finished");
            refresh_after_write(&state, &current).await;
            Redirect::to(&format!(
                "/?report=1&message={}",
                urlencoding::encode(&report.message)
            ))
            .into_response()
        }
        Err(e) => action_failed(&state, &current, e, "reporting food finished"),
    }
}
