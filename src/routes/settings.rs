// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal schedule settings.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::{end_lost_session, CurrentSession};
use crate::models::Schedule;
use crate::views::schedule::{self, SaveOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(settings_page).post(save_schedule))
}

/// Submitted schedule form.
#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleForm {
    #[serde(rename = "lunchTime", default)]
    #[validate(length(min = 1))]
    pub lunch_time: String,
    #[serde(rename = "dinnerTime", default)]
    #[validate(length(min = 1))]
    pub dinner_time: String,
}

impl From<ScheduleForm> for Schedule {
    fn from(form: ScheduleForm) -> Self {
        Schedule {
            lunch_time: form.lunch_time.trim().to_string(),
            dinner_time: form.dinner_time.trim().to_string(),
        }
    }
}

async fn settings_page(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Response {
    let fetched: Result<Schedule> = async {
        let bearer = session.bearer(&state.identity).await?;
        state.backend.get_schedule(&bearer).await
    }
    .await;

    let current = match fetched {
        Ok(schedule) => schedule,
        Err(e) if e.is_session_lost() => return end_lost_session(&state, &session),
        Err(e) => {
            tracing::warn!(error = %e, "Error fetching schedule");
            Schedule::settings_default()
        }
    };

    Html(schedule::render(current, None)).into_response()
}

async fn save_schedule(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Form(form): Form<ScheduleForm>,
) -> Response {
    if let Err(e) = form.validate() {
        tracing::debug!(error = %e, "Rejected schedule form");
        let entered = Schedule {
            lunch_time: form.lunch_time,
            dinner_time: form.dinner_time,
        };
        return Html(schedule::render(entered, Some(SaveOutcome::Invalid))).into_response();
    }

    let submitted = Schedule::from(form);
    let saved: Result<()> = async {
        let bearer = session.bearer(&state.identity).await?;
        state.backend.update_schedule(&bearer, &submitted).await
    }
    .await;

    let outcome = match saved {
        Ok(()) => {
            tracing::info!(
                lunch = %submitted.lunch_time,
                dinner = %submitted.dinner_time,
                "Schedule updated"
            );
            SaveOutcome::Saved
        }
        Err(e) if e.is_session_lost() => return end_lost_session(&state, &session),
        Err(e) => {
            tracing::warn!(error = %e, "Error updating schedule");
            SaveOutcome::Failed
        }
    };

    Html(schedule::render(submitted, Some(outcome))).into_response()
}
