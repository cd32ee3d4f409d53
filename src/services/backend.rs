// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal API client.
//!
//! Every call carries a bearer credential; reads also send
//! `Cache-Control: no-cache` so intermediaries never serve a stale roster.

use crate::error::AppError;
use crate::models::{Registration, Schedule, User};
use anyhow::Context;
use reqwest::header::CACHE_CONTROL;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Meal API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

/// Response of the report-food-finished call.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the meal API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct PushTokenBody<'a> {
    token: &'a str,
}

impl BackendClient {
    /// Create a client for the meal API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building meal API HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the household roster, in backend order.
    ///
    /// A record that still fails to decode is skipped so the rest of the
    /// roster shows.
    pub async fn list_users(&self, bearer: &str) -> Result<Vec<User>, AppError> {
        let records: Vec<serde_json::Value> = self.get_json("/api/users", bearer).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<User>(record) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed user record");
                    None
                }
            })
            .collect())
    }

    /// Fetch the meal schedule.
    pub async fn get_schedule(&self, bearer: &str) -> Result<Schedule, AppError> {
        self.get_json("/api/schedule", bearer).await
    }

    /// Replace the schedule wholesale.
    pub async fn update_schedule(&self, bearer: &str, schedule: &Schedule) -> Result<(), AppError> {
        let response = self
            .http
            .put(self.url("/api/schedule"))
            .bearer_auth(bearer)
            .json(schedule)
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        check_response(response).await?;
        Ok(())
    }

    /// Register the signed-in identity as a housemate.
    ///
    /// Returns [`AppError::MaxUsersReached`] when the household is full.
    pub async fn register_user(
        &self,
        bearer: &str,
        registration: &Registration,
    ) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.url("/api/users/register"))
            .bearer_auth(bearer)
            .json(registration)
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if is_max_users_body(&body) {
                tracing::info!(status = status.as_u16(), "Registration rejected: household full");
                return Err(AppError::MaxUsersReached);
            }
            return Err(AppError::BackendApi(format!("HTTP {}: {}", status, body)));
        }

        check_response(response).await?;
        Ok(())
    }

    /// Mark the signed-in user as having eaten this period.
    pub async fn mark_eaten(&self, bearer: &str) -> Result<(), AppError> {
        self.post_empty("/api/users/mark-eaten", bearer).await
    }

    /// Clear every housemate's eaten flag for a new period.
    pub async fn reset_eaten(&self, bearer: &str) -> Result<(), AppError> {
        self.post_empty("/api/users/reset-eaten", bearer).await
    }

    /// Flip the signed-in user's away flag.
    pub async fn toggle_away(&self, bearer: &str) -> Result<(), AppError> {
        self.post_empty("/api/users/toggle-away", bearer).await
    }

    /// Store this device's push-registration token for the signed-in user.
    pub async fn register_push_token(&self, bearer: &str, token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.url("/api/users/fcm-token"))
            .bearer_auth(bearer)
            .json(&PushTokenBody { token })
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        check_response(response).await?;
        Ok(())
    }

    /// Report that the food is finished; the backend notifies the household.
    pub async fn report_food_finished(&self, bearer: &str) -> Result<ReportResponse, AppError> {
        let response = self
            .http
            .post(self.url("/api/report-food-finished"))
            .bearer_auth(bearer)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        check_response_json(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generic POST with an empty JSON body and no meaningful response.
    async fn post_empty(&self, path: &str, bearer: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(bearer)
            .header(CACHE_CONTROL, "no-cache")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        check_response(response).await
    }

    /// Generic uncached GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        bearer: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(bearer)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| AppError::BackendApi(e.to_string()))?;

        check_response_json(response).await
    }
}

fn is_max_users_body(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .is_some_and(|e| e == AppError::MAX_USERS_MESSAGE)
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::InvalidToken);
    }

    Err(AppError::BackendApi(format!("HTTP {}: {}", status, body)))
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidToken);
        }

        return Err(AppError::BackendApi(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::BackendApi(format!("JSON parse error: {}", e)))
}
