// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push delivery webhook.
//!
//! The push relay POSTs `{notification:{title, body}}` to
//! `/push/{secret}`. Payloads are queued for the push worker so the relay
//! never waits on the notifier.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::services::push_worker::{EnqueueError, PushPayload};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/push/{secret}", post(push_webhook))
}

fn secret_matches(configured: Option<&str>, given: &str) -> bool {
    configured.is_some_and(|expected| bool::from(expected.as_bytes().ct_eq(given.as_bytes())))
}

async fn push_webhook(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
    body: Bytes,
) -> StatusCode {
    if !secret_matches(state.config.push_webhook_secret.as_deref(), &secret) {
        tracing::warn!("Push webhook called with wrong secret");
        return StatusCode::NOT_FOUND;
    }

    let payload: PushPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed push payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    tracing::info!(title = %payload.notification.title, "Received background message");

    match state.push.enqueue(payload.notification) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(EnqueueError::Full) => {
            tracing::warn!("Push queue full, rejecting payload");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(EnqueueError::Closed) => {
            tracing::error!("Push worker stopped, rejecting payload");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
