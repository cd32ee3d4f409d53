// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push registration for a freshly signed-in housemate.

use crate::error::AppError;
use crate::services::backend::BackendClient;
use crate::services::identity::GoogleIdentity;
use crate::services::session::Session;
use std::str::FromStr;
use std::sync::Arc;

/// Notification permission of the device running this shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Never asked; treated as not granted.
    Default,
}

impl FromStr for NotificationPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "default" | "" => Ok(Self::Default),
            other => Err(format!("unknown notification permission: {other}")),
        }
    }
}

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushRegistration {
    Registered,
    /// Permission not granted; nothing was sent.
    Skipped,
}

/// Forwards this device's push-registration token to the meal API.
#[derive(Clone)]
pub struct NotificationBridge {
    permission: NotificationPermission,
    push_token: Option<String>,
    backend: BackendClient,
    identity: Arc<GoogleIdentity>,
}

impl NotificationBridge {
    pub fn new(
        permission: NotificationPermission,
        push_token: Option<String>,
        backend: BackendClient,
        identity: Arc<GoogleIdentity>,
    ) -> Self {
        Self {
            permission,
            push_token,
            backend,
            identity,
        }
    }

    /// Register the push token for `session` if notifications are allowed.
    pub async fn register(&self, session: &Session) -> Result<PushRegistration, AppError> {
        if self.permission != NotificationPermission::Granted {
            tracing::debug!(permission = ?self.permission, "Notification permission not granted");
            return Ok(PushRegistration::Skipped);
        }

        let token = self
            .push_token
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("No registration token available".to_string()))?;

        let bearer = session.bearer(&self.identity).await?;
        self.backend.register_push_token(&bearer, token).await?;

        tracing::info!(session_id = %session.id, "Push token registered");
        Ok(PushRegistration::Registered)
    }

    /// Run [`Self::register`] in the background, logging any failure.
    pub fn spawn_register(&self, session: Arc<Session>) {
        let bridge = self.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge.register(&session).await {
                tracing::warn!(error = %e, session_id = %session.id, "Error setting up notifications");
            }
        });
    }
}
