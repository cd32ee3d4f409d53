// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::services::notifications::NotificationPermission;
use crate::services::push_worker::NotifierKind;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Google OAuth endpoints (overridable for tests).
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Roster and schedule refresh interval.
pub const DEFAULT_ROSTER_POLL_SECS: u64 = 30;
/// Meal period recompute interval.
pub const DEFAULT_PERIOD_CHECK_SECS: u64 = 60;
/// Sessions with no request for this long are signed out (12 hours).
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 12 * 60 * 60;
/// How often idle sessions are swept.
pub const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Public URL of this shell, used for the OAuth callback
    pub public_url: String,
    /// Base URL of the meal API
    pub api_url: String,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Google authorization endpoint
    pub google_auth_url: String,
    /// Google token endpoint
    pub google_token_url: String,
    /// Directory holding persisted client state
    pub state_dir: PathBuf,
    /// Household name shown in page headings
    pub household_name: String,
    /// Notification permission granted to this device
    pub notification_permission: NotificationPermission,
    /// Push registration token for this device, if one was provisioned
    pub push_registration_token: Option<String>,
    /// Where background push payloads are surfaced
    pub notifier: NotifierKind,
    /// How often the roster and schedule are re-fetched
    pub roster_poll_interval: Duration,
    /// How often the meal period is recomputed
    pub period_check_interval: Duration,
    /// Idle time after which a session is signed out
    pub session_idle_ttl: Duration,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
    /// Path secret guarding the push webhook
    pub push_webhook_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let notification_permission = match env::var("NOTIFICATION_PERMISSION") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("NOTIFICATION_PERMISSION", raw))?,
            Err(_) => NotificationPermission::Default,
        };

        let notifier = match env::var("NOTIFIER") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("NOTIFIER", raw))?,
            Err(_) => NotifierKind::Log,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_url: env::var("MEAL_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
            state_dir: env::var("STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            household_name: env::var("HOUSEHOLD_NAME").unwrap_or_else(|_| "W-306".to_string()),
            notification_permission,
            push_registration_token: optional_var("PUSH_REGISTRATION_TOKEN"),
            notifier,
            roster_poll_interval: seconds_var("ROSTER_POLL_SECS", DEFAULT_ROSTER_POLL_SECS),
            period_check_interval: seconds_var("PERIOD_CHECK_SECS", DEFAULT_PERIOD_CHECK_SECS),
            session_idle_ttl: seconds_var("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS),

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
            push_webhook_secret: optional_var("PUSH_WEBHOOK_SECRET"),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            google_client_id: "test-client.apps.googleusercontent.com".to_string(),
            google_auth_url: GOOGLE_AUTH_URL.to_string(),
            google_token_url: GOOGLE_TOKEN_URL.to_string(),
            state_dir: env::temp_dir().join("meal-tracker-test"),
            household_name: "W-306".to_string(),
            notification_permission: NotificationPermission::Denied,
            push_registration_token: None,
            notifier: NotifierKind::Memory,
            roster_poll_interval: Duration::from_secs(DEFAULT_ROSTER_POLL_SECS),
            period_check_interval: Duration::from_secs(DEFAULT_PERIOD_CHECK_SECS),
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            google_client_secret: "test_secret".to_string(),
            session_signing_key: b"test_session_key_32_bytes_min!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            push_webhook_secret: Some("test-push-secret".to_string()),
        }
    }

    /// Redirect URI registered with Google for the sign-in callback.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.public_url)
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn seconds_var(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
