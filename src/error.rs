// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent page responses.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Meal API error: {0}")]
    BackendApi(String),

    #[error("Maximum users reached")]
    MaxUsersReached,

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error body the meal API sends when the household is full.
    pub const MAX_USERS_MESSAGE: &'static str = "Maximum users reached";

    /// Check if this error is the household-capacity rejection.
    pub fn is_max_users(&self) -> bool {
        matches!(self, AppError::MaxUsersReached)
    }

    /// The session's credential is gone and cannot be re-derived.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, AppError::InvalidToken)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Please sign in.".to_string()),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Your session has expired. Please sign in again.".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::BackendApi(msg) => {
                tracing::warn!(error = %msg, "Meal API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "The meal service is unavailable. Please try again.".to_string(),
                )
            }
            AppError::MaxUsersReached => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Identity(msg) => {
                tracing::warn!(error = %msg, "Identity provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to sign in with Google. Please try again.".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
        };

        (status, Html(crate::views::layout::error_page(status, &message))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
