// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in, household registration, and sign-out.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::session::session_from_jar;
use crate::models::Registration;
use crate::services::identity::SignInTokens;
use crate::services::session::{create_session_jwt, Session, SESSION_COOKIE, SESSION_TTL_DAYS};
use crate::views::login::{self, LoginError};
use crate::AppState;

/// Cookie flag that keeps the "House Full!" modal up until dismissed.
pub const MAX_USERS_COOKIE: &str = "max_users";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page))
        .route("/login/dismiss-max-users", post(dismiss_max_users))
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    error: Option<String>,
}

async fn login_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<LoginParams>,
) -> Response {
    if session_from_jar(&state, &jar).is_some() {
        return Redirect::to("/").into_response();
    }

    let error = params.error.as_deref().and_then(LoginError::from_query);
    let show_max_users = jar.get(MAX_USERS_COOKIE).is_some();

    Html(login::render(
        &state.config.household_name,
        error,
        show_max_users,
    ))
    .into_response()
}

async fn dismiss_max_users(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(Cookie::build(MAX_USERS_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let auth_url = state.identity.authorization_url("/")?;

    tracing::info!(
        client_id = %state.config.google_client_id,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn login_error(error: LoginError) -> Redirect {
    Redirect::to(&format!("/login?error={}", error.as_query()))
}

/// OAuth callback - exchange code, register with the household, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Ok((jar, login_error(LoginError::SignIn)));
    }

    let Some(return_to) = params
        .state
        .as_deref()
        .and_then(|s| state.identity.verify_state(s))
    else {
        tracing::warn!("Invalid, expired or tampered OAuth state");
        return Ok((jar, login_error(LoginError::SignIn)));
    };

    let Some(code) = params.code else {
        tracing::warn!("OAuth callback without authorization code");
        return Ok((jar, login_error(LoginError::SignIn)));
    };

    let tokens = match state.identity.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!(error = %e, "Error signing in with Google");
            return Ok((jar, login_error(LoginError::SignIn)));
        }
    };

    tracing::info!(subject = %tokens.identity.subject, "Google sign-in verified");

    match register(&state, &tokens).await {
        Ok(()) => {}
        Err(AppError::MaxUsersReached) => {
            tracing::warn!(email = %tokens.identity.email, "Household full, signing out");
            let flag = Cookie::build((MAX_USERS_COOKIE, "1"))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            return Ok((jar.add(flag), Redirect::to("/login")));
        }
        Err(e) => {
            tracing::error!(error = %e, "Error registering user");
            return Ok((jar, login_error(LoginError::Register)));
        }
    }

    let session = state.start_session(Session::from_sign_in(tokens));
    let jwt = create_session_jwt(&session.id, &state.config.session_signing_key)?;

    tracing::info!(session_id = %session.id, name = %session.user.name, "Session started");

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .secure(state.config.public_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build();

    let jar = jar
        .remove(Cookie::build(MAX_USERS_COOKIE).path("/"))
        .add(cookie);

    Ok((jar, Redirect::to(&return_to)))
}

/// Register the freshly signed-in identity with the meal API.
async fn register(state: &AppState, tokens: &SignInTokens) -> Result<()> {
    let registration = Registration {
        name: tokens.identity.name.clone(),
        email: tokens.identity.email.clone(),
    };
    state
        .backend
        .register_user(&tokens.id_token, &registration)
        .await
}

/// Logout - end the session and its background work.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(session) = session_from_jar(&state, &jar) {
        state.sessions.sign_out(&session.id);
        tracing::info!(session_id = %session.id, "Signed out");
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}
