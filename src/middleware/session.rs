// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gating for page routes.

use crate::services::session::{decode_session_jwt, Session, SESSION_COOKIE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

/// Signed-in session attached to protected requests.
#[derive(Clone)]
pub struct CurrentSession(pub Arc<Session>);

/// Resolve the session referenced by the request's cookie, if it is live.
pub fn session_from_jar(state: &AppState, jar: &CookieJar) -> Option<Arc<Session>> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let session_id = decode_session_jwt(cookie.value(), &state.config.session_signing_key)?;
    state.sessions.current_user(&session_id)
}

/// Sign out a session whose bearer credential cannot be re-derived, clear
/// its cookie and send the browser back to Login.
pub fn end_lost_session(state: &AppState, session: &Session) -> Response {
    tracing::warn!(
        session_id = %session.id,
        uid = %session.user.uid,
        "Credential can no longer be refreshed, signing out"
    );
    state.sessions.sign_out(&session.id);

    let cleared = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO);
    (CookieJar::new().add(cleared), Redirect::to("/login")).into_response()
}

/// Middleware that requires a signed-in session with a usable credential;
/// anonymous users go to Login.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = session_from_jar(&state, &jar) else {
        tracing::debug!(path = %request.uri().path(), "No session, redirecting to login");
        return Redirect::to("/login").into_response();
    };

    session.touch();

    // Refreshes the ID token when it is about to expire
    if let Err(e) = session.bearer(&state.identity).await {
        if e.is_session_lost() {
            return end_lost_session(&state, &session);
        }
        tracing::warn!(error = %e, session_id = %session.id, "Token refresh failed");
    }

    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}
