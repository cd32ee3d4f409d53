// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google callback: registration, household capacity, and sign-in errors.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use meal_tracker::services::identity::sign_oauth_state;
use serde_json::json;
use tower::ServiceExt; // for oneshot

async fn callback(app: &common::TestApp, code: &str) -> Response {
    let state = sign_oauth_state("/", &app.state.config.oauth_state_key).unwrap();
    let uri = format!("/auth/google/callback?code={code}&state={state}");
    app.router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Reduce `Set-Cookie` values to a `Cookie` request header.
fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn test_successful_registration_signs_in() {
    let app = common::create_test_app().await;

    let response = callback(&app, "good-code").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookies = common::set_cookies(&response);
    let session_cookie = cookies
        .iter()
        .find(|c| c.starts_with("meal_session=") && !c.starts_with("meal_session=;"))
        .expect("session cookie set");
    assert!(session_cookie.contains("HttpOnly"));
    assert!(session_cookie.contains("SameSite=Lax"));
    assert_eq!(app.state.sessions.len(), 1);

    // Registration used the freshly issued ID token
    let register = app.backend.requests_to("POST", "/api/users/register");
    assert_eq!(register.len(), 1);
    assert!(register[0]
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer ey")));
    let body: serde_json::Value = serde_json::from_str(&register[0].body).unwrap();
    assert_eq!(body, json!({"name": "Alice", "email": "alice@example.com"}));

    // The new cookie opens Home
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie_header(&cookies))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = common::body_text(response).await;
    assert!(html.contains("Missed Meals Ranking"));
}

#[tokio::test]
async fn test_household_full_shows_modal_until_dismissed() {
    let app = common::create_test_app().await;
    app.backend.set_register_response(
        StatusCode::FORBIDDEN,
        json!({"error": "Maximum users reached"}),
    );

    let response = callback(&app, "good-code").await;
    assert_eq!(location(&response), "/login");
    assert!(app.state.sessions.is_empty(), "no session for a full household");

    let cookies = common::set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("max_users=1")));
    assert!(!cookies
        .iter()
        .any(|c| c.starts_with("meal_session=") && !c.starts_with("meal_session=;")));

    let flag = cookie_header(&cookies);
    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .header(header::COOKIE, &flag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = common::body_text(response).await;
        assert!(html.contains("House Full!"), "modal survives reloads");
        assert!(!html.contains("Failed to register user"));
    }

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login/dismiss-max-users")
                .header(header::COOKIE, &flag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
    assert!(common::set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("max_users=;")));
}

#[tokio::test]
async fn test_other_registration_failure_shows_generic_error() {
    let app = common::create_test_app().await;
    app.backend
        .set_register_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "db down"}));

    let response = callback(&app, "good-code").await;
    assert_eq!(location(&response), "/login?error=register");
    assert!(app.state.sessions.is_empty());
    assert!(!common::set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("max_users=1")));
}

#[tokio::test]
async fn test_rejected_code_is_sign_in_error() {
    let app = common::create_test_app().await;

    let response = callback(&app, "bad").await;
    assert_eq!(location(&response), "/login?error=signin");
    assert!(app
        .backend
        .requests_to("POST", "/api/users/register")
        .is_empty());
}

#[tokio::test]
async fn test_tampered_state_is_rejected() {
    let app = common::create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/google/callback?code=good-code&state=Zm9vfDE3fGJhZA")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(location(&response), "/login?error=signin");
    assert!(app.backend.requests_to("POST", "/token").is_empty());
}

#[tokio::test]
async fn test_provider_error_is_sign_in_error() {
    let app = common::create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/google/callback?error=access_denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(location(&response), "/login?error=signin");
}

#[tokio::test]
async fn test_auth_start_redirects_to_google() {
    let app = common::create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/auth/google").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let target = location(&response);
    assert!(target.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(target.contains("client_id=test-client.apps.googleusercontent.com"));
    assert!(target.contains("state="));
    // Every sign-in must yield a refresh token
    assert!(target.contains("access_type=offline"));
    assert!(target.contains("prompt=select_account%20consent"));
}
