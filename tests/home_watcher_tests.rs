// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal period transitions and roster refresh through the home watcher.

mod common;

use meal_tracker::models::MealPeriod;
use meal_tracker::services::home_watcher::{check_meal_period, refresh_home, PeriodCheck};
use meal_tracker::services::LocalStore;
use serde_json::json;

#[tokio::test]
async fn test_first_observation_persists_without_reset() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();

    let outcome = check_meal_period(&app.state.home, &session, MealPeriod::Lunch)
        .await
        .unwrap();

    assert_eq!(outcome, PeriodCheck::FirstObserved);
    assert!(app
        .backend
        .requests_to("POST", "/api/users/reset-eaten")
        .is_empty());
    assert_eq!(app.store.last_meal_period().await, Some(MealPeriod::Lunch));
    assert_eq!(session.home.snapshot().await.meal_period, MealPeriod::Lunch);
}

#[tokio::test]
async fn test_transition_resets_once_and_persists() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();
    let ctx = &app.state.home;

    check_meal_period(ctx, &session, MealPeriod::Lunch).await.unwrap();
    assert_eq!(
        check_meal_period(ctx, &session, MealPeriod::Lunch).await.unwrap(),
        PeriodCheck::Unchanged
    );

    let outcome = check_meal_period(ctx, &session, MealPeriod::Dinner)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PeriodCheck::Reset {
            from: MealPeriod::Lunch,
            to: MealPeriod::Dinner
        }
    );

    // Repeated checks in the same period do nothing more
    check_meal_period(ctx, &session, MealPeriod::Dinner).await.unwrap();

    let resets = app.backend.requests_to("POST", "/api/users/reset-eaten");
    assert_eq!(resets.len(), 1);
    assert!(resets[0]
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer ")));

    // Roster re-fetched after the reset
    let snapshot = session.home.snapshot().await;
    assert!(snapshot.loaded);
    assert!(snapshot.users.iter().all(|u| !u.has_eaten));

    // Persisted across restarts
    let reopened = LocalStore::open(app.state_dir.path()).await.unwrap();
    assert_eq!(reopened.last_meal_period().await, Some(MealPeriod::Dinner));
}

#[tokio::test]
async fn test_failed_reset_persists_nothing_and_retries() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();
    let ctx = &app.state.home;

    check_meal_period(ctx, &session, MealPeriod::Dinner).await.unwrap();

    app.backend.set_fail_reset(true);
    assert!(check_meal_period(ctx, &session, MealPeriod::Lunch)
        .await
        .is_err());
    assert_eq!(app.store.last_meal_period().await, Some(MealPeriod::Dinner));

    app.backend.set_fail_reset(false);
    let outcome = check_meal_period(ctx, &session, MealPeriod::Lunch)
        .await
        .unwrap();
    assert!(matches!(outcome, PeriodCheck::Reset { .. }));
    assert_eq!(app.store.last_meal_period().await, Some(MealPeriod::Lunch));
    assert_eq!(
        app.backend
            .requests_to("POST", "/api/users/reset-eaten")
            .len(),
        2
    );
}

#[tokio::test]
async fn test_concurrent_sessions_reset_once() {
    let app = common::create_test_app().await;
    let (alice, _) = app.sign_in();
    let (again, _) = app.sign_in();
    let ctx = &app.state.home;

    check_meal_period(ctx, &alice, MealPeriod::Lunch).await.unwrap();

    let (a, b) = tokio::join!(
        check_meal_period(ctx, &alice, MealPeriod::Dinner),
        check_meal_period(ctx, &again, MealPeriod::Dinner),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, PeriodCheck::Reset { .. }))
            .count(),
        1
    );
    assert_eq!(
        app.backend
            .requests_to("POST", "/api/users/reset-eaten")
            .len(),
        1
    );
}

#[tokio::test]
async fn test_refresh_home_requires_both_fetches() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();

    app.backend.set_fail_schedule(true);
    assert!(refresh_home(&app.state.home, &session).await.is_err());
    let snapshot = session.home.snapshot().await;
    assert!(!snapshot.loaded, "roster not applied when schedule failed");
    assert!(snapshot.users.is_empty());

    app.backend.set_fail_schedule(false);
    app.backend.set_users(vec![json!({"_id": "u9", "name": "Zed"})]);
    refresh_home(&app.state.home, &session).await.unwrap();

    let snapshot = session.home.snapshot().await;
    assert!(snapshot.loaded);
    assert_eq!(snapshot.users[0].name, "Zed");
    assert_eq!(snapshot.schedule.lunch_time, "12:30");
}

#[tokio::test]
async fn test_watcher_stops_on_sign_out() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();

    let handle =
        meal_tracker::services::home_watcher::spawn(app.state.home.clone(), session.clone());
    app.state.sessions.sign_out(&session.id);

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("watcher exits after sign-out")
        .unwrap();
}

#[tokio::test]
async fn test_watcher_signs_out_when_credential_is_lost() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in_expired(None);
    let cancel = session.cancellation();

    let handle =
        meal_tracker::services::home_watcher::spawn(app.state.home.clone(), session.clone());

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("watcher exits once the token cannot be refreshed")
        .unwrap();
    assert!(cancel.is_cancelled());
    assert!(app.state.sessions.current_user(&session.id).is_none());
    assert!(app.backend.requests_to("GET", "/api/users").is_empty());
}

#[tokio::test]
async fn test_watcher_signs_out_on_revoked_refresh_token() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in_expired(Some("revoked"));

    let handle =
        meal_tracker::services::home_watcher::spawn(app.state.home.clone(), session.clone());

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("watcher exits once the refresh token is rejected")
        .unwrap();
    assert!(session.is_signed_out());
    assert_eq!(app.backend.requests_to("POST", "/token").len(), 1);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_watcher_signs_out_when_meal_api_rejects_token() {
    let app = common::create_test_app().await;
    let (session, _) = app.sign_in();
    app.backend.set_unauthorized(true);

    let handle =
        meal_tracker::services::home_watcher::spawn(app.state.home.clone(), session.clone());

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("watcher exits after a 401 from the meal API")
        .unwrap();
    assert!(session.is_signed_out());
}
