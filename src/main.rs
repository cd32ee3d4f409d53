// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal Tracker web shell
//!
//! Signs housemates in with Google and serves the shared meal board,
//! backed by the remote meal API.

use meal_tracker::{
    config::{Config, SESSION_REAP_INTERVAL},
    services::{push_worker, session, GoogleIdTokenVerifier, LocalStore, Notifier},
    AppState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        api_url = %config.api_url,
        household = %config.household_name,
        "Starting Meal Tracker"
    );

    let store = Arc::new(LocalStore::open(&config.state_dir).await?);
    let verifier = Arc::new(GoogleIdTokenVerifier::new(&config)?);

    let shutdown = CancellationToken::new();
    let (push, push_handle) =
        push_worker::spawn(Notifier::from_kind(config.notifier), shutdown.clone());
    tracing::info!(notifier = ?config.notifier, "Push worker started");

    let state = Arc::new(AppState::build(config.clone(), verifier, store, push)?);

    let reaper_handle = session::spawn_reaper(
        state.sessions.clone(),
        config.session_idle_ttl,
        SESSION_REAP_INTERVAL,
        shutdown.clone(),
    );

    // Build router
    let app = meal_tracker::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(sessions = state.sessions.len(), "Shutting down");
    state.sessions.cancel_all();
    shutdown.cancel();
    if let Err(e) = push_handle.await {
        tracing::warn!(error = %e, "Push worker did not stop cleanly");
    }
    if let Err(e) = reaper_handle.await {
        tracing::warn!(error = %e, "Session reaper did not stop cleanly");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meal_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
