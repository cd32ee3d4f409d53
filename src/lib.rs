// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal Tracker: a shared-household meal board.
//!
//! This crate serves the housemates' web shell. It signs people in with
//! Google, renders who has eaten the current meal, and relays actions and
//! schedule changes to the remote meal API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use services::{
    home_watcher, BackendClient, GoogleIdTokenVerifier, GoogleIdentity, HomeContext, LocalStore,
    NotificationBridge, PushSender, Session, SessionStore,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub identity: Arc<GoogleIdentity>,
    pub sessions: SessionStore,
    pub home: HomeContext,
    pub notifications: NotificationBridge,
    pub push: PushSender,
}

impl AppState {
    /// Wire up services from configuration.
    pub fn build(
        config: Config,
        verifier: Arc<GoogleIdTokenVerifier>,
        store: Arc<LocalStore>,
        push: PushSender,
    ) -> anyhow::Result<Self> {
        let backend = BackendClient::new(&config.api_url)?;
        let identity = Arc::new(GoogleIdentity::new(&config, verifier)?);
        let sessions = SessionStore::new();

        let home = HomeContext {
            backend: backend.clone(),
            identity: identity.clone(),
            store,
            sessions: sessions.clone(),
            roster_interval: config.roster_poll_interval,
            period_interval: config.period_check_interval,
        };

        let notifications = NotificationBridge::new(
            config.notification_permission,
            config.push_registration_token.clone(),
            backend.clone(),
            identity.clone(),
        );

        Ok(Self {
            config,
            backend,
            identity,
            sessions,
            home,
            notifications,
            push,
        })
    }

    /// Register a signed-in session and start its background work:
    /// push registration and the home polling loop.
    pub fn start_session(&self, session: Session) -> Arc<Session> {
        let session = self.sessions.insert(session);
        self.notifications.spawn_register(session.clone());
        home_watcher::spawn(self.home.clone(), session.clone());
        session
    }
}
