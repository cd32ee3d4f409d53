// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in sessions and their bearer credentials.
//!
//! A session holds the housemate's identity, the current Google ID token
//! (the bearer credential for the meal API) and the refresh token used to
//! re-derive it. Each session also owns the home snapshot and the
//! cancellation token of its polling loop.

use crate::error::AppError;
use crate::services::home_watcher::HomeState;
use crate::services::identity::{needs_refresh, GoogleIdentity, SignInTokens};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "meal_session";

/// Session cookie lifetime.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Margin before ID token expiry when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Identity of the signed-in housemate.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// Identity-provider subject
    pub uid: String,
    pub name: String,
    pub email: String,
}

/// Cached bearer credential.
#[derive(Clone)]
struct Credential {
    id_token: String,
    expires_at: DateTime<Utc>,
    refresh_token: Option<String>,
}

/// One signed-in browser session.
pub struct Session {
    pub id: String,
    pub user: SessionUser,
    credential: RwLock<Credential>,
    /// Serializes token refresh for this session.
    refresh_lock: Mutex<()>,
    pub home: Arc<HomeState>,
    cancel: CancellationToken,
    created_at: DateTime<Utc>,
    /// Unix seconds of the last request made with this session.
    last_seen: AtomicI64,
}

impl Session {
    /// Create a session from the tokens of a completed sign-in.
    pub fn from_sign_in(tokens: SignInTokens) -> Self {
        let user = SessionUser {
            uid: tokens.identity.subject.clone(),
            name: tokens.identity.name.clone(),
            email: tokens.identity.email.clone(),
        };
        Self::new(
            user,
            tokens.id_token,
            tokens.identity.expires_at,
            tokens.refresh_token,
        )
    }

    pub fn new(
        user: SessionUser,
        id_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user,
            credential: RwLock::new(Credential {
                id_token,
                expires_at,
                refresh_token,
            }),
            refresh_lock: Mutex::new(()),
            home: Arc::new(HomeState::default()),
            cancel: CancellationToken::new(),
            created_at: Utc::now(),
            last_seen: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    /// Record activity from the browser holding this session.
    pub fn touch(&self) {
        self.touch_at(Utc::now());
    }

    pub fn touch_at(&self, at: DateTime<Utc>) {
        self.last_seen.store(at.timestamp(), Ordering::Relaxed);
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.last_seen.load(Ordering::Relaxed), 0)
            .unwrap_or(self.created_at)
    }

    /// Idle past `idle_ttl`, or older than the session cookie itself.
    pub fn is_expired(&self, now: DateTime<Utc>, idle_ttl: Duration) -> bool {
        self.last_seen() + idle_ttl < now
            || self.created_at + Duration::days(SESSION_TTL_DAYS) < now
    }

    /// Token cancelled when this session signs out.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_signed_out(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Get a valid bearer credential, refreshing it if it is about to expire.
    ///
    /// 1. Fast path: cached token outside the refresh margin
    /// 2. Take the per-session refresh lock and re-check
    /// 3. Refresh through Google and cache the new token
    pub async fn bearer(&self, identity: &GoogleIdentity) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        {
            let cached = self.credential.read().await;
            if !needs_refresh(cached.expires_at, Utc::now(), margin) {
                return Ok(cached.id_token.clone());
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        let refresh_token = {
            let cached = self.credential.read().await;
            if !needs_refresh(cached.expires_at, Utc::now(), margin) {
                return Ok(cached.id_token.clone());
            }
            cached.refresh_token.clone().ok_or(AppError::InvalidToken)?
        };

        tracing::info!(session_id = %self.id, "ID token expiring, refreshing");

        let refreshed = identity.refresh(&refresh_token).await?;

        let mut cached = self.credential.write().await;
        cached.id_token = refreshed.id_token.clone();
        cached.expires_at = refreshed.identity.expires_at;
        if let Some(rotated) = refreshed.refresh_token {
            cached.refresh_token = Some(rotated);
        }

        Ok(refreshed.id_token)
    }
}

/// In-memory map of live sessions. Clones share the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions.insert(session.id.clone(), session.clone());
        tracing::info!(session_id = %session.id, uid = %session.user.uid, "Session started");
        session
    }

    /// Session for `session_id`, if still signed in.
    pub fn current_user(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    /// Remove the session and stop its background work.
    pub fn sign_out(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, session)) => {
                session.cancel.cancel();
                tracing::info!(session_id = %session_id, "Session signed out");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sign out every expired session; returns how many were removed.
    pub fn reap(&self, now: DateTime<Utc>, idle_ttl: Duration) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now, idle_ttl))
            .map(|entry| entry.key().clone())
            .collect();

        let mut reaped = 0;
        for session_id in expired {
            if self.sign_out(&session_id) {
                reaped += 1;
            }
        }
        reaped
    }

    /// Cancel every session's background work (shutdown).
    pub fn cancel_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().cancel.cancel();
        }
    }
}

/// Periodically sign out sessions idle for longer than `idle_ttl`.
pub fn spawn_reaper(
    store: SessionStore,
    idle_ttl: std::time::Duration,
    every: std::time::Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let idle_ttl = Duration::from_std(idle_ttl).unwrap_or(Duration::days(SESSION_TTL_DAYS));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let reaped = store.reap(Utc::now(), idle_ttl);
                    if reaped > 0 {
                        tracing::info!(reaped, remaining = store.len(), "Reaped idle sessions");
                    }
                }
            }
        }
    })
}

/// Session cookie claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Session ID
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Create the signed cookie value for a session.
pub fn create_session_jwt(session_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = Utc::now().timestamp() as usize;

    let claims = SessionClaims {
        sub: session_id.to_string(),
        iat: now,
        exp: now + (SESSION_TTL_DAYS * 24 * 60 * 60) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode a session cookie, returning the session ID.
pub fn decode_session_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<SessionClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}
