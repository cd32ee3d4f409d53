// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-session polling loop behind the Home view.
//!
//! Every signed-in session gets one watcher task that:
//! - re-fetches roster and schedule together on the roster interval
//! - recomputes the meal period on the period interval and, when the period
//!   changed since the last persisted value, asks the meal API to reset
//!   everyone's eaten flag
//!
//! Responses carry request tickets so a slow response can never overwrite
//! data from a newer one. The task stops when its session signs out, and
//! signs the session out itself once its credential can no longer be
//! refreshed.

use crate::error::AppError;
use crate::models::{MealPeriod, Schedule, User};
use crate::services::backend::BackendClient;
use crate::services::identity::GoogleIdentity;
use crate::services::local_store::LocalStore;
use crate::services::session::{Session, SessionStore};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What the Home view renders.
#[derive(Debug, Clone)]
pub struct HomeSnapshot {
    pub users: Vec<User>,
    pub schedule: Schedule,
    pub meal_period: MealPeriod,
    /// False until the first successful roster fetch.
    pub loaded: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for HomeSnapshot {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            schedule: Schedule::home_default(),
            meal_period: MealPeriod::None,
            loaded: false,
            refreshed_at: None,
        }
    }
}

#[derive(Default)]
struct Tracked {
    snapshot: HomeSnapshot,
    users_ticket: u64,
    schedule_ticket: u64,
}

/// Snapshot plus the request-ticket bookkeeping that guards it.
#[derive(Default)]
pub struct HomeState {
    tracked: RwLock<Tracked>,
    next_ticket: AtomicU64,
}

impl HomeState {
    /// Take a ticket before issuing a fetch. Later tickets are newer.
    pub fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn snapshot(&self) -> HomeSnapshot {
        self.tracked.read().await.snapshot.clone()
    }

    /// Apply a roster response unless newer roster data is already shown.
    pub async fn apply_users(&self, ticket: u64, users: Vec<User>) -> bool {
        let mut tracked = self.tracked.write().await;
        if ticket <= tracked.users_ticket {
            tracing::debug!(ticket, current = tracked.users_ticket, "Dropping stale roster response");
            return false;
        }
        tracked.users_ticket = ticket;
        tracked.snapshot.users = users;
        tracked.snapshot.loaded = true;
        tracked.snapshot.refreshed_at = Some(Utc::now());
        true
    }

    /// Apply a schedule response unless a newer one is already shown.
    pub async fn apply_schedule(&self, ticket: u64, schedule: Schedule) -> bool {
        let mut tracked = self.tracked.write().await;
        if ticket <= tracked.schedule_ticket {
            tracing::debug!(ticket, current = tracked.schedule_ticket, "Dropping stale schedule response");
            return false;
        }
        tracked.schedule_ticket = ticket;
        tracked.snapshot.schedule = schedule;
        true
    }

    pub async fn set_meal_period(&self, period: MealPeriod) {
        self.tracked.write().await.snapshot.meal_period = period;
    }
}

/// Outcome of a meal period check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodCheck {
    /// Same period as last persisted.
    Unchanged,
    /// Nothing was persisted yet; the current period was recorded.
    FirstObserved,
    /// Period changed; eaten flags were reset and the new period recorded.
    Reset { from: MealPeriod, to: MealPeriod },
}

/// Shared dependencies of every watcher.
#[derive(Clone)]
pub struct HomeContext {
    pub backend: BackendClient,
    pub identity: Arc<GoogleIdentity>,
    pub store: Arc<LocalStore>,
    pub sessions: SessionStore,
    pub roster_interval: Duration,
    pub period_interval: Duration,
}

/// Fetch roster and schedule concurrently; apply only if both succeed.
pub async fn refresh_home(ctx: &HomeContext, session: &Session) -> Result<(), AppError> {
    let ticket = session.home.issue_ticket();
    let bearer = session.bearer(&ctx.identity).await?;

    let (users, schedule) = tokio::try_join!(
        ctx.backend.list_users(&bearer),
        ctx.backend.get_schedule(&bearer)
    )?;

    session.home.apply_users(ticket, users).await;
    session.home.apply_schedule(ticket, schedule).await;
    Ok(())
}

/// Re-fetch only the roster (after a write).
pub async fn refresh_roster(ctx: &HomeContext, session: &Session) -> Result<(), AppError> {
    let ticket = session.home.issue_ticket();
    let bearer = session.bearer(&ctx.identity).await?;
    let users = ctx.backend.list_users(&bearer).await?;
    session.home.apply_users(ticket, users).await;
    Ok(())
}

/// Record `period` on the snapshot and trigger a reset on a transition.
///
/// The persisted period is only advanced after the reset succeeded, so a
/// failed reset is retried on the next check.
pub async fn check_meal_period(
    ctx: &HomeContext,
    session: &Session,
    period: MealPeriod,
) -> Result<PeriodCheck, AppError> {
    session.home.set_meal_period(period).await;

    if period == MealPeriod::None {
        return Ok(PeriodCheck::Unchanged);
    }

    let mut store = ctx.store.lock().await;
    match store.last_meal_period() {
        Some(last) if last == period => Ok(PeriodCheck::Unchanged),
        None | Some(MealPeriod::None) => {
            store.set_last_meal_period(period).await?;
            tracing::info!(period = %period.as_str(), "First meal period observed");
            Ok(PeriodCheck::FirstObserved)
        }
        Some(last) => {
            tracing::info!(
                from = %last.as_str(),
                to = %period.as_str(),
                session_id = %session.id,
                "Meal period changed, resetting eaten flags"
            );

            let bearer = session.bearer(&ctx.identity).await?;
            ctx.backend.reset_eaten(&bearer).await?;

            if let Err(e) = refresh_roster(ctx, session).await {
                tracing::warn!(error = %e, "Failed to re-fetch roster after reset");
            }

            store.set_last_meal_period(period).await?;
            Ok(PeriodCheck::Reset {
                from: last,
                to: period,
            })
        }
    }
}

/// Start the polling loop for `session`.
pub fn spawn(ctx: HomeContext, session: Arc<Session>) -> JoinHandle<()> {
    tokio::spawn(run(ctx, session))
}

async fn run(ctx: HomeContext, session: Arc<Session>) {
    let cancel = session.cancellation();

    let mut roster_ticker = tokio::time::interval(ctx.roster_interval);
    roster_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut period_ticker = tokio::time::interval(ctx.period_interval);
    period_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(session_id = %session.id, "Home watcher started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = %session.id, "Home watcher shutting down");
                break;
            }
            _ = roster_ticker.tick() => {
                if let Err(e) = refresh_home(&ctx, &session).await {
                    if e.is_session_lost() {
                        sign_out_lost(&ctx, &session);
                        break;
                    }
                    tracing::warn!(error = %e, session_id = %session.id, "Error fetching data");
                }
            }
            _ = period_ticker.tick() => {
                match check_meal_period(&ctx, &session, MealPeriod::current()).await {
                    Ok(PeriodCheck::Reset { from, to }) => {
                        tracing::info!(from = %from.as_str(), to = %to.as_str(), "Eaten flags reset");
                    }
                    Ok(_) => {}
                    Err(e) if e.is_session_lost() => {
                        sign_out_lost(&ctx, &session);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, session_id = %session.id, "Meal period check failed");
                    }
                }
            }
        }
    }
}

fn sign_out_lost(ctx: &HomeContext, session: &Session) {
    tracing::warn!(
        session_id = %session.id,
        uid = %session.user.uid,
        "Credential can no longer be refreshed, signing out"
    );
    ctx.sessions.sign_out(&session.id);
}
