// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client state persisted across restarts.
//!
//! Holds the last meal period this shell observed, so a period boundary
//! crossed while the process was down is still detected on the next check.

use crate::models::MealPeriod;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

const STATE_FILE: &str = "client_state.json";

/// Contents of the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    #[serde(default)]
    pub last_meal_period: Option<MealPeriod>,
}

/// File-backed client state.
///
/// Holders of [`LocalStore::lock`] get exclusive read-modify-write access,
/// which keeps concurrent period checks from issuing duplicate resets.
pub struct LocalStore {
    path: PathBuf,
    state: Mutex<ClientState>,
}

impl LocalStore {
    /// Open the store in `dir`, loading any existing state.
    ///
    /// A missing file starts empty; an unreadable one is logged and ignored.
    pub async fn open(dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed creating state dir {}", dir.display()))?;

        let path = dir.join(STATE_FILE);
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "Ignoring corrupt client state");
                ClientState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ClientState::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed reading {}", path.display()));
            }
        };

        tracing::info!(
            path = %path.display(),
            last_meal_period = ?state.last_meal_period,
            "Client state loaded"
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub async fn last_meal_period(&self) -> Option<MealPeriod> {
        self.state.lock().await.last_meal_period
    }

    /// Exclusive access for a check-and-persist sequence.
    pub async fn lock(&self) -> LocalStoreGuard<'_> {
        LocalStoreGuard {
            path: &self.path,
            state: self.state.lock().await,
        }
    }
}

/// Exclusive handle on the client state.
pub struct LocalStoreGuard<'a> {
    path: &'a Path,
    state: MutexGuard<'a, ClientState>,
}

impl LocalStoreGuard<'_> {
    pub fn last_meal_period(&self) -> Option<MealPeriod> {
        self.state.last_meal_period
    }

    /// Persist a new last-seen period (write to temp file, then rename).
    pub async fn set_last_meal_period(&mut self, period: MealPeriod) -> anyhow::Result<()> {
        let mut next = self.state.clone();
        next.last_meal_period = Some(period);

        let bytes = serde_json::to_vec_pretty(&next)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("failed writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, self.path)
            .await
            .with_context(|| format!("failed replacing {}", self.path.display()))?;

        *self.state = next;
        Ok(())
    }
}
