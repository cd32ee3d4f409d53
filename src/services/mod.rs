// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session, meal API, and background work.

pub mod backend;
pub mod google_oidc;
pub mod home_watcher;
pub mod identity;
pub mod local_store;
pub mod notifications;
pub mod push_worker;
pub mod session;

pub use backend::BackendClient;
pub use google_oidc::{GoogleIdTokenVerifier, OidcError, VerifiedIdentity};
pub use home_watcher::{HomeContext, HomeSnapshot, HomeState, PeriodCheck};
pub use identity::GoogleIdentity;
pub use local_store::LocalStore;
pub use notifications::{NotificationBridge, NotificationPermission};
pub use push_worker::{Notifier, PushSender};
pub use session::{Session, SessionStore, SessionUser};
