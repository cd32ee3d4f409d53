// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background worker that surfaces push payloads as OS notifications.
//!
//! The push webhook only enqueues; this task does the (possibly slow)
//! hand-off to the notification tray, one payload at a time.

use anyhow::Context;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Payloads waiting for the notifier beyond this are rejected.
pub const PUSH_QUEUE_CAPACITY: usize = 64;

/// Push payload as delivered by the push network.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    pub notification: PushNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushNotification {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Which notifier to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Log,
    Desktop,
    Memory,
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "desktop" => Ok(Self::Desktop),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown notifier: {other}")),
        }
    }
}

/// Destination for notifications.
#[derive(Clone)]
pub enum Notifier {
    /// Structured log event only.
    Log,
    /// Desktop notification via `notify-send`.
    Desktop,
    /// Keeps shown notifications in memory.
    Memory(Arc<Mutex<Vec<PushNotification>>>),
}

impl Notifier {
    pub fn from_kind(kind: NotifierKind) -> Self {
        match kind {
            NotifierKind::Log => Notifier::Log,
            NotifierKind::Desktop => Notifier::Desktop,
            NotifierKind::Memory => Notifier::Memory(Arc::default()),
        }
    }

    /// Show `title` with `body`.
    pub async fn show(&self, notification: &PushNotification) -> anyhow::Result<()> {
        match self {
            Notifier::Log => {
                tracing::info!(
                    title = %notification.title,
                    body = %notification.body,
                    "Notification"
                );
                Ok(())
            }
            Notifier::Desktop => {
                let status = tokio::process::Command::new("notify-send")
                    .arg(&notification.title)
                    .arg(&notification.body)
                    .status()
                    .await
                    .context("failed to run notify-send")?;
                if !status.success() {
                    anyhow::bail!("notify-send exited with {status}");
                }
                Ok(())
            }
            Notifier::Memory(shown) => {
                shown
                    .lock()
                    .map_err(|_| anyhow::anyhow!("notification log poisoned"))?
                    .push(notification.clone());
                Ok(())
            }
        }
    }

    /// Notifications recorded by a memory notifier.
    pub fn shown(&self) -> Vec<PushNotification> {
        match self {
            Notifier::Memory(shown) => shown.lock().map(|v| v.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

/// Handle used by the webhook to enqueue payloads.
#[derive(Clone)]
pub struct PushSender {
    tx: mpsc::Sender<PushNotification>,
}

/// Why a payload could not be queued.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("push queue is full")]
    Full,
    #[error("push worker has stopped")]
    Closed,
}

impl PushSender {
    pub fn enqueue(&self, notification: PushNotification) -> Result<(), EnqueueError> {
        self.tx.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Start the worker. It stops when `cancel` fires or all senders drop.
pub fn spawn(notifier: Notifier, cancel: CancellationToken) -> (PushSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<PushNotification>(PUSH_QUEUE_CAPACITY);

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Push worker shutting down");
                    break;
                }
                next = rx.recv() => {
                    let Some(notification) = next else {
                        break;
                    };
                    if let Err(e) = notifier.show(&notification).await {
                        tracing::warn!(error = %e, title = %notification.title, "Failed to show notification");
                    }
                }
            }
        }
    });

    (PushSender { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str) -> PushNotification {
        PushNotification {
            title: title.to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order() {
        let notifier = Notifier::from_kind(NotifierKind::Memory);
        let cancel = CancellationToken::new();
        let (sender, handle) = spawn(notifier.clone(), cancel.clone());

        sender.enqueue(note("first")).unwrap();
        sender.enqueue(note("second")).unwrap();
        drop(sender);
        handle.await.unwrap();

        let titles: Vec<_> = notifier.shown().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_fails() {
        let cancel = CancellationToken::new();
        let (sender, handle) = spawn(Notifier::Log, cancel.clone());
        cancel.cancel();
        handle.await.unwrap();

        assert!(matches!(sender.enqueue(note("late")), Err(EnqueueError::Closed)));
    }

    #[test]
    fn test_payload_shape() {
        let payload: PushPayload = serde_json::from_str(
            r#"{"notification":{"title":"Food finished","body":"Alice reported the food is gone"}}"#,
        )
        .unwrap();
        assert_eq!(payload.notification.title, "Food finished");
    }
}
