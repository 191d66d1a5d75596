use std::sync::{Mutex, PoisonError};

use crate::foundation::error::BackdropError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// How prominently a notification should be surfaced.
pub enum Severity {
    /// Informational.
    Info,
    /// Degraded but working.
    Warning,
    /// The feature is unusable until the user acts.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// A user-facing event emitted by the pipeline.
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Human-readable detail.
    pub description: String,
    /// Display severity.
    pub severity: Severity,
    /// Whether retrying the failed action may succeed.
    #[serde(default)]
    pub retryable: bool,
}

impl Notification {
    /// The event emitted when the segmentation model fails to load.
    pub fn initialization_failed(err: &BackdropError) -> Self {
        Self {
            title: "Virtual background unavailable".to_string(),
            description: format!("Failed to load the segmentation model: {err}"),
            severity: Severity::Error,
            retryable: true,
        }
    }
}

/// Receives pipeline notifications (toast UI, event bus, ...).
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification. Must not block for long.
    fn notify(&self, notification: &Notification);
}

/// Default sink: forwards notifications to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, n: &Notification) {
        match n.severity {
            Severity::Info => {
                tracing::info!(title = %n.title, retryable = n.retryable, "{}", n.description)
            }
            Severity::Warning => {
                tracing::warn!(title = %n.title, retryable = n.retryable, "{}", n.description)
            }
            Severity::Error => {
                tracing::error!(title = %n.title, retryable = n.retryable, "{}", n.description)
            }
        }
    }
}

/// Buffers notifications for a UI thread to drain.
#[derive(Debug, Default)]
pub struct CollectingNotificationSink {
    items: Mutex<Vec<Notification>>,
}

impl CollectingNotificationSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of buffered notifications.
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for CollectingNotificationSink {
    fn notify(&self, notification: &Notification) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/notify.rs"]
mod tests;
