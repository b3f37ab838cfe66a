//! User-facing notifications.
//!
//! The engine reports recoverable failures through an injected [`Notifier`];
//! hosts decide how to show them (toast, status bar, desktop notification).

use std::sync::{Arc, Mutex};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Something finished.
    Info,
    /// Recoverable problem; user work is intact.
    Warning,
    /// An operation failed.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Human readable text.
    pub message: String,
}

impl Notification {
    /// Info-level notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// Warning-level notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    /// Error-level notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Receives notifications from the engine.
pub trait Notifier {
    /// Show `notification` to the user.
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Info => tracing::info!(message = %notification.message, "notification"),
            Level::Warning => tracing::warn!(message = %notification.message, "notification"),
            Level::Error => tracing::error!(message = %notification.message, "notification"),
        }
    }
}

/// Keeps every notification; handy for hosts that poll and for tests.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain collected notifications.
    #[must_use]
    pub fn take(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .map(|mut seen| std::mem::take(&mut *seen))
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}
