//! User-facing notifications
//!
//! Sync operations report success and failure through a `Notifier` instead
//! of raising errors to the top level. The UI layer supplies its own
//! implementation; `TracingNotifier` routes everything to the log.

use serde::{Deserialize, Serialize};

/// Severity of a user-visible alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receiver of transient, dismissable notifications
pub trait Notifier: Send + Sync {
    /// Show an alert to the user
    fn alert(&self, level: AlertLevel, message: &str);

    /// A blocking operation started (e.g. show a spinner)
    fn wait_started(&self) {}

    /// The blocking operation finished, successfully or not
    fn wait_finished(&self) {}
}

/// Notifier that logs alerts with `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, level: AlertLevel, message: &str) {
        match level {
            AlertLevel::Info | AlertLevel::Success => tracing::info!("{}", message),
            AlertLevel::Warning => tracing::warn!("{}", message),
            AlertLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Calls `wait_finished` when dropped, so every exit path clears the spinner
pub(crate) struct WaitGuard<'a> {
    notifier: &'a dyn Notifier,
}

impl<'a> WaitGuard<'a> {
    pub(crate) fn start(notifier: &'a dyn Notifier) -> Self {
        notifier.wait_started();
        Self { notifier }
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.notifier.wait_finished();
    }
}
