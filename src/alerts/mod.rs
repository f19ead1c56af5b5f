//! Alert dispatch.
//!
//! [`Notifier`] filters by the configured severity floor and hands messages
//! to an [`AlertChannel`]. A channel failure is logged and swallowed —
//! alerting must never destabilize the rotation loop.

pub mod apprise;
pub mod capture;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::NotificationSettings;
use crate::error::RotatorError;

/// Message severity, ordered least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{label}")
    }
}

/// Transport that delivers a message to the configured targets.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn send(&self, message: &str, targets: &[String]) -> Result<(), RotatorError>;
}

/// Severity-filtering front for the alerting channel.
pub struct Notifier {
    settings: NotificationSettings,
    channel: Arc<dyn AlertChannel>,
}

impl Notifier {
    pub fn new(settings: NotificationSettings, channel: Arc<dyn AlertChannel>) -> Self {
        Self { settings, channel }
    }

    /// Log the message locally and, unless filtered out, dispatch it
    /// externally. Never fails.
    pub async fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error | Severity::Critical => tracing::error!("{message}"),
        }

        if self.settings.errors_only && severity < Severity::Error {
            return;
        }
        if self.settings.targets.is_empty() {
            return;
        }

        let body = format!(
            "[{}] {}: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            severity,
            sanitize(message),
        );
        if let Err(err) = self.channel.send(&body, &self.settings.targets).await {
            tracing::warn!("{err}");
        }
    }
}

/// Quotes in the message would break the alerting tool's command quoting;
/// replace both kinds with a neutral character before dispatch.
fn sanitize(message: &str) -> String {
    message.replace(['\'', '"'], " ")
}
