//! Error taxonomy for the rotator.
//!
//! Every operation returns an explicit error kind so callers can decide
//! "abort" vs "log and continue" mechanically: startup-phase kinds and
//! `ResultParseFailed` are fatal, everything else is recovered locally.

use std::path::PathBuf;

use thiserror::Error;

/// Unified application error.
#[derive(Error, Debug)]
pub enum RotatorError {
    /// Configured credential directory does not exist. Fatal at startup.
    #[error("credential directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Directory exists but holds zero usable credential files. Fatal at
    /// startup — the loop must never start with an empty queue.
    #[error("no usable credential files under {}", path.display())]
    EmptyCredentialSet { path: PathBuf },

    /// A `.json` file did not parse into the expected credential shape.
    /// Fatal at startup.
    #[error("malformed credential file {}: {message}", path.display())]
    MalformedCredential { path: PathBuf, message: String },

    /// Live-state query failed or returned unusable data. Recovered
    /// locally: the queue keeps its built-in order.
    #[error("recovery lookup failed for remote {remote}: {message}")]
    RecoveryLookupFailed { remote: String, message: String },

    /// A per-remote swap command exited nonzero. Recovered locally:
    /// notified, retried on the next pass.
    #[error("swap command failed for remote {remote}: {message}")]
    SwapCommandFailed { remote: String, message: String },

    /// The swap command succeeded but its result payload did not have the
    /// expected shape. Fatal: the external tool's contract changed and
    /// unattended operation can no longer be trusted.
    #[error("unexpected swap result payload: {message}")]
    ResultParseFailed { message: String },

    /// The alerting channel could not be invoked. Logged only, never
    /// escalated.
    #[error("notification dispatch failed: {message}")]
    NotificationDispatchFailed { message: String },

    /// Configuration file missing, unreadable or invalid. Fatal at startup.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RotatorError {
    pub fn malformed_credential(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedCredential {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn recovery_lookup(remote: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecoveryLookupFailed {
            remote: remote.into(),
            message: message.into(),
        }
    }

    pub fn swap_command(remote: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SwapCommandFailed {
            remote: remote.into(),
            message: message.into(),
        }
    }

    pub fn result_parse(message: impl Into<String>) -> Self {
        Self::ResultParseFailed {
            message: message.into(),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::NotificationDispatchFailed {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// `true` for kinds that must abort the process rather than be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::EmptyCredentialSet { .. }
                | Self::MalformedCredential { .. }
                | Self::ResultParseFailed { .. }
                | Self::Config { .. }
        )
    }
}
