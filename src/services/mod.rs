//! External control endpoint of the remote-synchronization tool.
//!
//! [`ControlEndpoint`] is the seam recovery and the scheduler talk through.
//! `rclone.rs` implements it by shelling out to the real tool;
//! `mock_rclone.rs` is the configurable stand-in used by tests.

pub mod mock_rclone;
pub mod rclone;

use std::path::Path;

use async_trait::async_trait;

use crate::config::RemoteBinding;
use crate::error::RotatorError;

/// Credential file names reported by a successful swap command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    pub current: String,
    pub previous: String,
}

/// Live control endpoint for querying and swapping remote credentials.
#[async_trait]
pub trait ControlEndpoint: Send + Sync {
    /// File name of the credential currently configured for the remote, or
    /// `None` when the configuration carries no credential field.
    async fn active_credential(
        &self,
        binding: &RemoteBinding,
    ) -> Result<Option<String>, RotatorError>;

    /// Instruct the tool to use `credential` for the remote.
    async fn swap_credential(
        &self,
        binding: &RemoteBinding,
        credential: &Path,
    ) -> Result<SwapResult, RotatorError>;
}
