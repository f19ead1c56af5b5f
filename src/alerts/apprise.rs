//! apprise CLI transport.
//!
//! Delivery runs `apprise -b <message> <target>...`; a nonzero exit is a
//! non-fatal dispatch failure reported back to the notifier.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::RotatorError;

use super::AlertChannel;

pub struct AppriseChannel;

#[async_trait]
impl AlertChannel for AppriseChannel {
    async fn send(&self, message: &str, targets: &[String]) -> Result<(), RotatorError> {
        let output = Command::new("apprise")
            .arg("-b")
            .arg(message)
            .args(targets)
            .output()
            .await
            .map_err(|err| RotatorError::notification(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RotatorError::notification(format!(
                "apprise exited with {}: {}",
                output.status,
                stderr.trim(),
            )));
        }
        Ok(())
    }
}
