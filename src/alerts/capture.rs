//! In-memory alert channel for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RotatorError;

use super::AlertChannel;

/// One delivery attempt seen by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAlert {
    pub message: String,
    pub targets: Vec<String>,
}

/// Records every delivery attempt; optionally fails each one.
#[derive(Default)]
pub struct CaptureChannel {
    sent: Mutex<Vec<CapturedAlert>>,
    fail: bool,
}

impl CaptureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose every send fails after recording the attempt.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Delivery attempts seen so far, in order.
    pub fn sent(&self) -> Vec<CapturedAlert> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertChannel for CaptureChannel {
    async fn send(&self, message: &str, targets: &[String]) -> Result<(), RotatorError> {
        self.sent.lock().unwrap().push(CapturedAlert {
            message: message.to_string(),
            targets: targets.to_vec(),
        });
        if self.fail {
            return Err(RotatorError::notification("scripted channel failure"));
        }
        Ok(())
    }
}
