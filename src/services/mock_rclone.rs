//! Configurable in-memory control endpoint for tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::RemoteBinding;
use crate::error::RotatorError;

use super::{ControlEndpoint, SwapResult};

/// One recorded `swap_credential` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCall {
    pub remote: String,
    pub address: String,
    pub credential: PathBuf,
}

/// Scripted [`ControlEndpoint`] that records every swap invocation.
#[derive(Default)]
pub struct MockControlEndpoint {
    active: Mutex<HashMap<String, String>>,
    lookup_errors: HashSet<String>,
    swap_errors: HashSet<String>,
    parse_failures: HashSet<String>,
    swaps: Mutex<Vec<SwapCall>>,
}

impl MockControlEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `file_name` as the credential currently active on `remote`.
    pub fn with_active(self, remote: &str, file_name: &str) -> Self {
        self.active
            .lock()
            .unwrap()
            .insert(remote.to_string(), file_name.to_string());
        self
    }

    /// Make `active_credential` fail for `remote`.
    pub fn with_lookup_error(mut self, remote: &str) -> Self {
        self.lookup_errors.insert(remote.to_string());
        self
    }

    /// Make `swap_credential` exit nonzero for `remote`.
    pub fn with_swap_error(mut self, remote: &str) -> Self {
        self.swap_errors.insert(remote.to_string());
        self
    }

    /// Make `swap_credential` succeed but return an unusable payload for
    /// `remote`.
    pub fn with_parse_failure(mut self, remote: &str) -> Self {
        self.parse_failures.insert(remote.to_string());
        self
    }

    /// Every swap invocation seen so far, in call order.
    pub fn swap_calls(&self) -> Vec<SwapCall> {
        self.swaps.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlEndpoint for MockControlEndpoint {
    async fn active_credential(
        &self,
        binding: &RemoteBinding,
    ) -> Result<Option<String>, RotatorError> {
        if self.lookup_errors.contains(&binding.remote) {
            return Err(RotatorError::recovery_lookup(
                &binding.remote,
                "scripted lookup failure",
            ));
        }
        Ok(self.active.lock().unwrap().get(&binding.remote).cloned())
    }

    async fn swap_credential(
        &self,
        binding: &RemoteBinding,
        credential: &Path,
    ) -> Result<SwapResult, RotatorError> {
        self.swaps.lock().unwrap().push(SwapCall {
            remote: binding.remote.clone(),
            address: binding.address.clone(),
            credential: credential.to_path_buf(),
        });

        if self.swap_errors.contains(&binding.remote) {
            return Err(RotatorError::swap_command(
                &binding.remote,
                "scripted nonzero exit",
            ));
        }
        if self.parse_failures.contains(&binding.remote) {
            return Err(RotatorError::result_parse("scripted unusable payload"));
        }

        let current = credential
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown.json")
            .to_string();
        let previous = self
            .active
            .lock()
            .unwrap()
            .insert(binding.remote.clone(), current.clone())
            .unwrap_or_else(|| current.clone());

        Ok(SwapResult { current, previous })
    }
}
