//! YAML configuration for the rotator.
//!
//! The file maps credential directories to the remotes they serve and the
//! control addresses those remotes answer on, plus the rc endpoint
//! credentials, the poll interval and the notification targets. `BTreeMap`s
//! keep group and remote iteration deterministic across runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RotatorError;

/// Top-level configuration, deserialized from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Control-endpoint access settings.
    #[serde(default)]
    pub rc: RcSettings,

    /// Seconds to sleep between full rotation passes.
    pub poll_interval: u64,

    /// Credential directory -> remote name -> control addresses.
    /// Only the first address of each remote is used.
    pub groups: BTreeMap<PathBuf, BTreeMap<String, Vec<String>>>,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Optional credentials and config override for the rc control endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RcSettings {
    pub user: Option<String>,
    pub pass: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Where alerts go and how chatty they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub targets: Vec<String>,

    /// When set, severities below error are logged locally but never
    /// dispatched externally.
    #[serde(default)]
    pub errors_only: bool,
}

/// One remote bound to the single control address it is swapped through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBinding {
    pub remote: String,
    pub address: String,
}

impl Config {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, RotatorError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            RotatorError::config(format!("cannot read {}: {}", path.display(), err))
        })?;

        let config: Config = serde_yaml::from_str(&raw).map_err(|err| {
            RotatorError::config(format!("cannot parse {}: {}", path.display(), err))
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RotatorError> {
        if self.poll_interval == 0 {
            return Err(RotatorError::config("poll_interval must be greater than zero"));
        }
        if self.groups.is_empty() {
            return Err(RotatorError::config("at least one credential group is required"));
        }
        for (dir, remotes) in &self.groups {
            if remotes.is_empty() {
                return Err(RotatorError::config(format!(
                    "group {} binds no remotes",
                    dir.display()
                )));
            }
            for (remote, addresses) in remotes {
                if addresses.is_empty() {
                    return Err(RotatorError::config(format!(
                        "remote {remote} in group {} has no control address",
                        dir.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the bindings for one group. The configuration format allows
    /// several addresses per remote; one credential set serves one endpoint,
    /// so only the first address is kept and extras are flagged.
    pub fn bindings_for(&self, group: &Path) -> Vec<RemoteBinding> {
        let Some(remotes) = self.groups.get(group) else {
            return Vec::new();
        };

        let mut bindings = Vec::with_capacity(remotes.len());
        for (remote, addresses) in remotes {
            if addresses.len() > 1 {
                tracing::warn!(
                    "remote {} lists {} control addresses; using {} and ignoring the rest",
                    remote,
                    addresses.len(),
                    addresses[0],
                );
            }
            bindings.push(RemoteBinding {
                remote: remote.clone(),
                address: addresses[0].clone(),
            });
        }
        bindings
    }
}
