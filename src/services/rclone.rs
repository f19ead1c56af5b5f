//! rclone control-endpoint client.
//!
//! Both operations shell out to the `rclone` binary and interpret its exit
//! status and stdout. The text contracts are deliberately narrow: the query
//! scans config-inspection output for one recognized field, and the swap
//! result is a JSON payload after a fixed delimiter line. Any shape mismatch
//! on the success path is `ResultParseFailed` — no best-effort guessing,
//! since the counterpart tool's interface is not under this system's
//! control.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::config::{RcSettings, RemoteBinding};
use crate::error::RotatorError;

use super::{ControlEndpoint, SwapResult};

/// Config field whose value names the active credential file.
pub const CREDENTIAL_FIELD: &str = "service_account_file";

/// Line separating the swap command's chatter from its JSON result payload.
pub const RESULT_DELIMITER: &str = "---";

/// Shells out to `rclone` for config inspection and credential swaps.
pub struct RcloneClient {
    rc: RcSettings,
}

impl RcloneClient {
    pub fn new(rc: RcSettings) -> Self {
        Self { rc }
    }

    fn config_flag(&self, cmd: &mut Command) {
        if let Some(config_file) = &self.rc.config_file {
            cmd.arg("--config").arg(config_file);
        }
    }

    fn rc_flags(&self, cmd: &mut Command, address: &str) {
        cmd.arg("--rc-addr").arg(address);
        if let Some(user) = &self.rc.user {
            cmd.arg("--rc-user").arg(user);
        }
        if let Some(pass) = &self.rc.pass {
            cmd.arg("--rc-pass").arg(pass);
        }
    }
}

#[async_trait]
impl ControlEndpoint for RcloneClient {
    async fn active_credential(
        &self,
        binding: &RemoteBinding,
    ) -> Result<Option<String>, RotatorError> {
        let mut cmd = Command::new("rclone");
        cmd.arg("config")
            .arg("show")
            .arg(format!("{}:", binding.remote));
        self.config_flag(&mut cmd);

        let output = cmd
            .output()
            .await
            .map_err(|err| RotatorError::recovery_lookup(&binding.remote, err.to_string()))?;
        if !output.status.success() {
            return Err(RotatorError::recovery_lookup(
                &binding.remote,
                describe_failure(&output),
            ));
        }

        Ok(active_file_name(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn swap_credential(
        &self,
        binding: &RemoteBinding,
        credential: &Path,
    ) -> Result<SwapResult, RotatorError> {
        let mut cmd = Command::new("rclone");
        cmd.arg("rc")
            .arg("backend/command")
            .arg("command=set")
            .arg(format!("fs={}:", binding.remote))
            .arg("-o")
            .arg(format!("{}={}", CREDENTIAL_FIELD, credential.display()));
        self.rc_flags(&mut cmd, &binding.address);
        self.config_flag(&mut cmd);

        let output = cmd
            .output()
            .await
            .map_err(|err| RotatorError::swap_command(&binding.remote, err.to_string()))?;
        if !output.status.success() {
            return Err(RotatorError::swap_command(
                &binding.remote,
                describe_failure(&output),
            ));
        }

        parse_swap_result(&String::from_utf8_lossy(&output.stdout))
    }
}

fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("rclone exited with {}", output.status)
    } else {
        format!("rclone exited with {}: {}", output.status, stderr)
    }
}

/// Scan config-inspection text for [`CREDENTIAL_FIELD`] and return the final
/// `/`-delimited segment of its value. All other content is ignored.
pub fn active_file_name(text: &str) -> Option<String> {
    for line in text.lines() {
        let Some((field, value)) = line.split_once('=') else {
            continue;
        };
        if field.trim() != CREDENTIAL_FIELD {
            continue;
        }
        let value = value.trim();
        let name = value.rsplit('/').next().unwrap_or(value);
        if name.is_empty() {
            return None;
        }
        return Some(name.to_string());
    }
    None
}

/// Parse the swap command's stdout: everything after the delimiter line must
/// be a JSON object carrying the current and previous credential paths.
pub fn parse_swap_result(stdout: &str) -> Result<SwapResult, RotatorError> {
    let mut payload = String::new();
    let mut seen_delimiter = false;
    for line in stdout.lines() {
        if seen_delimiter {
            payload.push_str(line);
            payload.push('\n');
        } else if line.trim() == RESULT_DELIMITER {
            seen_delimiter = true;
        }
    }
    if !seen_delimiter {
        return Err(RotatorError::result_parse(format!(
            "missing {RESULT_DELIMITER:?} delimiter in swap output"
        )));
    }

    let value: Value = serde_json::from_str(&payload)
        .map_err(|err| RotatorError::result_parse(err.to_string()))?;
    let section = value.get(CREDENTIAL_FIELD).ok_or_else(|| {
        RotatorError::result_parse(format!("payload has no {CREDENTIAL_FIELD} object"))
    })?;

    Ok(SwapResult {
        current: path_field(section, "current")?,
        previous: path_field(section, "previous")?,
    })
}

fn path_field(section: &Value, key: &str) -> Result<String, RotatorError> {
    let path = section.get(key).and_then(Value::as_str).ok_or_else(|| {
        RotatorError::result_parse(format!("payload has no {CREDENTIAL_FIELD}.{key} string"))
    })?;
    Ok(path.rsplit('/').next().unwrap_or(path).to_string())
}
