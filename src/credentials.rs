//! Credential store reader.
//!
//! Scans a configured directory recursively for service-account key files
//! (`*.json`, case-insensitive) and parses each into a [`CredentialRecord`].
//! Records are created once at startup and never change afterwards; the
//! rotation queues only reorder them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::RotatorError;

/// One discovered credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Base file name; the rotation identity of this credential.
    pub file_name: String,
    /// Absolute path, used as the swap payload.
    pub file_path: PathBuf,
    pub project_id: String,
    /// Used only for deterministic intra-project ordering.
    pub client_email: String,
}

/// The subset of a service-account key file this system cares about.
/// Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    project_id: String,
    client_email: String,
}

/// Recursively load every credential file under `dir`.
///
/// Fails with `NotFound` when the directory is missing and with
/// `MalformedCredential` when any `.json` file does not parse into the
/// expected shape. An empty result is returned as-is; callers treat it as a
/// fatal startup condition for the group.
pub fn load_credentials(dir: &Path) -> Result<Vec<CredentialRecord>, RotatorError> {
    if !dir.is_dir() {
        return Err(RotatorError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|err| {
            RotatorError::config(format!("cannot walk {}: {}", dir.display(), err))
        })?;
        if !entry.file_type().is_file() || !has_json_extension(entry.path()) {
            continue;
        }
        records.push(read_credential(entry.path())?);
    }

    tracing::info!(
        "discovered {} credential files under {}",
        records.len(),
        dir.display()
    );
    Ok(records)
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_credential(path: &Path) -> Result<CredentialRecord, RotatorError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| RotatorError::malformed_credential(path, err.to_string()))?;

    let key: ServiceAccountKey = serde_json::from_str(&raw)
        .map_err(|err| RotatorError::malformed_credential(path, err.to_string()))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RotatorError::malformed_credential(path, "non-UTF8 file name"))?
        .to_string();

    Ok(CredentialRecord {
        file_name,
        file_path: path.to_path_buf(),
        project_id: key.project_id,
        client_email: key.client_email,
    })
}
