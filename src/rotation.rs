//! Rotation queues and the balanced usage-order builder.
//!
//! A [`RotationGroup`] owns the ordered queue of credentials for one
//! configured directory (front = next to activate). The queue's membership
//! is fixed at startup; rotation and recovery only reorder it. The order
//! builder interleaves projects round-robin so no single project's accounts
//! are exhausted before the others are touched.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use crate::config::RemoteBinding;
use crate::credentials::CredentialRecord;
use crate::error::RotatorError;

/// One credential directory plus the ordered queue of its credentials.
#[derive(Debug, Clone)]
pub struct RotationGroup {
    group_key: PathBuf,
    queue: VecDeque<CredentialRecord>,
}

/// A rotation group together with the remotes it serves; the unit the
/// scheduler iterates over. Owned exclusively by the scheduler once
/// recovery hands it off.
#[derive(Debug)]
pub struct GroupState {
    pub group: RotationGroup,
    pub bindings: Vec<RemoteBinding>,
}

impl RotationGroup {
    /// Build the group's queue from the discovered records, in balanced
    /// usage order. An empty record set is fatal for the group.
    pub fn build(
        group_key: PathBuf,
        records: Vec<CredentialRecord>,
    ) -> Result<Self, RotatorError> {
        if records.is_empty() {
            return Err(RotatorError::EmptyCredentialSet { path: group_key });
        }
        Ok(Self {
            group_key,
            queue: build_usage_order(records).into(),
        })
    }

    /// The credential directory this group was built from; also the lookup
    /// key into the remote-binding configuration.
    pub fn group_key(&self) -> &PathBuf {
        &self.group_key
    }

    /// The next credential to activate.
    pub fn front(&self) -> &CredentialRecord {
        self.queue.front().expect("rotation queue is never empty")
    }

    /// Rotate front to back. Called exactly once per successful swap.
    pub fn advance(&mut self) {
        if let Some(front) = self.queue.pop_front() {
            self.queue.push_back(front);
        }
    }

    /// Move the record with the given file name to the back of the queue,
    /// so the next front differs from it. Returns `false` when no record
    /// matches. Idempotent for an unchanged name.
    pub fn demote(&mut self, file_name: &str) -> bool {
        let Some(index) = self.queue.iter().position(|r| r.file_name == file_name) else {
            return false;
        };
        let record = self.queue.remove(index).expect("index from position");
        self.queue.push_back(record);
        true
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue contents, front first.
    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.queue.iter()
    }
}

/// Interleave the records round-robin across `project_id` values,
/// alphabetical by `client_email` within a project.
///
/// Projects are visited in a stable order; for index `i` the output takes
/// the `i`-th member of every project that has one, so consecutive entries
/// rarely share a project. Unequal project sizes are advisory only.
pub fn build_usage_order(records: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
    let mut projects: BTreeMap<String, Vec<CredentialRecord>> = BTreeMap::new();
    for record in records {
        projects.entry(record.project_id.clone()).or_default().push(record);
    }
    for members in projects.values_mut() {
        members.sort_by(|a, b| a.client_email.cmp(&b.client_email));
    }

    let largest = projects.values().map(Vec::len).max().unwrap_or(0);
    let short_projects: Vec<&str> = projects
        .iter()
        .filter(|(_, members)| members.len() < largest)
        .map(|(project, _)| project.as_str())
        .collect();
    if !short_projects.is_empty() {
        tracing::warn!(
            "projects {:?} have fewer accounts than the largest ({}); rotation proceeds unevenly",
            short_projects,
            largest,
        );
    }

    let mut ordered = Vec::with_capacity(projects.values().map(Vec::len).sum());
    for i in 0..largest {
        for members in projects.values() {
            if let Some(record) = members.get(i) {
                ordered.push(record.clone());
            }
        }
    }
    ordered
}
