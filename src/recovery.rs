//! Rotation state recovery.
//!
//! Runs once per remote at startup, sequentially, before the swap loop
//! begins: asks the control endpoint which credential the remote currently
//! has active and demotes it in the group's queue, so the first live swap
//! activates a different account than the one a previous process left
//! behind. Every failure here is degraded behavior (the built-in order
//! stands, a credential may repeat once), never fatal.

use crate::rotation::GroupState;
use crate::services::ControlEndpoint;

/// Align every group's queue with the externally active credentials.
pub async fn align_with_active_state(groups: &mut [GroupState], control: &dyn ControlEndpoint) {
    for state in groups.iter_mut() {
        for binding in &state.bindings {
            let active = match control.active_credential(binding).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    tracing::debug!(
                        "remote {} reports no active credential; keeping built order",
                        binding.remote,
                    );
                    continue;
                }
                Err(err) => {
                    tracing::warn!("{err}; keeping built order for remote {}", binding.remote);
                    continue;
                }
            };

            if state.group.demote(&active) {
                tracing::info!(
                    "remote {}: active credential {} moved to the back of the {} queue",
                    binding.remote,
                    active,
                    state.group.group_key().display(),
                );
            } else {
                tracing::warn!(
                    "remote {}: active credential {} is not among the discovered files; \
                     keeping built order",
                    binding.remote,
                    active,
                );
            }
        }
    }
}
