//! The swap loop.
//!
//! Drives rotation forever: each pass walks every group and every remote
//! bound to it, strictly sequentially, swapping in the queue's front
//! credential. A failed swap freezes that group's queue and never blocks
//! sibling remotes; a successful one rotates the queue front to back.
//! Between passes the loop sleeps for the configured interval. The whole
//! loop is cancellable at group and remote boundaries and during the sleep,
//! never mid-command. Once stopped it never restarts.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::alerts::{Notifier, Severity};
use crate::config::RemoteBinding;
use crate::error::RotatorError;
use crate::rotation::{GroupState, RotationGroup};
use crate::services::ControlEndpoint;

/// How a pass over the groups ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    /// Shutdown was requested at a group or remote boundary.
    Interrupted,
}

/// Run the rotation loop until cancellation.
///
/// Cancellation during the inter-pass sleep is a normal exit, not an error.
/// The only error that escapes is a fatal one (`ResultParseFailed`), which
/// the caller turns into process shutdown.
pub async fn run_rotation(
    mut groups: Vec<GroupState>,
    control: Arc<dyn ControlEndpoint>,
    notifier: Arc<Notifier>,
    poll_interval_seconds: u64,
    shutdown: CancellationToken,
) -> Result<(), RotatorError> {
    tracing::info!(
        "rotation started ({} groups, pass interval {}s)",
        groups.len(),
        poll_interval_seconds,
    );

    loop {
        let outcome = rotate_pass(
            &mut groups,
            control.as_ref(),
            notifier.as_ref(),
            poll_interval_seconds,
            &shutdown,
        )
        .await?;
        if outcome == PassOutcome::Interrupted {
            tracing::info!("shutdown requested; rotation stopped");
            return Ok(());
        }

        tokio::select! {
            _ = time::sleep(Duration::from_secs(poll_interval_seconds)) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown requested during dwell; rotation stopped");
                return Ok(());
            }
        }
    }
}

/// One full pass over all groups and their remotes. Extracted from
/// [`run_rotation`] for testability.
pub async fn rotate_pass(
    groups: &mut [GroupState],
    control: &dyn ControlEndpoint,
    notifier: &Notifier,
    dwell_seconds: u64,
    shutdown: &CancellationToken,
) -> Result<PassOutcome, RotatorError> {
    for state in groups.iter_mut() {
        if shutdown.is_cancelled() {
            return Ok(PassOutcome::Interrupted);
        }
        let GroupState { group, bindings } = state;
        for binding in bindings.iter() {
            if shutdown.is_cancelled() {
                return Ok(PassOutcome::Interrupted);
            }
            swap_remote(group, binding, control, notifier, dwell_seconds).await?;
        }
    }
    Ok(PassOutcome::Completed)
}

/// Swap the queue's front credential onto one remote.
///
/// Nonzero exit: error notification naming the remote, queue untouched so
/// the same credential is retried next pass, `Ok` so siblings proceed. A
/// malformed success payload is fatal and propagates.
async fn swap_remote(
    group: &mut RotationGroup,
    binding: &RemoteBinding,
    control: &dyn ControlEndpoint,
    notifier: &Notifier,
    dwell_seconds: u64,
) -> Result<(), RotatorError> {
    let credential = group.front().clone();
    tracing::debug!(
        "remote {}: swapping in {} via {}",
        binding.remote,
        credential.file_name,
        binding.address,
    );

    match control.swap_credential(binding, &credential.file_path).await {
        Ok(result) => {
            group.advance();
            notifier
                .notify(
                    Severity::Info,
                    &format!(
                        "remote {}: credential swapped {} -> {}; next rotation in {}s",
                        binding.remote, result.previous, result.current, dwell_seconds,
                    ),
                )
                .await;
            Ok(())
        }
        Err(err @ RotatorError::ResultParseFailed { .. }) => Err(err),
        Err(err) => {
            notifier
                .notify(
                    Severity::Error,
                    &format!("swap failed for remote {}: {err}", binding.remote),
                )
                .await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::alerts::capture::CaptureChannel;
    use crate::config::NotificationSettings;
    use crate::credentials::CredentialRecord;
    use crate::services::mock_rclone::MockControlEndpoint;

    fn make_record(name: &str, project: &str, email: &str) -> CredentialRecord {
        CredentialRecord {
            file_name: name.to_string(),
            file_path: PathBuf::from(format!("/sa/{name}")),
            project_id: project.to_string(),
            client_email: email.to_string(),
        }
    }

    fn make_state(remotes: &[&str]) -> GroupState {
        let group = RotationGroup::build(
            PathBuf::from("/sa"),
            vec![
                make_record("a1.json", "proj-a", "a1@proj-a.iam"),
                make_record("a2.json", "proj-a", "a2@proj-a.iam"),
                make_record("b1.json", "proj-b", "b1@proj-b.iam"),
            ],
        )
        .unwrap();
        let bindings = remotes
            .iter()
            .map(|remote| RemoteBinding {
                remote: remote.to_string(),
                address: "localhost:5572".to_string(),
            })
            .collect();
        GroupState { group, bindings }
    }

    fn make_notifier() -> (Notifier, Arc<CaptureChannel>) {
        let channel = Arc::new(CaptureChannel::new());
        let notifier = Notifier::new(
            NotificationSettings {
                targets: vec!["tgram://t".to_string()],
                errors_only: false,
            },
            channel.clone(),
        );
        (notifier, channel)
    }

    fn names(state: &GroupState) -> Vec<String> {
        state.group.iter().map(|r| r.file_name.clone()).collect()
    }

    // ---- successful swap ----

    #[tokio::test]
    async fn successful_swap_advances_queue_and_notifies() {
        let mut groups = vec![make_state(&["gdrive"])];
        let control = MockControlEndpoint::new().with_active("gdrive", "a0.json");
        let (notifier, channel) = make_notifier();
        let shutdown = CancellationToken::new();

        let outcome = rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, PassOutcome::Completed);
        assert_eq!(names(&groups[0]), vec!["b1.json", "a2.json", "a1.json"]);

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].message.contains("a0.json -> a1.json"));
        assert!(sent[0].message.contains("600s"));
    }

    #[tokio::test]
    async fn swap_sends_the_queue_front_path() {
        let mut groups = vec![make_state(&["gdrive"])];
        let control = MockControlEndpoint::new();
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();

        rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        let calls = control.swap_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].remote, "gdrive");
        assert_eq!(calls[0].address, "localhost:5572");
        assert_eq!(calls[0].credential, PathBuf::from("/sa/a1.json"));
    }

    // ---- failed swap ----

    #[tokio::test]
    async fn failed_swap_leaves_queue_unchanged_and_notifies_error() {
        let mut groups = vec![make_state(&["gdrive"])];
        let before = names(&groups[0]);
        let control = MockControlEndpoint::new().with_swap_error("gdrive");
        let (notifier, channel) = make_notifier();
        let shutdown = CancellationToken::new();

        let outcome = rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, PassOutcome::Completed);
        assert_eq!(names(&groups[0]), before);

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].message.contains("gdrive"));
        assert!(sent[0].message.contains("ERROR"));
    }

    #[tokio::test]
    async fn failed_remote_does_not_block_siblings() {
        let mut groups = vec![make_state(&["gdrive", "gphotos"])];
        let control = MockControlEndpoint::new().with_swap_error("gdrive");
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();

        rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        let calls = control.swap_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].remote, "gphotos");
        // Only the gphotos swap succeeded, so the queue advanced once.
        assert_eq!(names(&groups[0]), vec!["b1.json", "a2.json", "a1.json"]);
    }

    #[tokio::test]
    async fn failed_group_does_not_block_the_next_group() {
        let mut groups = vec![make_state(&["gdrive"]), make_state(&["gphotos"])];
        let control = MockControlEndpoint::new().with_swap_error("gdrive");
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();

        rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        assert_eq!(control.swap_calls().len(), 2);
        assert_eq!(names(&groups[1]), vec!["b1.json", "a2.json", "a1.json"]);
    }

    // ---- fatal payload mismatch ----

    #[tokio::test]
    async fn unusable_success_payload_is_fatal() {
        let mut groups = vec![make_state(&["gdrive"])];
        let before = names(&groups[0]);
        let control = MockControlEndpoint::new().with_parse_failure("gdrive");
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();

        let err = rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap_err();

        assert!(matches!(err, RotatorError::ResultParseFailed { .. }));
        assert_eq!(names(&groups[0]), before);
    }

    // ---- cancellation ----

    #[tokio::test]
    async fn cancelled_token_interrupts_before_any_swap() {
        let mut groups = vec![make_state(&["gdrive"])];
        let control = MockControlEndpoint::new();
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let outcome = rotate_pass(&mut groups, &control, &notifier, 600, &shutdown)
            .await
            .unwrap();

        assert_eq!(outcome, PassOutcome::Interrupted);
        assert!(control.swap_calls().is_empty());
    }

    #[tokio::test]
    async fn run_rotation_exits_cleanly_when_already_cancelled() {
        let groups = vec![make_state(&["gdrive"])];
        let control: Arc<dyn ControlEndpoint> = Arc::new(MockControlEndpoint::new());
        let (notifier, _channel) = make_notifier();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = run_rotation(groups, control, Arc::new(notifier), 600, shutdown).await;
        assert!(result.is_ok());
    }
}
