use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use sa_rotator::alerts::apprise::AppriseChannel;
use sa_rotator::alerts::{Notifier, Severity};
use sa_rotator::cli::Cli;
use sa_rotator::config::Config;
use sa_rotator::credentials::load_credentials;
use sa_rotator::error::RotatorError;
use sa_rotator::logging::init_logging;
use sa_rotator::recovery::align_with_active_state;
use sa_rotator::rotation::{GroupState, RotationGroup};
use sa_rotator::scheduler::run_rotation;
use sa_rotator::services::rclone::RcloneClient;
use sa_rotator::services::ControlEndpoint;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(interval) = cli.poll_interval {
        if interval == 0 {
            tracing::error!("--poll-interval must be greater than zero");
            return ExitCode::FAILURE;
        }
        config.poll_interval = interval;
    }

    let notifier = Arc::new(Notifier::new(
        config.notifications.clone(),
        Arc::new(AppriseChannel),
    ));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; requesting shutdown");
                shutdown.cancel();
            }
        });
    }

    match run(config, notifier.clone(), shutdown.clone()).await {
        Ok(()) => {
            tracing::info!("rotation stopped cleanly");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("fatal: {err}");
            notifier
                .notify(
                    Severity::Critical,
                    &format!("service-account rotator shutting down: {err}"),
                )
                .await;
            shutdown.cancel();
            ExitCode::FAILURE
        }
    }
}

/// Startup pipeline and loop handoff: discover credentials, build balanced
/// queues, align them with live external state, then rotate until shutdown.
async fn run(
    config: Config,
    notifier: Arc<Notifier>,
    shutdown: CancellationToken,
) -> Result<(), RotatorError> {
    let control: Arc<dyn ControlEndpoint> = Arc::new(RcloneClient::new(config.rc.clone()));

    let mut groups = Vec::with_capacity(config.groups.len());
    for dir in config.groups.keys() {
        let records = load_credentials(dir)?;
        let group = RotationGroup::build(dir.clone(), records)?;
        let bindings = config.bindings_for(dir);
        groups.push(GroupState { group, bindings });
    }

    align_with_active_state(&mut groups, control.as_ref()).await;

    run_rotation(groups, control, notifier, config.poll_interval, shutdown).await
}
