use std::path::PathBuf;

use clap::Parser;

/// Service-account rotator CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "sa-rotator",
    version,
    about = "Rotates service-account credentials across rclone remotes"
)]
pub struct Cli {
    /// Path to the rotator configuration file
    #[arg(long, short, default_value = "rotator.yaml")]
    pub config: PathBuf,

    /// Override the configured poll interval (seconds)
    #[arg(long)]
    pub poll_interval: Option<u64>,
}
