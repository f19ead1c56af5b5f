use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for the application.
///
/// Called once at startup, before anything that can log.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
