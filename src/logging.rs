use tracing_subscriber::{EnvFilter, fmt};

/// Installs the log subscriber. Filters come from `RUST_LOG`, `info` when unset.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    tracing::debug!("Logging setup complete.");
}
