use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter directive, e.g. `debug` or `notikeep_core=trace`
pub const LOG_FILTER_ENV: &str = "NOTIKEEP_LOG";
/// When set, logs are also appended to this file
pub const LOG_FILE_ENV: &str = "NOTIKEEP_LOG_FILE";

/// Install the global subscriber. `default_filter` applies when
/// [`LOG_FILTER_ENV`] is unset or invalid.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    if let Ok(log_path) = std::env::var(LOG_FILE_ENV) {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path))?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

        registry
            .with(file_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        tracing::info!(path = %log_path, "file logging enabled");
    } else {
        registry
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }
    Ok(())
}
