//! Logging setup for qbot using tracing.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogSettings;

/// Install the global subscriber: a daily rolling file plus optional stderr.
///
/// Logs are flushed for as long as the returned guard is alive.
pub fn init(settings: &LogSettings) -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = settings.resolved_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, &settings.file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = settings
        .console
        .then(|| fmt::layer().with_writer(std::io::stderr).boxed());

    tracing_subscriber::registry()
        .with(filter(settings))
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(
        "Logging to {}",
        log_dir.join(&settings.file_name).display()
    );

    Ok((guard, log_dir))
}

fn filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}
