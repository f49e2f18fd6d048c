//! File logging setup. The terminal belongs to the chat renderer, so all
//! tracing output goes to an append-only log file through a non-blocking
//! writer. The returned guard must stay alive for the session.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Initialize the global subscriber. `RFCHAT_LOG` overrides the configured
/// level with a full filter directive string.
pub fn init(log_file: &Path, level: LogLevel) -> anyhow::Result<WorkerGuard> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env("RFCHAT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(guard)
}
