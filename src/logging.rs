// src/logging.rs
// =============================================================================
// Sends all tracing output to a fresh log file for this run.
//
// The file name carries the UTC start time without zero padding:
//   <path>/<name>-<year>-<month>-<day>-<hour>:<minute>.log
//   e.g. ./pagecrawl-2023-5-1-9:7.log
//
// Verbosity follows RUST_LOG, "info" when unset.
// =============================================================================

use crate::config::LogSettings;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Builds the log file path for a run started at `started`.
pub fn log_file_path(dir: &Path, name: &str, started: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "{}-{}-{}-{}-{}:{}.log",
        name,
        started.year(),
        started.month(),
        started.day(),
        started.hour(),
        started.minute()
    ))
}

/// Creates the log file and installs the global subscriber.
///
/// Failing to create the file is fatal for the run; the caller aborts.
pub fn init_logging(settings: &LogSettings) -> Result<PathBuf> {
    let path = log_file_path(&settings.path, &settings.name, Utc::now());
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(log = %path.display(), "logging initialized");

    Ok(path)
}
