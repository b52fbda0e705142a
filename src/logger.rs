//! Logging setup.
//!
//! Call sites use the `log` macros; [`init`] installs a `fern` dispatcher that
//! writes timestamped lines to a file and, optionally, to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "tasksync.log";

/// Default log file location: `<data_local_dir>/tasksync/tasksync.log`.
pub fn get_log_file_path() -> Result<PathBuf> {
    dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
        .map(|dir| dir.join("tasksync").join(LOG_FILE_NAME))
}

/// Resolve the log file for a configuration, falling back to the default location.
pub fn resolve_log_file(config: &LoggingConfig) -> Result<PathBuf> {
    match &config.file {
        Some(file) => Ok(PathBuf::from(file)),
        None => get_log_file_path(),
    }
}

/// Install the global logger. Returns the file being written, or `None` when
/// logging is disabled.
///
/// Fails if a global logger was already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let path = resolve_log_file(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let log_file =
        fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.level_filter())
        // sqlx and hyper are chatty at debug level
        .level_for("sqlx", log::LevelFilter::Warn)
        .level_for("hyper", log::LevelFilter::Warn)
        .chain(log_file);

    if config.stderr {
        dispatch = dispatch.chain(std::io::stderr());
    }

    dispatch.apply().context("Failed to install logger")?;

    log::info!("📝 Logging to {}", path.display());
    Ok(Some(path))
}
