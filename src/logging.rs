use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CENTELHA_LOG";

/// Send tracing output to a daily log file; stderr is owned by the TUI.
///
/// Returns `None` and keeps running without logs when the log directory is unusable.
/// The guard flushes pending lines on drop, keep it alive in `main`.
pub fn init() -> Option<WorkerGuard> {
    match log_dir().and_then(|dir| init_in(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            // The terminal is not in raw mode yet, so this still reaches the user
            eprintln!("warning: logging disabled: {:#}", e);
            None
        }
    }
}

pub fn init_in(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, "centelha.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))?;

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    }
}

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;

    Ok(data_dir.join("centelha").join("logs"))
}
