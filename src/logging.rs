use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::Command;
use crate::config::{Config, DEFAULT_LOG_FILTER};
use crate::paths::log_file_path;

/// Installs the global subscriber. The TUI owns the terminal, so in that mode
/// events go to a log file under the data directory instead of stderr.
pub fn init(config: &Config, command: Option<&Command>) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("failed to build log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if matches!(command, Some(Command::Tui) | None) {
        let path = log_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
    } else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
    }
    Ok(())
}
