use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::Cli;

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub strict_sequencing: bool,
    pub log_filter: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let api_url = normalize_api_url(&cli.api_url)?;
        let timeout = Duration::from_secs(cli.timeout_secs.max(1));
        let log_filter = cli
            .log
            .as_deref()
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string();

        Ok(Self {
            api_url,
            connect_timeout: timeout,
            read_timeout: timeout,
            strict_sequencing: cli.strict,
            log_filter,
        })
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("API URL is empty");
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("API URL must start with http:// or https://, got `{trimmed}`");
    }
    Ok(trimmed.to_string())
}
