mod api;
mod app;
mod cli;
mod config;
mod db;
mod http;
mod logging;
mod model;
mod paths;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::from_cli(&cli)?;
    logging::init(&config, cli.command.as_ref())?;
    app::run(cli, config)
}
