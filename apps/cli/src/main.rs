#![allow(clippy::print_stderr, clippy::print_stdout)]

mod args;
mod commands;

use crate::args::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use factgate::domain::config::FactsConfig;
use factgate::kernel::config::load_config;
use factgate::logger::Logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config: FactsConfig =
        load_config(cli.command.config_path()).context("Configuration could not be loaded")?;
    let _log = Logger::builder().name(env!("CARGO_BIN_NAME")).config(&config.logging).init()?;

    match cli.command {
        Commands::Plan { .. } => commands::plan(&config),
        Commands::Check { .. } => commands::check(&config),
    }
}
