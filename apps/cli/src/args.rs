//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "factgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect which fact sections a configuration enables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every module with its final state and origin, repairing conflicts
    Plan {
        /// Configuration file (defaults to `factgate.*` in the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration with its own validation mode; fails on rejected conflicts
    Check {
        /// Configuration file (defaults to `factgate.*` in the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Plan { config } | Self::Check { config } => config.as_deref(),
        }
    }
}
