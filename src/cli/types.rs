//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{list::ListArgs, run::RunArgs, show::ShowArgs};

/// Top-level command line
#[derive(Parser, Debug)]
#[command(name = "dayloop")]
#[command(about = "Collect one chat answer per day into a local store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Extra YAML config merged over .dayloop/config.yaml
    #[arg(short, long, global = true, env = "DAYLOOP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one interaction per date in the range and store the answers
    Run(RunArgs),

    /// Show the stored record for a date
    Show(ShowArgs),

    /// List stored dates
    List(ListArgs),
}
