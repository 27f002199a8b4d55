//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// otaup - OTA firmware updater for constrained devices
#[derive(Parser)]
#[command(name = "otaup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch, verify and install firmware updates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Use a config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the update server
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory the live and staging trees live under
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Enable per-step log detail
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Report the installed and latest available version
    Check,

    /// Install the latest version if one is available
    #[command(alias = "up")]
    Update {
        /// Install regardless of version ordering
        #[arg(long)]
        force: bool,
    },
}
