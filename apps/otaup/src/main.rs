//! otaup - OTA firmware updater for constrained devices
//!
//! Thin CLI over the update engine: resolve configuration, run one check or
//! one update attempt, report the outcome. Retry policy belongs to whatever
//! boot loop invokes this binary.

mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use otaup_config::Config;
use otaup_engine::Updater;
use otaup_errors::Result;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("command failed: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Precedence, lowest first: defaults, config file, environment, flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env();
    apply_cli_config(&mut config, &cli);

    init_tracing(config.verbose);

    let updater = Updater::new(config)?;

    match cli.command {
        Commands::Check => {
            let check = updater.check().await?;
            println!("installed: {}", check.installed);
            if check.available.filename.is_empty() {
                println!("available: none");
            } else {
                println!("available: {}", check.available.version);
            }
            println!("update due: {}", if check.update_due { "yes" } else { "no" });
        }
        Commands::Update { .. } => {
            if updater.install_update_if_available().await? {
                println!(
                    "Update installed; restart the device to run the new version."
                );
            } else {
                println!("Already up to date.");
            }
        }
    }

    Ok(())
}

fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.global.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(root) = &cli.global.root {
        config.root.clone_from(root);
    }
    if cli.global.verbose {
        config.verbose = true;
    }
    if matches!(cli.command, Commands::Update { force: true }) {
        config.force_update = true;
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();
}
