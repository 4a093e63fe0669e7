mod cli;
mod client;
mod commands;
mod config;
mod document;
mod migrate;
mod model;
mod references;
mod sanitize;
mod session;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateDashboard(args) => commands::migrate_dashboard::run(args),
        Commands::MigrateVisualization(args) => commands::migrate_visualization::run(args),
        Commands::MigrateSemanticModel(args) => commands::migrate_semantic_model::run(args),
        Commands::Fetch(args) => commands::fetch::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Sanitize(args) => commands::sanitize::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
