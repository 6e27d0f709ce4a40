//! Stubtree CLI entry point.

use clap::Parser;
use stubtree::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

/// Log filter variable; defaults to warnings only.
const LOG_ENV: &str = "STUBTREE_LOG";

fn setup_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    setup_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Index(args) => cli::run_index(args, config),
        Commands::Show(args) => cli::run_show(args, config),
        Commands::Find(args) => cli::run_find(args, config),
        Commands::Invalidate(args) => cli::run_invalidate(args, config),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
