mod cli;
mod commands;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use clap::Parser;
use shieldopt::engine::cancel::CancelToken;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        error!("{}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("shieldopt v{} starting up", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let token = CancelToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel()).map_err(|e| {
            CliError::Other(anyhow::anyhow!("Failed to install interrupt handler: {e}"))
        })?;
    }

    match cli.command {
        Commands::Run(args) => commands::run(args, token),
    }
}
