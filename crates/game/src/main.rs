mod app;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use app::{dispatch, init_tracing, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!(version = env!("CARGO_PKG_VERSION"), "=== Pawsess Startup ===");

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command_failed");
            ExitCode::FAILURE
        }
    }
}
