mod auth;
mod cancel;
mod cli;
mod cloud;
mod commands;
mod config;
mod error;
mod output;
mod time;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use commands::CommandStatus;
use error::BuildToolError;
use log::{error, info};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ccbuild");

    match cli.execute().await {
        Ok(CommandStatus::Success) => ExitCode::SUCCESS,
        Ok(CommandStatus::PartialFailure) => ExitCode::from(EXIT_FAILURE),
        Err(err) => {
            error!("{err:?}");
            match config_error(&err) {
                Some(config) => {
                    eprintln!("{}", output::Tone::Failure.paint(format!("Configuration error: {config}")));
                    ExitCode::from(EXIT_CONFIG)
                }
                None => {
                    eprintln!("{}", output::Tone::Failure.paint(format!("{err:#}")));
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
    }
}

/// Finds a configuration error anywhere in the error chain.
fn config_error(err: &anyhow::Error) -> Option<&BuildToolError> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<BuildToolError>())
        .find(|e| e.is_config())
}
