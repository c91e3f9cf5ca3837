//! atomfile: atomic, locked file operations from the command line.
//!
//! This is the main entry point for the `atomfile` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

use atomfile::cli::Cli;
use atomfile::{commands, exit_codes, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
