//! ARC Assistant - command-line front end for the ARC Hub assistant.

mod cli;

use std::process::ExitCode;

use arc_assistant::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {e}");
    }

    let code = match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting with error");
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{action}");
            }
            ExitCode::FAILURE
        }
    };

    logging::shutdown();
    code
}
