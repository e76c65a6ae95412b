//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`health`].

pub mod health;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::error::GatewayError;

/// `env_file` is the `.env` file loaded before argument parsing, if any.
pub async fn dispatch(cli: Cli, env_file: Option<PathBuf>) -> Result<(), GatewayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args, env_file).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  edge-gateway v{version}: authenticating edge gateway\n\n  \
         No command provided. To get started:\n\n    \
         edge-gateway validate             Check AUTH/BLOG/USER/ASP_SERVICE_URL\n    \
         edge-gateway run                  Start the gateway on :8080\n    \
         edge-gateway --help               See all commands and options\n"
    );
}
