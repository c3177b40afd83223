use anyhow::Result;
use clap::Parser;

use terminal_checkout::cli::commands::config::ConfigCommand;
use terminal_checkout::cli::commands::demo::DemoCommand;
use terminal_checkout::cli::commands::session::SessionCommand;
use terminal_checkout::cli::commands::Command;
use terminal_checkout::cli::{Cli, Commands};
use terminal_checkout::{config, init_config, init_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config()?.clone();
    if let Some(host) = cli.backend {
        config.backend.host = host;
    }
    if cli.physical {
        config.terminal.simulated = false;
    }

    init_telemetry(&config.observability)?;
    init_config()?;

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => SessionCommand { config }.execute().await,
        Commands::Demo {
            amount,
            currency,
            decline,
        } => {
            DemoCommand {
                config,
                amount,
                currency,
                decline,
            }
            .execute()
            .await
        }
        Commands::Config { write } => ConfigCommand { config, write }.execute().await,
    }
}
