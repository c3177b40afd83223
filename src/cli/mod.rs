use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "terminal-checkout")]
#[command(about = "Drive a card reader through an in-person checkout")]
#[command(long_about = "Discovers a card reader, connects to it, has the payment backend create a \
                       payment intent, collects a card on the reader and captures the payment. \
                       Start with 'terminal-checkout session' and type 'help'.")]
pub struct Cli {
    /// Payment backend base URL, overrides the configured host
    #[arg(long, global = true)]
    pub backend: Option<String>,
    /// Discover physical readers instead of the simulated one
    #[arg(long, global = true)]
    pub physical: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session: run each checkout step by hand (default)
    Session,
    /// Run the whole checkout against the simulated reader in one go
    Demo {
        /// Amount in the currency's minor unit
        #[arg(long)]
        amount: Option<u64>,
        /// Currency code
        #[arg(long)]
        currency: Option<String>,
        /// Make the simulated card decline during processing
        #[arg(long)]
        decline: bool,
    },
    /// Show the effective configuration, or write it to a file
    Config {
        /// Write the configuration as TOML to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },
}
