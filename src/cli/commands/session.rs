use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_controller, Command};
use crate::config::CheckoutConfig;
use crate::display::ConsoleDisplay;
use crate::terminal::SimulatedTerminal;
use crate::workflows::CheckoutController;

/// One line typed at the session prompt
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct SessionLine {
    #[command(subcommand)]
    action: SessionAction,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum SessionAction {
    /// Look for readers
    Discover {
        /// Physical readers instead of the simulated one
        #[arg(long)]
        physical: bool,
    },
    /// Connect to a reader from the last discovery
    Connect {
        /// Position in the reader list
        index: usize,
    },
    /// Create a payment intent and show the cart on the reader
    Checkout {
        /// Amount in the currency's minor unit
        amount: Option<u64>,
        /// Currency code
        currency: Option<String>,
    },
    /// Collect a card and process the payment
    Collect,
    /// Capture the processed payment
    Capture,
    /// Read a card to save for later
    SaveCard,
    /// Simulate the reader dropping its connection
    Unplug,
    /// Show where the checkout stands
    Status,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

pub struct SessionCommand {
    pub config: CheckoutConfig,
}

impl SessionCommand {
    async fn run_action(
        &self,
        controller: &mut CheckoutController,
        terminal: &SimulatedTerminal,
        action: SessionAction,
    ) {
        // Step failures are already on the status line
        let _ = match action {
            SessionAction::Discover { physical } => controller
                .discover_readers(!physical && self.config.terminal.simulated)
                .await
                .map(|_| ()),
            SessionAction::Connect { index } => {
                controller.connect_reader(index).await.map(|_| ())
            }
            SessionAction::Checkout { amount, currency } => {
                let amount = amount.unwrap_or(self.config.checkout.amount);
                let currency = currency.unwrap_or_else(|| self.config.checkout.currency.clone());
                controller
                    .initiate_checkout(amount, &currency)
                    .await
                    .map(|_| ())
            }
            SessionAction::Collect => controller.collect_payment().await.map(|_| ()),
            SessionAction::Capture => controller.capture_payment().await.map(|_| ()),
            SessionAction::SaveCard => controller.save_card_for_later().await.map(|_| ()),
            SessionAction::Unplug => {
                terminal.trigger_disconnect();
                Ok(())
            }
            SessionAction::Status => {
                controller.sync_gateway_events();
                print_status(controller);
                Ok(())
            }
            SessionAction::Quit => Ok(()),
        };
    }
}

fn print_status(controller: &CheckoutController) {
    let session = controller.session();
    println!("📊 Stage: {}", controller.stage());
    println!("   Readers discovered: {}", session.discovered_readers().len());
    match session.connected_reader() {
        Some(reader) => println!("   Connected reader: {} ({})", reader.id, reader.label),
        None => println!("   Connected reader: none"),
    }
    match session.payment_intent() {
        Some(intent) => println!("   Payment intent: {} [{}]", intent.id, intent.status),
        None => println!("   Payment intent: none"),
    }
}

impl Command for SessionCommand {
    async fn execute(&self) -> Result<()> {
        let terminal = SimulatedTerminal::new();
        let mut controller =
            build_controller(&self.config, terminal.clone(), Arc::new(ConsoleDisplay))?;

        println!("🧾 Terminal checkout session (backend {})", self.config.backend.host);
        println!("   Type 'help' for the list of steps, 'quit' to leave");
        controller.initialize()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("checkout> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            let action = match SessionLine::try_parse_from(words) {
                Ok(parsed) => parsed.action,
                Err(e) => {
                    let _ = e.print();
                    continue;
                }
            };
            if action == SessionAction::Quit {
                break;
            }
            self.run_action(&mut controller, &terminal, action).await;
        }

        println!("👋 Session closed");
        Ok(())
    }
}
