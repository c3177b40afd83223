use anyhow::{Context, Result};
use std::sync::Arc;

use super::{build_controller, Command};
use crate::config::CheckoutConfig;
use crate::display::ConsoleDisplay;
use crate::terminal::{CardScenario, SimulatedTerminal};

/// Runs discover → connect → checkout → collect → capture without stopping
pub struct DemoCommand {
    pub config: CheckoutConfig,
    pub amount: Option<u64>,
    pub currency: Option<String>,
    pub decline: bool,
}

impl Command for DemoCommand {
    async fn execute(&self) -> Result<()> {
        let terminal = SimulatedTerminal::new();
        if self.decline {
            terminal.set_card_scenario(CardScenario::Decline(
                "Your card was declined.".to_string(),
            ));
        }

        let mut controller =
            build_controller(&self.config, terminal, Arc::new(ConsoleDisplay))?;
        let amount = self.amount.unwrap_or(self.config.checkout.amount);
        let currency = self
            .currency
            .clone()
            .unwrap_or_else(|| self.config.checkout.currency.clone());

        println!("🧾 Checkout demo against {}", self.config.backend.host);
        controller.initialize()?;

        let found = controller
            .discover_readers(self.config.terminal.simulated)
            .await?;
        if found == 0 {
            anyhow::bail!("No readers discovered");
        }
        controller.connect_reader(0).await?;

        let intent = controller
            .initiate_checkout(amount, &currency)
            .await
            .context("Checkout could not be started")?;
        controller
            .collect_payment()
            .await
            .with_context(|| format!("Payment for {} was not processed", intent.id))?;
        let captured = controller
            .capture_payment()
            .await
            .with_context(|| format!("Payment {} was not captured", intent.id))?;

        println!("🎉 Done: {amount} {currency} captured as {captured}");
        Ok(())
    }
}
