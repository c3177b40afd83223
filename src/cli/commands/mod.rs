use anyhow::{Context, Result};
use std::sync::Arc;

use crate::backend::HttpPaymentBackend;
use crate::config::CheckoutConfig;
use crate::display::StatusDisplay;
use crate::terminal::SimulatedTerminal;
use crate::workflows::CheckoutController;

pub mod config;
pub mod demo;
pub mod session;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Wire a controller to the configured backend and the given reader
pub fn build_controller(
    config: &CheckoutConfig,
    terminal: SimulatedTerminal,
    display: Arc<dyn StatusDisplay>,
) -> Result<CheckoutController> {
    let backend = HttpPaymentBackend::new(&config.backend.host, config.backend.request_timeout())
        .with_context(|| format!("Invalid backend host '{}'", config.backend.host))?;

    Ok(CheckoutController::new(
        Arc::new(terminal),
        Arc::new(backend),
        display,
        config.checkout.clone(),
    ))
}
