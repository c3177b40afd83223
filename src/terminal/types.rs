// Reader, cart and intent types exchanged with the terminal gateway

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A card reader as reported by discovery.
///
/// The gateway needs the whole descriptor to connect, not just the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: String,
    pub location: String,
    pub label: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub status: Option<ReaderStatus>,
}

impl Reader {
    pub fn new(id: &str, location: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            location: location.to_string(),
            label: label.to_string(),
            serial_number: None,
            device_type: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderStatus {
    Online,
    Offline,
}

/// Options passed to reader discovery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub simulated: bool,
}

/// Cart shown on the reader's screen while the customer pays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub line_items: Vec<LineItem>,
    pub tax: u64,
    pub total: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: u64,
    pub quantity: u32,
}

impl Cart {
    /// The fixed sample cart pushed to the reader during checkout
    pub fn sample(currency: &str) -> Self {
        Self {
            line_items: vec![LineItem {
                description: "Sample item".to_string(),
                amount: 4400,
                quantity: 1,
            }],
            tax: 400,
            total: 4800,
            currency: currency.to_string(),
        }
    }
}

/// Intent returned by card collection, to be handed back for processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedIntent {
    pub id: String,
    pub client_secret: String,
    pub payment_method_id: String,
}

/// Intent after the reader processed the payment, awaiting capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedIntent {
    pub id: String,
    pub amount_capturable: Option<u64>,
}

/// Card saved for later use, outside of any payment intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
}

/// Error object returned by the gateway for a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TerminalError {
    pub message: String,
    pub code: Option<String>,
}

impl TerminalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_cart_totals_add_up() {
        let cart = Cart::sample("usd");
        let items: u64 = cart
            .line_items
            .iter()
            .map(|item| item.amount * item.quantity as u64)
            .sum();
        assert_eq!(items + cart.tax, cart.total);
        assert_eq!(cart.currency, "usd");
    }

    #[test]
    fn test_terminal_error_displays_message_only() {
        let err = TerminalError::new("Card was declined").with_code("card_declined");
        assert_eq!(err.to_string(), "Card was declined");
        assert_eq!(err.code.as_deref(), Some("card_declined"));
    }
}
