use serde::{Deserialize, Serialize};
use std::fmt;

use crate::terminal::Reader;

/// Lifecycle of the active payment intent as seen from this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresCapture,
    Captured,
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Captured => "captured",
        };
        f.write_str(name)
    }
}

/// The payment intent the current checkout works against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRecord {
    pub id: String,
    pub client_secret: String,
    pub status: IntentStatus,
}

impl PaymentIntentRecord {
    pub fn new(id: &str, client_secret: &str) -> Self {
        Self {
            id: id.to_string(),
            client_secret: client_secret.to_string(),
            status: IntentStatus::RequiresPaymentMethod,
        }
    }
}

/// Everything a checkout session remembers between steps.
///
/// Lives as long as its controller; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    discovered_readers: Vec<Reader>,
    connected_reader: Option<Reader>,
    payment_intent: Option<PaymentIntentRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discovered_readers(&self) -> &[Reader] {
        &self.discovered_readers
    }

    /// Replace the previous discovery result wholesale
    pub fn replace_discovered_readers(&mut self, readers: Vec<Reader>) {
        self.discovered_readers = readers;
    }

    /// Reader at `index` in the last discovery result
    pub fn discovered_reader(&self, index: usize) -> Option<&Reader> {
        self.discovered_readers.get(index)
    }

    pub fn connected_reader(&self) -> Option<&Reader> {
        self.connected_reader.as_ref()
    }

    pub fn set_connected_reader(&mut self, reader: Reader) {
        self.connected_reader = Some(reader);
    }

    pub fn clear_connected_reader(&mut self) -> Option<Reader> {
        self.connected_reader.take()
    }

    pub fn payment_intent(&self) -> Option<&PaymentIntentRecord> {
        self.payment_intent.as_ref()
    }

    /// Start tracking a new intent, dropping whatever came before
    pub fn replace_payment_intent(&mut self, intent: PaymentIntentRecord) {
        self.payment_intent = Some(intent);
    }

    /// Move the active intent to `status`; returns false when there is none
    pub fn update_intent_status(&mut self, status: IntentStatus) -> bool {
        match self.payment_intent.as_mut() {
            Some(intent) => {
                intent.status = status;
                true
            }
            None => false,
        }
    }
}
