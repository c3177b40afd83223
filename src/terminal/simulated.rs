//! In-process simulated reader
//!
//! Mirrors what the vendor SDK does when discovery is asked for simulated
//! readers: a virtual device that accepts connections and "taps" a test card.
//! Physical discovery finds nothing here, since no hardware driver is linked.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::gateway::{GatewayCallbacks, GatewayFactory, TerminalGateway};
use super::types::{
    Cart, CollectedIntent, DiscoveryConfig, PaymentMethod, ProcessedIntent, Reader, ReaderStatus,
    TerminalError,
};

/// How the simulated card behaves on the next collection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardScenario {
    /// Card is read and the payment is authorized
    #[default]
    Approve,
    /// The reader fails to read the card
    CollectionFails(String),
    /// The card is read but processing declines it
    Decline(String),
}

#[derive(Default)]
struct SimulatorState {
    readers: Vec<Reader>,
    connected: Option<Reader>,
    display: Option<Cart>,
    scenario: CardScenario,
    connect_failure: Option<String>,
    callbacks: Option<GatewayCallbacks>,
}

/// Handle onto the simulated device, shared by the factory and its gateways.
///
/// Tests and the demo use it to script card outcomes and to pull the plug.
#[derive(Clone)]
pub struct SimulatedTerminal {
    state: Arc<Mutex<SimulatorState>>,
}

impl Default for SimulatedTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTerminal {
    pub fn new() -> Self {
        Self::with_readers(vec![Self::default_reader()])
    }

    pub fn with_readers(readers: Vec<Reader>) -> Self {
        let state = SimulatorState {
            readers,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The single virtual reader the simulator exposes by default
    pub fn default_reader() -> Reader {
        Reader {
            id: "SIMULATOR".to_string(),
            location: "Simulated location".to_string(),
            label: "Simulated Reader".to_string(),
            serial_number: Some("SIMULATOR".to_string()),
            device_type: Some("verifone_P400".to_string()),
            status: Some(ReaderStatus::Online),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulatorState> {
        // A poisoned lock only means a test panicked mid-operation
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_card_scenario(&self, scenario: CardScenario) {
        self.lock().scenario = scenario;
    }

    /// Make the next connection attempt fail with `message`
    pub fn fail_next_connect(&self, message: &str) {
        self.lock().connect_failure = Some(message.to_string());
    }

    pub fn connected_reader(&self) -> Option<Reader> {
        self.lock().connected.clone()
    }

    pub fn displayed_cart(&self) -> Option<Cart> {
        self.lock().display.clone()
    }

    /// Drop the connection as if the reader lost power, notifying the gateway owner
    pub fn trigger_disconnect(&self) {
        let handler = {
            let mut state = self.lock();
            let Some(reader) = state.connected.take() else {
                debug!("Disconnect requested with no reader connected");
                return;
            };
            state.display = None;
            warn!(reader_id = %reader.id, "Simulated reader disconnected");
            state
                .callbacks
                .as_ref()
                .map(|callbacks| callbacks.on_unexpected_disconnect.clone())
        };
        if let Some(handler) = handler {
            handler();
        }
    }

    fn require_connected(&self) -> Result<Reader, TerminalError> {
        self.lock().connected.clone().ok_or_else(|| {
            TerminalError::new("No reader is connected").with_code("no_reader_connected")
        })
    }
}

impl GatewayFactory for SimulatedTerminal {
    fn create(&self, callbacks: GatewayCallbacks) -> Box<dyn TerminalGateway> {
        self.lock().callbacks = Some(callbacks);
        Box::new(SimulatedGateway {
            terminal: self.clone(),
        })
    }
}

/// Gateway instance bound to a [`SimulatedTerminal`]
pub struct SimulatedGateway {
    terminal: SimulatedTerminal,
}

/// Intent id embedded in a client secret of the form `pi_xxx_secret_yyy`
fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

#[async_trait]
impl TerminalGateway for SimulatedGateway {
    async fn discover_readers(&self, config: DiscoveryConfig) -> Result<Vec<Reader>, TerminalError> {
        if !config.simulated {
            info!("No physical readers reachable from the simulator");
            return Ok(Vec::new());
        }
        Ok(self.terminal.lock().readers.clone())
    }

    async fn connect_reader(&self, reader: &Reader) -> Result<Reader, TerminalError> {
        let token_provider = self
            .terminal
            .lock()
            .callbacks
            .as_ref()
            .map(|callbacks| callbacks.token_provider.clone());

        let token = match token_provider {
            Some(provider) => provider.fetch_connection_token().await,
            None => None,
        };
        if token.is_none() {
            return Err(TerminalError::new("Unable to fetch a connection token")
                .with_code("connection_token_unavailable"));
        }

        let mut state = self.terminal.lock();
        if let Some(message) = state.connect_failure.take() {
            return Err(TerminalError::new(message).with_code("connection_failed"));
        }
        if !state.readers.iter().any(|known| known.id == reader.id) {
            return Err(TerminalError::new(format!("Reader {} was not found", reader.id))
                .with_code("reader_not_found"));
        }

        state.connected = Some(reader.clone());
        Ok(reader.clone())
    }

    async fn set_reader_display(&self, cart: &Cart) -> Result<(), TerminalError> {
        self.terminal.require_connected()?;
        self.terminal.lock().display = Some(cart.clone());
        Ok(())
    }

    async fn clear_reader_display(&self) -> Result<(), TerminalError> {
        self.terminal.require_connected()?;
        self.terminal.lock().display = None;
        Ok(())
    }

    async fn collect_payment_method(
        &self,
        client_secret: &str,
    ) -> Result<CollectedIntent, TerminalError> {
        self.terminal.require_connected()?;
        let intent_id = intent_id_from_secret(client_secret).ok_or_else(|| {
            TerminalError::new("The client secret is not valid").with_code("invalid_client_secret")
        })?;

        if let CardScenario::CollectionFails(message) = &self.terminal.lock().scenario {
            return Err(TerminalError::new(message.clone()).with_code("card_read_failed"));
        }

        Ok(CollectedIntent {
            id: intent_id.to_string(),
            client_secret: client_secret.to_string(),
            payment_method_id: format!("pm_{}", Uuid::new_v4().simple()),
        })
    }

    async fn process_payment(
        &self,
        intent: &CollectedIntent,
    ) -> Result<ProcessedIntent, TerminalError> {
        self.terminal.require_connected()?;

        if let CardScenario::Decline(message) = &self.terminal.lock().scenario {
            return Err(TerminalError::new(message.clone()).with_code("card_declined"));
        }

        let amount_capturable = self
            .terminal
            .lock()
            .display
            .as_ref()
            .map(|cart| cart.total);
        Ok(ProcessedIntent {
            id: intent.id.clone(),
            amount_capturable,
        })
    }

    async fn read_reusable_card(&self) -> Result<PaymentMethod, TerminalError> {
        self.terminal.require_connected()?;

        if let CardScenario::CollectionFails(message) = &self.terminal.lock().scenario {
            return Err(TerminalError::new(message.clone()).with_code("card_read_failed"));
        }

        Ok(PaymentMethod {
            id: format!("pm_{}", Uuid::new_v4().simple()),
        })
    }
}
