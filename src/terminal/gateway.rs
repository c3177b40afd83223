//! Terminal gateway abstraction
//!
//! The device side of a checkout: discovery, connection, the reader's display
//! and card collection. The vendor SDK sits behind these traits so the
//! workflow can run against real hardware, the simulated reader or a mock.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::types::{
    Cart, CollectedIntent, DiscoveryConfig, PaymentMethod, ProcessedIntent, Reader, TerminalError,
};

/// Supplies connection tokens to the gateway whenever it needs one.
///
/// Returns `None` when no token could be obtained; the gateway then fails the
/// operation that needed it.
#[async_trait]
pub trait ConnectionTokenProvider: Send + Sync {
    async fn fetch_connection_token(&self) -> Option<String>;
}

/// Invoked by the gateway when a connected reader drops without being asked to
pub type DisconnectHandler = Arc<dyn Fn() + Send + Sync>;

/// Callbacks handed to the gateway at creation time
#[derive(Clone)]
pub struct GatewayCallbacks {
    pub token_provider: Arc<dyn ConnectionTokenProvider>,
    pub on_unexpected_disconnect: DisconnectHandler,
}

impl fmt::Debug for GatewayCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCallbacks").finish_non_exhaustive()
    }
}

/// Operations a terminal gateway instance exposes
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TerminalGateway: Send + Sync {
    async fn discover_readers(&self, config: DiscoveryConfig) -> Result<Vec<Reader>, TerminalError>;

    async fn connect_reader(&self, reader: &Reader) -> Result<Reader, TerminalError>;

    async fn set_reader_display(&self, cart: &Cart) -> Result<(), TerminalError>;

    async fn clear_reader_display(&self) -> Result<(), TerminalError>;

    /// Prompt the customer for a card against the intent identified by `client_secret`
    async fn collect_payment_method(
        &self,
        client_secret: &str,
    ) -> Result<CollectedIntent, TerminalError>;

    async fn process_payment(
        &self,
        intent: &CollectedIntent,
    ) -> Result<ProcessedIntent, TerminalError>;

    async fn read_reusable_card(&self) -> Result<PaymentMethod, TerminalError>;
}

/// Creates gateway instances; one is created per checkout session
pub trait GatewayFactory: Send + Sync {
    fn create(&self, callbacks: GatewayCallbacks) -> Box<dyn TerminalGateway>;
}
