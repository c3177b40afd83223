// Card reader side of the checkout: gateway traits, wire types and the
// simulated reader used when no hardware is attached

pub mod gateway;
pub mod simulated;
pub mod types;

pub use gateway::{
    ConnectionTokenProvider, DisconnectHandler, GatewayCallbacks, GatewayFactory, TerminalGateway,
};
pub use simulated::{CardScenario, SimulatedGateway, SimulatedTerminal};
pub use types::{
    Cart, CollectedIntent, DiscoveryConfig, LineItem, PaymentMethod, ProcessedIntent, Reader,
    ReaderStatus, TerminalError,
};
