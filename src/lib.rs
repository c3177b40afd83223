// Terminal Checkout Library - in-person card payments through a card reader
// This exposes the workflow controller and its collaborators for embedding and testing

pub mod backend;
pub mod cli;
pub mod config;
pub mod display;
pub mod session;
pub mod telemetry;
pub mod terminal;
pub mod workflows;

// Re-export key types for easy access
pub use backend::{BackendError, BackendTokenProvider, HttpPaymentBackend, PaymentBackend};
pub use config::{config, init_config, CheckoutConfig};
pub use display::{CheckoutStep, ConsoleDisplay, MemoryDisplay, ReaderEntry, StatusDisplay};
pub use session::{IntentStatus, PaymentIntentRecord, SessionState};
pub use telemetry::{create_checkout_span, generate_correlation_id, init_telemetry};
pub use terminal::{
    CardScenario, GatewayFactory, Reader, SimulatedTerminal, TerminalError, TerminalGateway,
};
pub use workflows::{CheckoutController, CheckoutError, CheckoutStage, PreconditionError};
