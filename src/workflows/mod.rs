// Checkout workflow: stage machine, step errors and the controller that
// sequences the reader gateway and the payment backend

pub mod controller;
pub mod errors;
pub mod state_machine;

pub use controller::{CheckoutController, GatewayNotice, DISCONNECT_STATUS};
pub use errors::{CheckoutError, PreconditionError};
pub use state_machine::{CheckoutEvent, CheckoutMachine, CheckoutStage};
