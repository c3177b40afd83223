// Mocked collaborators exported for downstream crates: cargo test --features testing
#![cfg(feature = "testing")]

use std::sync::{Arc, Mutex};
use terminal_checkout::backend::client::MockPaymentBackend;
use terminal_checkout::config::CheckoutDefaults;
use terminal_checkout::terminal::gateway::MockTerminalGateway;
use terminal_checkout::terminal::GatewayCallbacks;
use terminal_checkout::{
    CheckoutController, CheckoutError, GatewayFactory, MemoryDisplay, PreconditionError, Reader,
    TerminalGateway,
};

struct MockFactory(Mutex<Option<MockTerminalGateway>>);

impl GatewayFactory for MockFactory {
    fn create(&self, _callbacks: GatewayCallbacks) -> Box<dyn TerminalGateway> {
        Box::new(self.0.lock().unwrap().take().expect("gateway created twice"))
    }
}

#[tokio::test]
async fn test_exported_mocks_drive_controller() {
    let mut gateway = MockTerminalGateway::new();
    gateway
        .expect_discover_readers()
        .returning(|_| Ok(vec![Reader::new("tmr_mock", "tml_mock", "Mock reader")]));
    gateway.expect_connect_reader().never();

    let mut backend = MockPaymentBackend::new();
    backend.expect_create_payment_intent().never();

    let display = MemoryDisplay::new();
    let mut controller = CheckoutController::new(
        Arc::new(MockFactory(Mutex::new(Some(gateway)))),
        Arc::new(backend),
        Arc::new(display.clone()),
        CheckoutDefaults::default(),
    );

    controller.initialize().unwrap();
    assert_eq!(controller.discover_readers(false).await.unwrap(), 1);

    let err = controller.initiate_checkout(4800, "usd").await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Precondition(PreconditionError::NoConnectedReader)
    ));
    assert_eq!(
        display.status().as_deref(),
        Some("error - no reader is connected")
    );
}
