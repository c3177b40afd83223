//! Shared fixtures: a wiremock stand-in for the payment backend and a
//! controller wired to the simulated reader.

#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use terminal_checkout::backend::{
    HttpPaymentBackend, CAPTURE_PAYMENT_INTENT_PATH, CONNECTION_TOKEN_PATH,
    CREATE_PAYMENT_INTENT_PATH,
};
use terminal_checkout::config::CheckoutDefaults;
use terminal_checkout::{CheckoutController, MemoryDisplay, SimulatedTerminal};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Payment backend mock server for deterministic testing
pub struct BackendMock {
    pub server: MockServer,
}

impl BackendMock {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn mock_connection_token(&self, secret: &str) {
        Mock::given(method("POST"))
            .and(path(CONNECTION_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "secret": secret })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_connection_token_failure(&self) {
        Mock::given(method("POST"))
            .and(path(CONNECTION_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("stripe key missing"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_intent(&self, intent_id: &str) {
        self.mock_create_intent_with_secret(intent_id, &format!("{intent_id}_secret_test"))
            .await;
    }

    pub async fn mock_create_intent_with_secret(&self, intent_id: &str, secret: &str) {
        let response = json!({
            "intent": intent_id,
            "secret": secret,
        });
        Mock::given(method("POST"))
            .and(path(CREATE_PAYMENT_INTENT_PATH))
            .and(body_string_contains("amount="))
            .and(body_string_contains("currency="))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_capture(&self, intent_id: &str) {
        Mock::given(method("POST"))
            .and(path(CAPTURE_PAYMENT_INTENT_PATH))
            .and(body_string_contains(format!("payment_intent_id={intent_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "intent": intent_id })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Token, creation and capture all succeed for `intent_id`
    pub async fn mock_happy_path(&self, intent_id: &str) {
        self.mock_connection_token("pst_test_token").await;
        self.mock_create_intent(intent_id).await;
        self.mock_capture(intent_id).await;
    }
}

pub struct Harness {
    pub controller: CheckoutController,
    pub display: MemoryDisplay,
    pub terminal: SimulatedTerminal,
}

pub fn harness(backend_uri: &str, terminal: SimulatedTerminal) -> Harness {
    let backend = HttpPaymentBackend::new(backend_uri, Duration::from_secs(5)).unwrap();
    let display = MemoryDisplay::new();
    let controller = CheckoutController::new(
        Arc::new(terminal.clone()),
        Arc::new(backend),
        Arc::new(display.clone()),
        CheckoutDefaults::default(),
    );
    Harness {
        controller,
        display,
        terminal,
    }
}
