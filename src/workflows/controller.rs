//! Checkout workflow controller
//!
//! Drives one checkout session: each public step makes a single call to the
//! reader gateway or the payment backend, records the result in the session
//! and reports progress on the display. A failed step leaves the stage where
//! it was; the operator fixes the cause and runs the same step again.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn, Instrument};

use super::errors::{CheckoutError, PreconditionError};
use super::state_machine::{CheckoutEvent, CheckoutMachine, CheckoutStage};
use crate::backend::{BackendTokenProvider, CreateIntentRequest, PaymentBackend};
use crate::config::CheckoutDefaults;
use crate::display::{reader_entries, CheckoutStep, StatusDisplay};
use crate::session::{IntentStatus, PaymentIntentRecord, SessionState};
use crate::telemetry::{create_checkout_span, generate_correlation_id};
use crate::terminal::{
    Cart, DiscoveryConfig, GatewayCallbacks, GatewayFactory, PaymentMethod, ProcessedIntent,
    Reader, TerminalGateway,
};

pub const DISCONNECT_STATUS: &str = "unexpected disconnect from reader!";

/// Things the gateway reports on its own schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayNotice {
    UnexpectedDisconnect,
}

fn require_gateway(
    gateway: &Option<Box<dyn TerminalGateway>>,
) -> Result<&dyn TerminalGateway, PreconditionError> {
    gateway.as_deref().ok_or(PreconditionError::NotInitialized)
}

pub struct CheckoutController {
    factory: Arc<dyn GatewayFactory>,
    backend: Arc<dyn PaymentBackend>,
    display: Arc<dyn StatusDisplay>,
    settings: CheckoutDefaults,
    gateway: Option<Box<dyn TerminalGateway>>,
    session: SessionState,
    machine: CheckoutMachine,
    notice_tx: mpsc::UnboundedSender<GatewayNotice>,
    notice_rx: mpsc::UnboundedReceiver<GatewayNotice>,
    correlation_id: String,
}

impl CheckoutController {
    pub fn new(
        factory: Arc<dyn GatewayFactory>,
        backend: Arc<dyn PaymentBackend>,
        display: Arc<dyn StatusDisplay>,
        settings: CheckoutDefaults,
    ) -> Self {
        let correlation_id = generate_correlation_id();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            factory,
            backend,
            display,
            settings,
            gateway: None,
            session: SessionState::new(),
            machine: CheckoutMachine::new(&correlation_id),
            notice_tx,
            notice_rx,
            correlation_id,
        }
    }

    pub fn stage(&self) -> CheckoutStage {
        self.machine.stage()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn display(&self) -> &Arc<dyn StatusDisplay> {
        &self.display
    }

    pub fn settings(&self) -> &CheckoutDefaults {
        &self.settings
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Log the failure, put it on the status line and hand it back
    fn report(&self, err: impl Into<CheckoutError>) -> CheckoutError {
        let err = err.into();
        match &err {
            CheckoutError::Backend(backend_err) if !self.settings.surface_backend_errors => {
                error!(error = %backend_err, "Payment backend request failed");
            }
            _ => {
                warn!(error = %err, stage = %self.stage(), "Checkout step failed");
                self.display.set_status(&format!("error - {err}"));
            }
        }
        err
    }

    fn span(&self, operation: &str) -> tracing::Span {
        create_checkout_span(
            operation,
            self.session.connected_reader().map(|r| r.id.as_str()),
            self.session.payment_intent().map(|i| i.id.as_str()),
            &self.correlation_id,
        )
    }

    fn intent_description(&self) -> String {
        format!(
            "{} {}",
            self.settings.description_prefix,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    /// Apply notices the gateway posted since the last step
    pub fn sync_gateway_events(&mut self) {
        while let Ok(notice) = self.notice_rx.try_recv() {
            match notice {
                GatewayNotice::UnexpectedDisconnect => {
                    if let Some(reader) = self.session.clear_connected_reader() {
                        warn!(reader_id = %reader.id, "Dropping connected reader after disconnect");
                    }
                    self.machine.handle(CheckoutEvent::ReaderDisconnected);
                }
            }
        }
    }

    /// Step 1: create the gateway instance for this session
    pub fn initialize(&mut self) -> Result<(), CheckoutError> {
        let _span = self.span("initialize").entered();
        if self.gateway.is_some() {
            return Err(self.report(PreconditionError::AlreadyInitialized));
        }

        let display = self.display.clone();
        let notice_tx = self.notice_tx.clone();
        let callbacks = GatewayCallbacks {
            token_provider: Arc::new(BackendTokenProvider::new(self.backend.clone())),
            on_unexpected_disconnect: Arc::new(move || {
                display.set_status(DISCONNECT_STATUS);
                // The receiver lives as long as the controller
                let _ = notice_tx.send(GatewayNotice::UnexpectedDisconnect);
            }),
        };

        self.gateway = Some(self.factory.create(callbacks));
        self.machine.handle(CheckoutEvent::Initialized);
        info!("Terminal gateway created");

        self.display.mark_step_done(CheckoutStep::Initialize);
        self.display.set_status("initialized");
        Ok(())
    }

    /// Step 2: look for readers and list them; returns how many were found
    pub async fn discover_readers(&mut self, simulated: bool) -> Result<usize, CheckoutError> {
        let span = self.span("discover_readers");
        self.discover_readers_step(simulated).instrument(span).await
    }

    async fn discover_readers_step(&mut self, simulated: bool) -> Result<usize, CheckoutError> {
        self.sync_gateway_events();
        let gateway = require_gateway(&self.gateway).map_err(|e| self.report(e))?;

        let readers = match gateway.discover_readers(DiscoveryConfig { simulated }).await {
            Ok(readers) => readers,
            Err(e) => return Err(self.report(e)),
        };

        let count = readers.len();
        info!(count, simulated, "Readers discovered");
        self.display.render_readers(&reader_entries(&readers));
        self.session.replace_discovered_readers(readers);
        self.machine.handle(CheckoutEvent::ReadersDiscovered);

        self.display.mark_step_done(CheckoutStep::DiscoverReaders);
        self.display.set_status(&format!("discovered {count} reader(s)"));
        Ok(count)
    }

    /// Step 3: connect to the reader at `index` in the last discovery result
    pub async fn connect_reader(&mut self, index: usize) -> Result<Reader, CheckoutError> {
        let span = self.span("connect_reader");
        self.connect_reader_step(index).instrument(span).await
    }

    async fn connect_reader_step(&mut self, index: usize) -> Result<Reader, CheckoutError> {
        self.sync_gateway_events();
        let gateway = require_gateway(&self.gateway).map_err(|e| self.report(e))?;

        let selected = match self.session.discovered_reader(index) {
            Some(reader) => reader.clone(),
            None => {
                let available = self.session.discovered_readers().len();
                return Err(self.report(PreconditionError::ReaderIndexOutOfRange {
                    index,
                    available,
                }));
            }
        };

        // The gateway wants the descriptor it handed out, not just the id
        let connected = match gateway.connect_reader(&selected).await {
            Ok(reader) => reader,
            Err(e) => return Err(self.report(e)),
        };

        info!(reader_id = %connected.id, "Connected to reader");
        self.session.set_connected_reader(connected.clone());
        // An interrupted checkout resumes where it stopped
        let intent = self.session.payment_intent().map(|intent| intent.status);
        self.machine.handle(CheckoutEvent::ReaderConnected { intent });

        self.display.mark_step_done(CheckoutStep::ConnectReader);
        self.display
            .set_status(&format!("connected to {}", connected.id));
        Ok(connected)
    }

    /// Step 4: have the backend create an intent and show the cart on the reader
    pub async fn initiate_checkout(
        &mut self,
        amount: u64,
        currency: &str,
    ) -> Result<PaymentIntentRecord, CheckoutError> {
        let span = self.span("initiate_checkout");
        self.initiate_checkout_step(amount, currency)
            .instrument(span)
            .await
    }

    async fn initiate_checkout_step(
        &mut self,
        amount: u64,
        currency: &str,
    ) -> Result<PaymentIntentRecord, CheckoutError> {
        self.sync_gateway_events();
        let gateway = require_gateway(&self.gateway).map_err(|e| self.report(e))?;
        if self.session.connected_reader().is_none() {
            return Err(self.report(PreconditionError::NoConnectedReader));
        }

        let request = CreateIntentRequest {
            amount,
            currency: currency.to_string(),
            description: self.intent_description(),
        };
        let created = match self.backend.create_payment_intent(&request).await {
            Ok(created) => created,
            Err(e) => return Err(self.report(e)),
        };

        // Every checkout gets its own correlation id once the intent exists
        self.correlation_id = generate_correlation_id();
        let span = tracing::Span::current();
        span.record("correlation.id", self.correlation_id.as_str());
        span.record("intent.id", created.intent.as_str());

        let record = PaymentIntentRecord::new(&created.intent, &created.secret);
        self.session.replace_payment_intent(record.clone());
        self.machine.handle(CheckoutEvent::IntentCreated);

        if let Err(e) = gateway.set_reader_display(&Cart::sample(currency)).await {
            return Err(self.report(e));
        }

        self.display.mark_step_done(CheckoutStep::InitiateCheckout);
        self.display.set_status(&format!(
            "server created PaymentIntent ({}); waiting payment method from reader",
            record.id
        ));
        Ok(record)
    }

    /// Step 5: collect a card for the active intent and process the payment
    pub async fn collect_payment(&mut self) -> Result<ProcessedIntent, CheckoutError> {
        let span = self.span("collect_payment");
        self.collect_payment_step().instrument(span).await
    }

    async fn collect_payment_step(&mut self) -> Result<ProcessedIntent, CheckoutError> {
        self.sync_gateway_events();
        let gateway = require_gateway(&self.gateway).map_err(|e| self.report(e))?;

        let client_secret = match self.session.payment_intent() {
            None => return Err(self.report(PreconditionError::NoActiveIntent)),
            Some(intent) if intent.status != IntentStatus::RequiresPaymentMethod => {
                return Err(self.report(PreconditionError::UnexpectedIntentStatus {
                    id: intent.id.clone(),
                    actual: intent.status,
                    expected: IntentStatus::RequiresPaymentMethod,
                }));
            }
            Some(intent) if intent.client_secret.is_empty() => {
                return Err(self.report(PreconditionError::MissingClientSecret {
                    id: intent.id.clone(),
                }));
            }
            Some(intent) => intent.client_secret.clone(),
        };

        self.display.set_status("collecting payment method");
        let collected = match gateway.collect_payment_method(&client_secret).await {
            Ok(collected) => collected,
            Err(e) => return Err(self.report(e)),
        };

        let processed = match gateway.process_payment(&collected).await {
            Ok(processed) => processed,
            Err(e) => return Err(self.report(e)),
        };

        info!(intent_id = %processed.id, "Payment processed, awaiting capture");
        self.session.update_intent_status(IntentStatus::RequiresCapture);
        self.machine.handle(CheckoutEvent::PaymentProcessed);

        self.display.mark_step_done(CheckoutStep::CollectPayment);
        self.display.set_status("payment processed (needs capture)");
        Ok(processed)
    }

    /// Step 6: ask the backend to capture; returns the captured intent id
    pub async fn capture_payment(&mut self) -> Result<String, CheckoutError> {
        let span = self.span("capture_payment");
        self.capture_payment_step().instrument(span).await
    }

    async fn capture_payment_step(&mut self) -> Result<String, CheckoutError> {
        self.sync_gateway_events();

        let intent_id = match self.session.payment_intent() {
            None => return Err(self.report(PreconditionError::NoActiveIntent)),
            Some(intent) if intent.status != IntentStatus::RequiresCapture => {
                return Err(self.report(PreconditionError::UnexpectedIntentStatus {
                    id: intent.id.clone(),
                    actual: intent.status,
                    expected: IntentStatus::RequiresCapture,
                }));
            }
            Some(intent) => intent.id.clone(),
        };

        if let Err(e) = self.backend.capture_payment_intent(&intent_id).await {
            return Err(self.report(e));
        }

        // The money is captured either way; a stale cart on screen is cosmetic
        if let Some(gateway) = self.gateway.as_deref() {
            if let Err(e) = gateway.clear_reader_display().await {
                warn!(error = %e, "Could not clear reader display after capture");
            }
        }

        self.session.update_intent_status(IntentStatus::Captured);
        self.machine.handle(CheckoutEvent::PaymentCaptured);

        self.display.mark_step_done(CheckoutStep::CapturePayment);
        self.display
            .set_status(&format!("captured payment - ID: {intent_id}"));
        Ok(intent_id)
    }

    /// Read a card for later use without creating a payment intent
    pub async fn save_card_for_later(&mut self) -> Result<PaymentMethod, CheckoutError> {
        let span = self.span("save_card_for_later");
        self.save_card_for_later_step().instrument(span).await
    }

    async fn save_card_for_later_step(&mut self) -> Result<PaymentMethod, CheckoutError> {
        self.sync_gateway_events();
        let gateway = require_gateway(&self.gateway).map_err(|e| self.report(e))?;
        if self.session.connected_reader().is_none() {
            return Err(self.report(PreconditionError::NoConnectedReader));
        }

        let payment_method = match gateway.read_reusable_card().await {
            Ok(payment_method) => payment_method,
            Err(e) => return Err(self.report(e)),
        };

        info!(payment_method_id = %payment_method.id, "Reusable card read");
        self.display
            .set_status(&format!("created new PaymentMethod - {}", payment_method.id));
        Ok(payment_method)
    }
}
