// Checkout stages as a statig state machine
//
// The controller performs the external call for a step and only then feeds
// the matching event in here, so a failed call never moves the stage.

use statig::prelude::*;
use std::fmt;

use crate::session::IntentStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    Initialized,
    ReadersDiscovered,
    /// Carries the status of the intent still active when the reader came up
    ReaderConnected { intent: Option<IntentStatus> },
    ReaderDisconnected,
    IntentCreated,
    PaymentProcessed,
    PaymentCaptured,
}

/// Flat view of where a checkout currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Uninitialized,
    Initialized,
    ReadersDiscovered,
    ReaderConnected,
    IntentCreated,
    Processed,
    Captured,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStage::Uninitialized => "uninitialized",
            CheckoutStage::Initialized => "initialized",
            CheckoutStage::ReadersDiscovered => "readers discovered",
            CheckoutStage::ReaderConnected => "reader connected",
            CheckoutStage::IntentCreated => "intent created",
            CheckoutStage::Processed => "processed",
            CheckoutStage::Captured => "captured",
        };
        f.write_str(name)
    }
}

/// Stage a fresh connection resumes at, so an interrupted checkout picks up
/// where it stopped
fn resume_state(intent: Option<IntentStatus>) -> State {
    match intent {
        None => State::reader_connected(),
        Some(IntentStatus::RequiresPaymentMethod) => State::intent_created(),
        Some(IntentStatus::RequiresCapture) => State::processed(),
        Some(IntentStatus::Captured) => State::captured(),
    }
}

#[derive(Debug, Default)]
pub struct CheckoutFlow {
    session_id: String,
}

impl CheckoutFlow {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
        }
    }
}

#[state_machine(initial = "State::uninitialized()")]
impl CheckoutFlow {
    #[state]
    fn uninitialized(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            CheckoutEvent::Initialized => {
                tracing::debug!(session_id = %self.session_id, "Terminal initialized");
                Transition(State::initialized())
            }
            _ => Handled,
        }
    }

    /// Every stage after the gateway exists
    #[superstate]
    fn online(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            CheckoutEvent::ReadersDiscovered => Transition(State::readers_discovered()),
            _ => Handled,
        }
    }

    #[state(superstate = "online")]
    fn initialized(&mut self) -> Outcome<State> {
        Super
    }

    #[state(superstate = "online")]
    fn readers_discovered(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            CheckoutEvent::ReaderConnected { intent } => {
                tracing::debug!(session_id = %self.session_id, "Reader connected");
                Transition(resume_state(*intent))
            }
            _ => Super,
        }
    }

    /// Stages that need a live reader connection
    #[superstate(superstate = "online")]
    fn connected(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            // Refreshing the list does not drop the connection
            CheckoutEvent::ReadersDiscovered => Handled,
            CheckoutEvent::ReaderConnected { intent } => Transition(resume_state(*intent)),
            CheckoutEvent::IntentCreated => Transition(State::intent_created()),
            CheckoutEvent::ReaderDisconnected => {
                tracing::warn!(session_id = %self.session_id, "Reader connection lost");
                Transition(State::readers_discovered())
            }
            _ => Super,
        }
    }

    #[state(superstate = "connected")]
    fn reader_connected(&mut self) -> Outcome<State> {
        Super
    }

    #[state(superstate = "connected")]
    fn intent_created(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            CheckoutEvent::PaymentProcessed => Transition(State::processed()),
            _ => Super,
        }
    }

    #[state(superstate = "connected")]
    fn processed(&mut self, event: &CheckoutEvent) -> Outcome<State> {
        match event {
            CheckoutEvent::PaymentCaptured => Transition(State::captured()),
            _ => Super,
        }
    }

    #[state(superstate = "connected")]
    fn captured(&mut self) -> Outcome<State> {
        Super
    }
}

/// Owns the statig machine and exposes stages instead of generated states
pub struct CheckoutMachine {
    machine: StateMachine<CheckoutFlow>,
}

impl CheckoutMachine {
    pub fn new(session_id: &str) -> Self {
        Self {
            machine: CheckoutFlow::new(session_id).state_machine(),
        }
    }

    /// Feed an event and return the stage the machine ends up in
    pub fn handle(&mut self, event: CheckoutEvent) -> CheckoutStage {
        self.machine.handle(&event);
        self.stage()
    }

    pub fn stage(&self) -> CheckoutStage {
        match self.machine.state() {
            State::Uninitialized { .. } => CheckoutStage::Uninitialized,
            State::Initialized { .. } => CheckoutStage::Initialized,
            State::ReadersDiscovered { .. } => CheckoutStage::ReadersDiscovered,
            State::ReaderConnected { .. } => CheckoutStage::ReaderConnected,
            State::IntentCreated { .. } => CheckoutStage::IntentCreated,
            State::Processed { .. } => CheckoutStage::Processed,
            State::Captured { .. } => CheckoutStage::Captured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_at(events: &[CheckoutEvent]) -> CheckoutMachine {
        let mut machine = CheckoutMachine::new("test-session");
        for event in events {
            machine.handle(event.clone());
        }
        machine
    }

    #[test]
    fn test_happy_path_walks_every_stage() {
        let mut machine = CheckoutMachine::new("test-session");
        assert_eq!(machine.stage(), CheckoutStage::Uninitialized);

        let expected = [
            (CheckoutEvent::Initialized, CheckoutStage::Initialized),
            (CheckoutEvent::ReadersDiscovered, CheckoutStage::ReadersDiscovered),
            (
                CheckoutEvent::ReaderConnected { intent: None },
                CheckoutStage::ReaderConnected,
            ),
            (CheckoutEvent::IntentCreated, CheckoutStage::IntentCreated),
            (CheckoutEvent::PaymentProcessed, CheckoutStage::Processed),
            (CheckoutEvent::PaymentCaptured, CheckoutStage::Captured),
        ];
        for (event, stage) in expected {
            assert_eq!(machine.handle(event), stage);
        }
    }

    #[test]
    fn test_events_before_initialization_are_ignored() {
        let mut machine = CheckoutMachine::new("test-session");
        assert_eq!(
            machine.handle(CheckoutEvent::ReadersDiscovered),
            CheckoutStage::Uninitialized
        );
        assert_eq!(
            machine.handle(CheckoutEvent::IntentCreated),
            CheckoutStage::Uninitialized
        );
    }

    #[test]
    fn test_capture_requires_processed_stage() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
            CheckoutEvent::IntentCreated,
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::PaymentCaptured),
            CheckoutStage::IntentCreated
        );
    }

    #[test]
    fn test_disconnect_falls_back_to_discovered() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
            CheckoutEvent::IntentCreated,
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::ReaderDisconnected),
            CheckoutStage::ReadersDiscovered
        );
        // Not connected any more, so a new intent cannot be recorded
        assert_eq!(
            machine.handle(CheckoutEvent::IntentCreated),
            CheckoutStage::ReadersDiscovered
        );
    }

    #[test]
    fn test_rediscovery_keeps_connection() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::ReadersDiscovered),
            CheckoutStage::ReaderConnected
        );
    }

    #[test]
    fn test_new_checkout_after_capture() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
            CheckoutEvent::IntentCreated,
            CheckoutEvent::PaymentProcessed,
            CheckoutEvent::PaymentCaptured,
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::IntentCreated),
            CheckoutStage::IntentCreated
        );
    }

    #[test]
    fn test_reconnect_resumes_active_intent() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
            CheckoutEvent::IntentCreated,
            CheckoutEvent::ReaderDisconnected,
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::ReaderConnected {
                intent: Some(IntentStatus::RequiresPaymentMethod)
            }),
            CheckoutStage::IntentCreated
        );
        assert_eq!(
            machine.handle(CheckoutEvent::PaymentProcessed),
            CheckoutStage::Processed
        );
    }

    #[test]
    fn test_repeated_connect_keeps_processed_payment() {
        let mut machine = machine_at(&[
            CheckoutEvent::Initialized,
            CheckoutEvent::ReadersDiscovered,
            CheckoutEvent::ReaderConnected { intent: None },
            CheckoutEvent::IntentCreated,
            CheckoutEvent::PaymentProcessed,
        ]);
        assert_eq!(
            machine.handle(CheckoutEvent::ReaderConnected {
                intent: Some(IntentStatus::RequiresCapture)
            }),
            CheckoutStage::Processed
        );
        assert_eq!(
            machine.handle(CheckoutEvent::PaymentCaptured),
            CheckoutStage::Captured
        );
    }
}
