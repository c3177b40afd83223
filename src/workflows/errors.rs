use thiserror::Error;

use crate::backend::BackendError;
use crate::session::IntentStatus;
use crate::terminal::TerminalError;

/// A step was triggered before the session was ready for it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("terminal has not been initialized")]
    NotInitialized,
    #[error("terminal is already initialized")]
    AlreadyInitialized,
    #[error("no reader at index {index}, last discovery found {available}")]
    ReaderIndexOutOfRange { index: usize, available: usize },
    #[error("no reader is connected")]
    NoConnectedReader,
    #[error("no active payment intent")]
    NoActiveIntent,
    #[error("payment intent {id} has no client secret")]
    MissingClientSecret { id: String },
    #[error("payment intent {id} is {actual}, expected {expected}")]
    UnexpectedIntentStatus {
        id: String,
        actual: IntentStatus,
        expected: IntentStatus,
    },
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CheckoutError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, CheckoutError::Precondition(_))
    }
}
