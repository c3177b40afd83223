// Payment backend: connection tokens, intent creation and capture

pub mod client;
pub mod errors;
pub mod token;

pub use client::{
    CreateIntentRequest, CreatedIntent, HttpPaymentBackend, PaymentBackend,
    CAPTURE_PAYMENT_INTENT_PATH, CONNECTION_TOKEN_PATH, CREATE_PAYMENT_INTENT_PATH,
};
pub use errors::BackendError;
pub use token::BackendTokenProvider;
