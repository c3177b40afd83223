use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::client::PaymentBackend;
use crate::terminal::ConnectionTokenProvider;

/// Connection tokens fetched from the payment backend.
///
/// Failures are logged and swallowed: the gateway sees no token and fails the
/// operation that asked for it.
pub struct BackendTokenProvider {
    backend: Arc<dyn PaymentBackend>,
}

impl BackendTokenProvider {
    pub fn new(backend: Arc<dyn PaymentBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ConnectionTokenProvider for BackendTokenProvider {
    async fn fetch_connection_token(&self) -> Option<String> {
        match self.backend.connection_token().await {
            Ok(secret) => {
                debug!("Connection token issued by backend");
                Some(secret)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch connection token");
                None
            }
        }
    }
}
