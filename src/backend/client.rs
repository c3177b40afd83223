//! HTTP client for the payment backend
//!
//! The backend holds the secret API key: it mints connection tokens for the
//! reader and creates and captures payment intents on our behalf. Request
//! bodies are form-encoded, responses are JSON.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::errors::BackendError;

pub const CONNECTION_TOKEN_PATH: &str = "/connection_token";
pub const CREATE_PAYMENT_INTENT_PATH: &str = "/create_payment_intent";
pub const CAPTURE_PAYMENT_INTENT_PATH: &str = "/capture_payment_intent";

/// Fields sent to `/create_payment_intent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIntentRequest {
    pub amount: u64,
    pub currency: String,
    pub description: String,
}

/// What the backend hands back for a freshly created intent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIntent {
    /// Payment intent id
    pub intent: String,
    /// Client secret used by the reader to collect against the intent
    pub secret: String,
}

#[derive(Debug, Deserialize)]
struct ConnectionTokenResponse {
    secret: String,
}

#[derive(Debug, Serialize)]
struct CaptureRequest<'a> {
    payment_intent_id: &'a str,
}

/// Endpoints of the payment backend the checkout relies on
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn connection_token(&self) -> Result<String, BackendError>;

    async fn create_payment_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<CreatedIntent, BackendError>;

    async fn capture_payment_intent(&self, payment_intent_id: &str) -> Result<(), BackendError>;
}

/// reqwest-backed [`PaymentBackend`]
#[derive(Debug, Clone)]
pub struct HttpPaymentBackend {
    client: Client,
    base_url: Url,
}

impl HttpPaymentBackend {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = Url::parse(host).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::from_reqwest("client", e))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // Appended rather than joined so a host with a path prefix keeps it
    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    async fn post<F: Serialize + ?Sized>(
        &self,
        path: &str,
        form: Option<&F>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST to payment backend");

        let mut request = self.client.post(url);
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn connection_token(&self) -> Result<String, BackendError> {
        let response = self.post::<()>(CONNECTION_TOKEN_PATH, None).await?;
        let token: ConnectionTokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::from_reqwest(CONNECTION_TOKEN_PATH, e))?;
        debug!("Fetched connection token");
        Ok(token.secret)
    }

    async fn create_payment_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<CreatedIntent, BackendError> {
        let response = self
            .post(CREATE_PAYMENT_INTENT_PATH, Some(request))
            .await?;
        let created: CreatedIntent = response
            .json()
            .await
            .map_err(|e| BackendError::from_reqwest(CREATE_PAYMENT_INTENT_PATH, e))?;
        info!(
            intent_id = %created.intent,
            amount = request.amount,
            currency = %request.currency,
            "Payment intent created"
        );
        Ok(created)
    }

    async fn capture_payment_intent(&self, payment_intent_id: &str) -> Result<(), BackendError> {
        // The response body is not used, only the status
        self.post(
            CAPTURE_PAYMENT_INTENT_PATH,
            Some(&CaptureRequest { payment_intent_id }),
        )
        .await?;
        info!(intent_id = %payment_intent_id, "Payment intent captured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpPaymentBackend {
        HttpPaymentBackend::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let err = HttpPaymentBackend::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BackendError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_token_reads_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CONNECTION_TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"secret": "pst_test_123"})),
            )
            .mount(&server)
            .await;

        let token = backend_for(&server).connection_token().await.unwrap();
        assert_eq!(token, "pst_test_123");
    }

    #[tokio::test]
    async fn test_create_payment_intent_sends_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_PAYMENT_INTENT_PATH))
            .and(body_string_contains("amount=4800"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains("description=Test+at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"intent": "pi_1", "secret": "pi_1_secret_a"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let created = backend_for(&server)
            .create_payment_intent(&CreateIntentRequest {
                amount: 4800,
                currency: "usd".to_string(),
                description: "Test at 2024-01-01T00:00:00.000Z".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.intent, "pi_1");
        assert_eq!(created.secret, "pi_1_secret_a");
    }

    #[tokio::test]
    async fn test_capture_sends_intent_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CAPTURE_PAYMENT_INTENT_PATH))
            .and(body_string_contains("payment_intent_id=pi_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .capture_payment_intent("pi_9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CAPTURE_PAYMENT_INTENT_PATH))
            .respond_with(ResponseTemplate::new(402).set_body_string("already captured"))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .capture_payment_intent("pi_9")
            .await
            .unwrap_err();
        match err {
            BackendError::Status { status, body, .. } => {
                assert_eq!(status, 402);
                assert_eq!(body, "already captured");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CONNECTION_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend_for(&server).connection_token().await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse { .. }));
        assert!(!err.is_transport());
    }
}
