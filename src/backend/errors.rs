use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },
    #[error("Backend returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::InvalidResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            BackendError::Network {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Whether the request never produced a usable HTTP exchange
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Network { .. })
    }
}
