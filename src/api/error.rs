use std::time::Duration;

/// Failures when talking to the remote service. Every call made by
/// `ApiClient` is classified into exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("api error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out after {:?}", .0)]
    Timeout(Duration),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiClientError {
    /// Text suitable for showing to the user. For a rejected request
    /// this is the service's own `error` message when it sent one.
    pub fn message(&self) -> String {
        match self {
            ApiClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ApiClientError::Api {
                status,
                message: None,
            } => format!("status {}", status),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiClientError::Timeout(timeout)
        } else if err.is_decode() {
            ApiClientError::Decode(err.to_string())
        } else {
            ApiClientError::Network(err)
        }
    }
}
