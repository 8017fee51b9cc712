use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::error::ApiClientError;
use super::public::{ChatRequestPayload, ChatResponsePayload, ErrorBody, UploadFileRequest};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Upper bound on how long a single request may take end to end.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const CHAT_ENDPOINT: &str = "/chat";
const LOAD_ENDPOINT: &str = "/load";

/// The operations the orchestrator and bulk loader need from the
/// remote service. `ApiClient` is the real implementation, tests can
/// swap in their own.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn send_chat(
        &self,
        payload: &ChatRequestPayload,
    ) -> Result<ChatResponsePayload, ApiClientError>;

    async fn upload_file(&self, req: &UploadFileRequest) -> Result<(), ApiClientError>;
}

/// HTTP client for the inference and indexing service. There are no
/// retries here, callers decide what to do with a failure.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `body` as JSON to `endpoint` and return the raw response
    /// text of a successful response.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<String, ApiClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiClientError::from_transport(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiClientError::from_transport(e, self.timeout))?;

        if !status.is_success() {
            // A body that isn't JSON or lacks `error` still counts as
            // an API error, just without a message
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error);
            tracing::debug!("{} responded with {}: {:?}", url, status, message);
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl RemoteService for ApiClient {
    async fn send_chat(
        &self,
        payload: &ChatRequestPayload,
    ) -> Result<ChatResponsePayload, ApiClientError> {
        if payload.message.is_empty() {
            return Err(ApiClientError::InvalidRequest(String::from(
                "chat message must not be empty",
            )));
        }
        let text = self.post_json(CHAT_ENDPOINT, payload).await?;
        serde_json::from_str(&text).map_err(|e| ApiClientError::Decode(e.to_string()))
    }

    async fn upload_file(&self, req: &UploadFileRequest) -> Result<(), ApiClientError> {
        self.post_json(LOAD_ENDPOINT, req).await?;
        Ok(())
    }
}
