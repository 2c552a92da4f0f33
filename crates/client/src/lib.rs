//! HTTP transport that delivers an `AgentForm` submission to the intake
//! server's `/api/submit-form` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use intake_core::{SubmissionPayload, SubmissionTransport, TransportError, TransportResponse};
use reqwest::Client;
use tracing::debug;

pub const SUBMIT_PATH: &str = "/api/submit-form";

#[derive(Clone, Debug)]
pub struct HttpSubmissionTransport {
    client: Client,
    endpoint: String,
}

impl HttpSubmissionTransport {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Unreachable(error.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        let endpoint = format!("{}{SUBMIT_PATH}", base_url.trim_end_matches('/'));
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn send(&self, payload: &SubmissionPayload) -> Result<TransportResponse, TransportError> {
        debug!(
            event_name = "intake.client.sending",
            endpoint = %self.endpoint,
            "posting agent configuration"
        );

        let response =
            self.client.post(&self.endpoint).json(payload).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Unreachable(error.to_string())
    }
}
