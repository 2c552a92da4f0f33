use async_trait::async_trait;
use tracing::warn;

use crate::domain::submission::{SubmissionAccepted, SubmissionFailure, SubmissionPayload};
use crate::errors::{SubmitError, TransportError};

/// Raw reply from the submission endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one submission to the backend.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn send(&self, payload: &SubmissionPayload) -> Result<TransportResponse, TransportError>;
}

/// Turns the endpoint's reply into the accepted record or a classified error.
pub fn classify_response(response: TransportResponse) -> Result<SubmissionAccepted, SubmitError> {
    let TransportResponse { status, body } = response;

    if (200..300).contains(&status) {
        return serde_json::from_str::<SubmissionAccepted>(&body).map_err(|error| {
            warn!(
                event_name = "intake.client.malformed_response",
                status,
                raw_body = %body,
                error = %error,
                "submission endpoint returned an unparseable body"
            );
            SubmitError::MalformedResponse { status }
        });
    }

    warn!(
        event_name = "intake.client.submission_failed",
        status,
        raw_body = %body,
        "submission endpoint returned an error status"
    );

    match status {
        404 => Err(SubmitError::NotFound),
        500..=599 => Err(SubmitError::Server { status }),
        _ => {
            let message = serde_json::from_str::<SubmissionFailure>(&body)
                .ok()
                .map(|failure| failure.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| format!("Server error: {status}"));
            Err(SubmitError::Rejected { status, message })
        }
    }
}
