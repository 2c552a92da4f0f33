use thiserror::Error;

use crate::domain::crm::{CredentialField, Crm, CrmRole};
use crate::domain::submission::RequiredField;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingRequiredFields(Vec<RequiredField>),
    #[error("at least one functionality must be selected")]
    NoFunctionalities,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("no CRM is selected for the {} role", .role.prefix())]
    NoCrmSelected { role: CrmRole },
    #[error("{} does not take a `{}` credential", .crm, .field.key())]
    CredentialFieldUnavailable { crm: Crm, field: CredentialField },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out")]
    Timeout,
}

/// Outcome classes of a failed submit attempt, as shown to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("this form has already been submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Network(#[from] TransportError),
    #[error("submission endpoint not found")]
    NotFound,
    #[error("server error: {status}")]
    Server { status: u16 },
    #[error("submission rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unparseable response with status {status}")]
    MalformedResponse { status: u16 },
    #[error("could not encode submission: {0}")]
    Encoding(String),
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields(_) => "Please fill in all required fields.",
            Self::NoFunctionalities => "Please select at least one functionality.",
        }
    }
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.user_message().to_string(),
            Self::AlreadySubmitting => "Your submission is still being processed.".to_string(),
            Self::AlreadySubmitted => {
                "This agent has already been submitted. \
                 Choose \"Create another agent\" to start a new one."
                    .to_string()
            }
            Self::Network(_) => {
                "Cannot connect to server. Please check your internet connection and try again."
                    .to_string()
            }
            Self::NotFound => {
                "Server endpoint not found. The form submission service is currently unavailable."
                    .to_string()
            }
            Self::Server { .. } => {
                "Server error. Please try again later or contact support.".to_string()
            }
            Self::Rejected { message, .. } => format!("Error submitting form: {message}"),
            Self::MalformedResponse { status } => {
                format!("Error submitting form: Server error: {status}")
            }
            Self::Encoding(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }

    /// Whether the request reached the network at all.
    pub fn was_sent(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_)
                | Self::AlreadySubmitting
                | Self::AlreadySubmitted
                | Self::Encoding(_)
        )
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields.iter().map(RequiredField::label).collect::<Vec<_>>().join(", ")
}
