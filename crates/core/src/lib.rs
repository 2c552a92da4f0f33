//! Agent intake core: the agent configuration form, its submission payload
//! and the configuration shared by the intake binaries.

pub mod config;
pub mod domain;
pub mod errors;
pub mod form;
pub mod transport;

pub use domain::agent::{AgentGender, AgentType, Functionality, KnowledgeType};
pub use domain::crm::{
    credential_inputs, CredentialField, CredentialInput, Crm, CrmRole, InputKind, ReportTarget,
};
pub use domain::submission::{
    CredentialBundle, RequiredField, SubmissionAccepted, SubmissionFailure, SubmissionPayload,
};
pub use errors::{FormError, SubmitError, TransportError, ValidationError};
pub use form::{AgentForm, TextField};
pub use transport::{classify_response, SubmissionTransport, TransportResponse};
