use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::crm::LEGACY_REUSE_SOURCE_CRM;

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully";

/// Fields a submission cannot be accepted without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequiredField {
    AgentType,
    AgentName,
    AgentGender,
    KnowledgeType,
    KnowledgeContent,
}

impl RequiredField {
    pub const ALL: [Self; 5] = [
        Self::AgentType,
        Self::AgentName,
        Self::AgentGender,
        Self::KnowledgeType,
        Self::KnowledgeContent,
    ];

    /// Name of the field in the JSON request body.
    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::AgentType => "agentType",
            Self::AgentName => "agentName",
            Self::AgentGender => "agentGender",
            Self::KnowledgeType => "knowledgeBaseType",
            Self::KnowledgeContent => "knowledgeBaseContent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AgentType => "Agent Type",
            Self::AgentName => "Agent Name",
            Self::AgentGender => "Agent Gender",
            Self::KnowledgeType => "Knowledge Base Type",
            Self::KnowledgeContent => "Knowledge Base Content",
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// JSON body of `POST /api/submit-form`.
///
/// Every field is optional on the wire so the handler can report exactly
/// which required ones are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(rename = "agentType", default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(rename = "agentName", default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(rename = "agentGender", default, skip_serializing_if = "Option::is_none")]
    pub agent_gender: Option<String>,
    #[serde(rename = "phoneNumber", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(rename = "accountSid", default, skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,
    #[serde(rename = "knowledgeBaseType", default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_type: Option<String>,
    #[serde(rename = "knowledgeBaseContent", default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functionalities: Option<Vec<String>>,
    #[serde(rename = "sourceCRM", default, skip_serializing_if = "Option::is_none")]
    pub source_crm: Option<String>,
    #[serde(rename = "sourceCRMCredentials", default, skip_serializing_if = "Option::is_none")]
    pub source_crm_credentials: Option<String>,
    #[serde(rename = "reportCRM", default, skip_serializing_if = "Option::is_none")]
    pub report_crm: Option<String>,
    #[serde(rename = "reportCRMCredentials", default, skip_serializing_if = "Option::is_none")]
    pub report_crm_credentials: Option<String>,
    #[serde(rename = "reportReusesSource", default, skip_serializing_if = "Option::is_none")]
    pub report_reuses_source: Option<bool>,
    #[serde(rename = "additionalNotes", default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

impl SubmissionPayload {
    pub fn required_value(&self, field: RequiredField) -> Option<&str> {
        let value = match field {
            RequiredField::AgentType => &self.agent_type,
            RequiredField::AgentName => &self.agent_name,
            RequiredField::AgentGender => &self.agent_gender,
            RequiredField::KnowledgeType => &self.knowledge_base_type,
            RequiredField::KnowledgeContent => &self.knowledge_base_content,
        };
        value.as_deref().filter(|value| !value.trim().is_empty())
    }

    pub fn missing_required_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| self.required_value(*field).is_none())
            .collect()
    }

    /// True when the report CRM should be the source CRM, either through the
    /// explicit flag or the legacy `reportCRM` sentinel.
    pub fn reuses_source_crm(&self) -> bool {
        self.report_reuses_source.unwrap_or(false)
            || self.report_crm.as_deref() == Some(LEGACY_REUSE_SOURCE_CRM)
    }
}

/// Serialized into `sourceCRMCredentials` / `reportCRMCredentials`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    #[serde(rename = "twilioSID")]
    pub twilio_sid: String,
    #[serde(rename = "twilioToken")]
    pub twilio_token: String,
    /// CRM credential values keyed by unprefixed field key (`api-key`, ...).
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl CredentialBundle {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAccepted {
    pub message: String,
    #[serde(rename = "recordId")]
    pub record_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "missingFields", default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

impl SubmissionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
