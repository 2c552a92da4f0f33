//! Agent configuration form state.
//!
//! `AgentForm` owns everything the user has entered for one request: option
//! selections, free-text values, the functionality set and CRM credentials.
//! It validates locally, builds the `SubmissionPayload` sent to the backend
//! and tracks the in-flight and submitted flags. Rendering is left to the
//! caller; `credential_inputs` describes which credential inputs to show.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::domain::agent::{AgentGender, AgentType, Functionality, KnowledgeType};
use crate::domain::crm::{
    credential_inputs, CredentialField, CredentialInput, Crm, CrmRole, ReportTarget,
    REUSE_SOURCE_CREDENTIALS,
};
use crate::domain::submission::{
    CredentialBundle, RequiredField, SubmissionAccepted, SubmissionPayload,
};
use crate::errors::{FormError, SubmitError, ValidationError};
use crate::transport::{classify_response, SubmissionTransport};

/// Free-text inputs of the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextField {
    AgentName,
    PhoneNumber,
    TwilioSid,
    TwilioToken,
    KnowledgeContent,
    AdditionalNotes,
}

/// Storage key of one credential value. Values entered for one CRM are never
/// read back under another CRM or role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CredentialKey {
    pub role: CrmRole,
    pub crm: Crm,
    pub field: CredentialField,
}

#[derive(Clone, Debug, Default)]
pub struct AgentForm {
    agent_type: Option<AgentType>,
    agent_gender: Option<AgentGender>,
    knowledge_type: Option<KnowledgeType>,
    source_crm: Option<Crm>,
    report_target: ReportTarget,
    functionalities: BTreeSet<Functionality>,
    text: BTreeMap<TextField, String>,
    credentials: BTreeMap<CredentialKey, String>,
    submitting: bool,
    submitted: Option<SubmissionAccepted>,
}

impl AgentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_type(&self) -> Option<AgentType> {
        self.agent_type
    }

    pub fn select_agent_type(&mut self, agent_type: Option<AgentType>) {
        self.agent_type = agent_type;
    }

    pub fn agent_gender(&self) -> Option<AgentGender> {
        self.agent_gender
    }

    pub fn select_agent_gender(&mut self, gender: Option<AgentGender>) {
        self.agent_gender = gender;
    }

    pub fn knowledge_type(&self) -> Option<KnowledgeType> {
        self.knowledge_type
    }

    pub fn select_knowledge_type(&mut self, knowledge_type: Option<KnowledgeType>) {
        self.knowledge_type = knowledge_type;
    }

    /// Adds `functionality` if absent, removes it if present. Returns whether
    /// it is selected afterwards.
    pub fn toggle_functionality(&mut self, functionality: Functionality) -> bool {
        if self.functionalities.remove(&functionality) {
            return false;
        }
        self.functionalities.insert(functionality);
        true
    }

    pub fn functionalities(&self) -> &BTreeSet<Functionality> {
        &self.functionalities
    }

    pub fn set_field(&mut self, field: TextField, value: impl Into<String>) {
        self.text.insert(field, value.into());
    }

    pub fn field(&self, field: TextField) -> &str {
        self.text.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn source_crm(&self) -> Option<Crm> {
        self.source_crm
    }

    pub fn report_target(&self) -> ReportTarget {
        self.report_target
    }

    /// Selects the CRM for `role`; `None` clears the selection.
    pub fn select_crm(&mut self, role: CrmRole, crm: Option<Crm>) {
        match role {
            CrmRole::Source => self.source_crm = crm,
            CrmRole::Report => {
                self.report_target = crm.map_or(ReportTarget::Unselected, ReportTarget::Crm)
            }
        }
    }

    pub fn select_report_target(&mut self, target: ReportTarget) {
        self.report_target = target;
    }

    fn crm_for(&self, role: CrmRole) -> Option<Crm> {
        match role {
            CrmRole::Source => self.source_crm,
            CrmRole::Report => self.report_target.crm(),
        }
    }

    /// Stores a credential value for the CRM currently selected for `role`.
    pub fn set_credential(
        &mut self,
        role: CrmRole,
        field: CredentialField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let crm = self.crm_for(role).ok_or(FormError::NoCrmSelected { role })?;
        if !crm.accepts(field) {
            return Err(FormError::CredentialFieldUnavailable { crm, field });
        }
        self.credentials.insert(CredentialKey { role, crm, field }, value.into());
        Ok(())
    }

    pub fn credential(&self, role: CrmRole, field: CredentialField) -> Option<&str> {
        let crm = self.crm_for(role)?;
        self.credentials.get(&CredentialKey { role, crm, field }).map(String::as_str)
    }

    /// Credential inputs to render for `role`, filled with stored values.
    pub fn credential_inputs(&self, role: CrmRole) -> Vec<CredentialInput> {
        credential_inputs(self.crm_for(role), role)
            .into_iter()
            .map(|mut input| {
                input.value = self.credential(role, input.field).unwrap_or("").to_string();
                input
            })
            .collect()
    }

    /// Whether the outbound CRM section applies.
    pub fn shows_crm_section(&self) -> bool {
        self.agent_type == Some(AgentType::Outbound)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn submitted_record(&self) -> Option<&SubmissionAccepted> {
        self.submitted.as_ref()
    }

    pub fn missing_required_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| match field {
                RequiredField::AgentType => self.agent_type.is_none(),
                RequiredField::AgentName => self.field(TextField::AgentName).trim().is_empty(),
                RequiredField::AgentGender => self.agent_gender.is_none(),
                RequiredField::KnowledgeType => self.knowledge_type.is_none(),
                RequiredField::KnowledgeContent => {
                    self.field(TextField::KnowledgeContent).trim().is_empty()
                }
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.missing_required_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingRequiredFields(missing));
        }
        if self.functionalities.is_empty() {
            return Err(ValidationError::NoFunctionalities);
        }
        Ok(())
    }

    /// Validates and assembles the request body without touching any flags.
    pub fn build_payload(&self) -> Result<SubmissionPayload, SubmitError> {
        self.validate()?;

        let (Some(agent_type), Some(gender), Some(knowledge_type)) =
            (self.agent_type, self.agent_gender, self.knowledge_type)
        else {
            let missing = self.missing_required_fields();
            return Err(ValidationError::MissingRequiredFields(missing).into());
        };

        let outbound = agent_type == AgentType::Outbound;
        let source_crm = self.source_crm.filter(|_| outbound);
        let source_credentials = self.credential_json(CrmRole::Source, source_crm)?;

        let (report_crm, report_credentials, report_reuses_source) = match self.report_target {
            ReportTarget::ReuseSource if outbound => (
                source_crm.map(|crm| crm.label().to_string()),
                REUSE_SOURCE_CREDENTIALS.to_string(),
                Some(true),
            ),
            ReportTarget::Crm(crm) if outbound => (
                Some(crm.label().to_string()),
                self.credential_json(CrmRole::Report, Some(crm))?,
                None,
            ),
            _ => (None, self.credential_json(CrmRole::Report, None)?, None),
        };

        Ok(SubmissionPayload {
            agent_type: Some(agent_type.label().to_string()),
            agent_name: Some(self.field(TextField::AgentName).to_string()),
            agent_gender: Some(gender.label().to_string()),
            phone_number: Some(self.field(TextField::PhoneNumber).to_string()),
            account_sid: Some(self.field(TextField::TwilioSid).to_string()),
            knowledge_base_type: Some(knowledge_type.label().to_string()),
            knowledge_base_content: Some(self.field(TextField::KnowledgeContent).to_string()),
            functionalities: Some(
                self.functionalities.iter().map(|option| option.label().to_string()).collect(),
            ),
            source_crm: source_crm.map(|crm| crm.label().to_string()),
            source_crm_credentials: Some(source_credentials),
            report_crm,
            report_crm_credentials: Some(report_credentials),
            report_reuses_source,
            additional_notes: Some(self.field(TextField::AdditionalNotes).to_string()),
        })
    }

    fn credential_json(&self, role: CrmRole, crm: Option<Crm>) -> Result<String, SubmitError> {
        let fields = crm
            .map(|crm| {
                crm.credential_fields()
                    .iter()
                    .filter_map(|field| {
                        self.credentials
                            .get(&CredentialKey { role, crm, field: *field })
                            .map(|value| (field.key().to_string(), value.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        CredentialBundle {
            twilio_sid: self.field(TextField::TwilioSid).to_string(),
            twilio_token: self.field(TextField::TwilioToken).to_string(),
            fields,
        }
        .to_json()
        .map_err(|error| SubmitError::Encoding(error.to_string()))
    }

    /// Validates, builds the payload and marks the form as submitting. Fails
    /// without side effects when a submission is already in flight, the form
    /// was already accepted, or the form is incomplete.
    pub fn begin_submission(&mut self) -> Result<SubmissionPayload, SubmitError> {
        if self.submitting {
            return Err(SubmitError::AlreadySubmitting);
        }
        if self.submitted.is_some() {
            return Err(SubmitError::AlreadySubmitted);
        }
        let payload = self.build_payload()?;
        self.submitting = true;
        Ok(payload)
    }

    /// Records the outcome of the request started by `begin_submission`.
    /// Entered values are kept on failure so the user can retry.
    pub fn finish_submission(
        &mut self,
        outcome: Result<SubmissionAccepted, SubmitError>,
    ) -> Result<SubmissionAccepted, SubmitError> {
        self.submitting = false;
        match &outcome {
            Ok(accepted) => {
                info!(
                    event_name = "intake.client.submitted",
                    record_id = %accepted.record_id,
                    "agent configuration submitted"
                );
                self.submitted = Some(accepted.clone());
            }
            Err(error) => {
                warn!(
                    event_name = "intake.client.submit_failed",
                    error = %error,
                    "agent configuration submission failed"
                );
            }
        }
        outcome
    }

    pub async fn submit(
        &mut self,
        transport: &dyn SubmissionTransport,
    ) -> Result<SubmissionAccepted, SubmitError> {
        let payload = self.begin_submission()?;
        let outcome = match transport.send(&payload).await {
            Ok(response) => classify_response(response),
            Err(error) => Err(SubmitError::from(error)),
        };
        self.finish_submission(outcome)
    }

    /// "Create another agent": back to an empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{AgentForm, TextField};
    use crate::domain::agent::{AgentGender, AgentType, Functionality, KnowledgeType};
    use crate::domain::crm::{CredentialField, Crm, CrmRole, ReportTarget};
    use crate::domain::submission::{RequiredField, SubmissionAccepted, SubmissionPayload};
    use crate::errors::{FormError, SubmitError, TransportError, ValidationError};
    use crate::transport::{SubmissionTransport, TransportResponse};

    struct RecordingTransport {
        reply: Result<TransportResponse, TransportError>,
        sent: Mutex<Vec<SubmissionPayload>>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(TransportResponse { status, body: body.to_string() }),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: TransportError) -> Self {
            Self { reply: Err(error), sent: Mutex::new(Vec::new()) }
        }

        fn sent(&self) -> Vec<SubmissionPayload> {
            self.sent.lock().expect("sent lock").clone()
        }
    }

    #[async_trait]
    impl SubmissionTransport for RecordingTransport {
        async fn send(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<TransportResponse, TransportError> {
            self.sent.lock().expect("sent lock").push(payload.clone());
            self.reply.clone()
        }
    }

    fn inbound_form() -> AgentForm {
        let mut form = AgentForm::new();
        form.select_agent_type(Some(AgentType::Inbound));
        form.set_field(TextField::AgentName, "Sarah");
        form.select_agent_gender(Some(AgentGender::Female));
        form.select_knowledge_type(Some(KnowledgeType::Text));
        form.set_field(TextField::KnowledgeContent, "FAQ text");
        form.toggle_functionality(Functionality::BookAppointment);
        form
    }

    #[tokio::test]
    async fn each_missing_required_field_blocks_submission_without_request() {
        for missing in RequiredField::ALL {
            let mut form = inbound_form();
            match missing {
                RequiredField::AgentType => form.select_agent_type(None),
                RequiredField::AgentName => form.set_field(TextField::AgentName, ""),
                RequiredField::AgentGender => form.select_agent_gender(None),
                RequiredField::KnowledgeType => form.select_knowledge_type(None),
                RequiredField::KnowledgeContent => {
                    form.set_field(TextField::KnowledgeContent, "  ")
                }
            }
            let transport = RecordingTransport::replying(200, "{}");

            let error = form.submit(&transport).await.expect_err("submission should be blocked");

            assert_eq!(
                error,
                SubmitError::Validation(ValidationError::MissingRequiredFields(vec![missing]))
            );
            assert!(transport.sent().is_empty(), "no request when {missing} is missing");
            assert!(!form.is_submitting());
        }
    }

    #[tokio::test]
    async fn empty_functionality_set_blocks_submission() {
        let mut form = inbound_form();
        form.toggle_functionality(Functionality::BookAppointment);
        let transport = RecordingTransport::replying(200, "{}");

        let error = form.submit(&transport).await.expect_err("should be blocked");

        assert_eq!(error, SubmitError::Validation(ValidationError::NoFunctionalities));
        assert_eq!(error.user_message(), "Please select at least one functionality.");
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let mut form = inbound_form();
        let before = form.functionalities().clone();

        assert!(form.toggle_functionality(Functionality::QualifyLead));
        assert!(!form.toggle_functionality(Functionality::QualifyLead));

        assert_eq!(form.functionalities(), &before);
    }

    #[test]
    fn switching_crm_changes_inputs_and_hides_stale_values() {
        let mut form = inbound_form();
        form.select_agent_type(Some(AgentType::Outbound));
        form.select_crm(CrmRole::Source, Some(Crm::GoogleSheets));
        form.set_credential(CrmRole::Source, CredentialField::SpreadsheetId, "sheet-1")
            .expect("sheets takes a spreadsheet id");

        form.select_crm(CrmRole::Source, Some(Crm::Podio));
        let inputs = form.credential_inputs(CrmRole::Source);

        let keys: Vec<&str> = inputs.iter().map(|input| input.key.as_str()).collect();
        assert_eq!(keys, ["source-client-id", "source-client-secret"]);
        assert!(inputs.iter().all(|input| input.value.is_empty()));
        assert_eq!(form.credential(CrmRole::Source, CredentialField::SpreadsheetId), None);

        form.select_crm(CrmRole::Source, Some(Crm::GoogleSheets));
        assert_eq!(
            form.credential(CrmRole::Source, CredentialField::SpreadsheetId),
            Some("sheet-1")
        );
    }

    #[test]
    fn credentials_require_a_matching_crm_selection() {
        let mut form = inbound_form();

        assert_eq!(
            form.set_credential(CrmRole::Report, CredentialField::ApiKey, "k"),
            Err(FormError::NoCrmSelected { role: CrmRole::Report })
        );

        form.select_crm(CrmRole::Report, Some(Crm::Salesforce));
        assert_eq!(
            form.set_credential(CrmRole::Report, CredentialField::ApiKey, "k"),
            Err(FormError::CredentialFieldUnavailable {
                crm: Crm::Salesforce,
                field: CredentialField::ApiKey
            })
        );
    }

    #[test]
    fn source_and_report_credentials_do_not_collide() {
        let mut form = inbound_form();
        form.select_crm(CrmRole::Source, Some(Crm::HubSpot));
        form.select_crm(CrmRole::Report, Some(Crm::HubSpot));
        form.set_credential(CrmRole::Source, CredentialField::ApiKey, "source-key").expect("set");
        form.set_credential(CrmRole::Report, CredentialField::ApiKey, "report-key").expect("set");

        assert_eq!(form.credential(CrmRole::Source, CredentialField::ApiKey), Some("source-key"));
        assert_eq!(form.credential(CrmRole::Report, CredentialField::ApiKey), Some("report-key"));
    }

    #[test]
    fn reuse_source_payload_copies_source_crm_and_uses_sentinel() {
        let mut form = inbound_form();
        form.select_agent_type(Some(AgentType::Outbound));
        form.select_crm(CrmRole::Source, Some(Crm::HubSpot));
        form.set_credential(CrmRole::Source, CredentialField::ApiKey, "abc123").expect("set");
        form.select_report_target(ReportTarget::ReuseSource);

        let payload = form.build_payload().expect("payload should build");

        assert_eq!(payload.agent_type.as_deref(), Some("Outbound"));
        assert_eq!(payload.source_crm.as_deref(), Some("HubSpot"));
        assert_eq!(
            payload.source_crm_credentials.as_deref(),
            Some(r#"{"twilioSID":"","twilioToken":"","api-key":"abc123"}"#)
        );
        assert_eq!(payload.report_crm.as_deref(), Some("HubSpot"));
        assert_eq!(
            payload.report_crm_credentials.as_deref(),
            Some("reuse source CRM credentials")
        );
        assert_eq!(payload.report_reuses_source, Some(true));
        assert!(form.credential_inputs(CrmRole::Report).is_empty());
    }

    #[test]
    fn separate_report_crm_bundles_its_own_credentials() {
        let mut form = inbound_form();
        form.select_agent_type(Some(AgentType::Outbound));
        form.set_field(TextField::TwilioSid, "AC42");
        form.set_field(TextField::TwilioToken, "secret");
        form.select_crm(CrmRole::Source, Some(Crm::Podio));
        form.select_crm(CrmRole::Report, Some(Crm::Salesforce));
        form.set_credential(CrmRole::Report, CredentialField::InstanceUrl, "https://acme.my")
            .expect("set");

        let payload = form.build_payload().expect("payload should build");

        assert_eq!(payload.account_sid.as_deref(), Some("AC42"));
        assert_eq!(payload.report_crm.as_deref(), Some("Salesforce"));
        assert_eq!(
            payload.report_crm_credentials.as_deref(),
            Some(r#"{"twilioSID":"AC42","twilioToken":"secret","instance-url":"https://acme.my"}"#)
        );
        assert_eq!(payload.report_reuses_source, None);
    }

    #[test]
    fn inbound_payload_omits_crm_choices() {
        let mut form = inbound_form();
        form.select_crm(CrmRole::Source, Some(Crm::HubSpot));
        form.select_report_target(ReportTarget::ReuseSource);

        let payload = form.build_payload().expect("payload should build");

        assert!(!form.shows_crm_section());
        assert_eq!(payload.source_crm, None);
        assert_eq!(payload.report_crm, None);
        assert_eq!(
            payload.source_crm_credentials.as_deref(),
            Some(r#"{"twilioSID":"","twilioToken":""}"#)
        );
    }

    #[tokio::test]
    async fn successful_inbound_submission_sends_capitalized_values() {
        let mut form = inbound_form();
        let transport = RecordingTransport::replying(
            200,
            r#"{"message":"Form submitted successfully","recordId":"recSarah"}"#,
        );

        let accepted = form.submit(&transport).await.expect("submission should succeed");

        assert_eq!(accepted.record_id, "recSarah");
        assert!(form.is_submitted());
        assert!(!form.is_submitting());

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].agent_type.as_deref(), Some("Inbound"));
        assert_eq!(sent[0].agent_gender.as_deref(), Some("Female"));
        assert_eq!(sent[0].knowledge_base_type.as_deref(), Some("Text"));
        assert_eq!(sent[0].knowledge_base_content.as_deref(), Some("FAQ text"));
        assert_eq!(sent[0].functionalities, Some(vec!["Book Appointment".to_string()]));
    }

    #[tokio::test]
    async fn failed_submission_keeps_input_and_clears_submitting() {
        let mut form = inbound_form();
        let transport = RecordingTransport::failing(TransportError::Timeout);

        let error = form.submit(&transport).await.expect_err("transport failure");

        assert!(matches!(error, SubmitError::Network(TransportError::Timeout)));
        assert!(!form.is_submitting());
        assert!(!form.is_submitted());
        assert_eq!(form.field(TextField::AgentName), "Sarah");
        assert!(form.build_payload().is_ok(), "form stays ready for a retry");
    }

    #[test]
    fn second_begin_while_in_flight_is_refused() {
        let mut form = inbound_form();
        form.begin_submission().expect("first begin");

        assert_eq!(form.begin_submission(), Err(SubmitError::AlreadySubmitting));

        let outcome = form.finish_submission(Err(SubmitError::Server { status: 500 }));
        assert!(outcome.is_err());
        assert!(form.begin_submission().is_ok());
    }

    #[tokio::test]
    async fn accepted_form_refuses_to_submit_again_until_reset() {
        let mut form = inbound_form();
        let transport = RecordingTransport::replying(
            200,
            r#"{"message":"Form submitted successfully","recordId":"recOnce"}"#,
        );
        form.submit(&transport).await.expect("first submission succeeds");

        let error = form.submit(&transport).await.expect_err("second submission is refused");

        assert_eq!(error, SubmitError::AlreadySubmitted);
        assert!(!error.was_sent());
        assert!(error.user_message().contains("Create another agent"));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(form.submitted_record().map(|record| record.record_id.as_str()), Some("recOnce"));

        form.reset();
        assert!(!form.is_submitted());
    }

    #[test]
    fn reset_clears_everything() {
        let mut form = inbound_form();
        form.finish_submission(Ok(SubmissionAccepted {
            message: "ok".to_string(),
            record_id: "rec1".to_string(),
        }))
        .expect("accepted");

        form.reset();

        assert!(!form.is_submitted());
        assert_eq!(form.agent_type(), None);
        assert!(form.functionalities().is_empty());
        assert_eq!(form.field(TextField::AgentName), "");
    }
}
