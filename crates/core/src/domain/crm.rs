//! CRM choices and the credential inputs each one asks for.

use serde::{Deserialize, Serialize};

/// Text that stands in for report credentials when the report role reuses the
/// source CRM.
pub const REUSE_SOURCE_CREDENTIALS: &str = "reuse source CRM credentials";

/// `reportCRM` value older clients send instead of the `reportReusesSource` flag.
pub const LEGACY_REUSE_SOURCE_CRM: &str = "Same as above";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Crm {
    GoogleSheets,
    Podio,
    HubSpot,
    GoHighLevel,
    Turnkey,
    Salesforce,
    Other,
}

/// Which side of the outbound integration a CRM serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrmRole {
    /// CRM contact data is pulled from.
    Source,
    /// CRM end-of-call reports are stored in.
    Report,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportTarget {
    #[default]
    Unselected,
    ReuseSource,
    Crm(Crm),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CredentialField {
    SpreadsheetId,
    ServiceAccount,
    ClientId,
    ClientSecret,
    ApiKey,
    InstanceUrl,
    AccessToken,
    ApiEndpoint,
    CrmName,
    AuthDetails,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Secret,
    MultiLine,
}

/// One credential input as presented to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CredentialInput {
    pub role: CrmRole,
    pub crm: Crm,
    pub field: CredentialField,
    pub key: String,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub kind: InputKind,
    pub value: String,
}

impl Crm {
    pub const ALL: [Self; 7] = [
        Self::GoogleSheets,
        Self::Podio,
        Self::HubSpot,
        Self::GoHighLevel,
        Self::Turnkey,
        Self::Salesforce,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GoogleSheets => "Google Sheets",
            Self::Podio => "Podio",
            Self::HubSpot => "HubSpot",
            Self::GoHighLevel => "GoHighLevel (GHL)",
            Self::Turnkey => "Turnkey",
            Self::Salesforce => "Salesforce",
            Self::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("GoHighLevel") || raw.eq_ignore_ascii_case("GHL") {
            return Some(Self::GoHighLevel);
        }
        Self::ALL.into_iter().find(|crm| crm.label().eq_ignore_ascii_case(raw))
    }

    pub fn credential_fields(&self) -> &'static [CredentialField] {
        use CredentialField::*;

        match self {
            Self::GoogleSheets => &[SpreadsheetId, ServiceAccount],
            Self::Podio => &[ClientId, ClientSecret],
            Self::HubSpot | Self::GoHighLevel => &[ApiKey],
            Self::Salesforce => &[InstanceUrl, AccessToken],
            Self::Turnkey => &[ApiEndpoint, ApiKey],
            Self::Other => &[CrmName, AuthDetails],
        }
    }

    pub fn accepts(&self, field: CredentialField) -> bool {
        self.credential_fields().contains(&field)
    }
}

impl std::fmt::Display for Crm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl CrmRole {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Report => "report",
        }
    }
}

impl ReportTarget {
    /// CRM whose credential inputs the report role renders, if any.
    pub fn crm(&self) -> Option<Crm> {
        match self {
            Self::Crm(crm) => Some(*crm),
            Self::Unselected | Self::ReuseSource => None,
        }
    }

    pub fn is_reuse_source(&self) -> bool {
        matches!(self, Self::ReuseSource)
    }
}

impl CredentialField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SpreadsheetId => "spreadsheet-id",
            Self::ServiceAccount => "service-account",
            Self::ClientId => "client-id",
            Self::ClientSecret => "client-secret",
            Self::ApiKey => "api-key",
            Self::InstanceUrl => "instance-url",
            Self::AccessToken => "access-token",
            Self::ApiEndpoint => "api-endpoint",
            Self::CrmName => "crm-name",
            Self::AuthDetails => "auth-details",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SpreadsheetId => "Spreadsheet ID",
            Self::ServiceAccount => "Service Account JSON",
            Self::ClientId => "Client ID",
            Self::ClientSecret => "Client Secret",
            Self::ApiKey => "API Key",
            Self::InstanceUrl => "Instance URL",
            Self::AccessToken => "Access Token",
            Self::ApiEndpoint => "API Endpoint",
            Self::CrmName => "CRM Name",
            Self::AuthDetails => "Authentication Details",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::SpreadsheetId => "Enter spreadsheet ID",
            Self::ServiceAccount => r#"{"type": "service_account", ...}"#,
            Self::ClientId => "Enter client ID",
            Self::ClientSecret => "Enter client secret",
            Self::ApiKey => "Enter API key",
            Self::InstanceUrl => "https://yourinstance.salesforce.com",
            Self::AccessToken => "Enter access token",
            Self::ApiEndpoint => "https://api.example.com",
            Self::CrmName => "Enter CRM name",
            Self::AuthDetails => "API keys, tokens, or other credentials",
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::ServiceAccount | Self::AuthDetails => InputKind::MultiLine,
            Self::ClientSecret | Self::ApiKey | Self::AccessToken => InputKind::Secret,
            Self::SpreadsheetId
            | Self::ClientId
            | Self::InstanceUrl
            | Self::ApiEndpoint
            | Self::CrmName => InputKind::Text,
        }
    }

    /// Input key namespaced by role, e.g. `source-api-key`.
    pub fn namespaced_key(&self, role: CrmRole) -> String {
        format!("{}-{}", role.prefix(), self.key())
    }
}

/// Credential inputs rendered for `crm` under `role`, without values.
pub fn credential_inputs(crm: Option<Crm>, role: CrmRole) -> Vec<CredentialInput> {
    let Some(crm) = crm else {
        return Vec::new();
    };

    crm.credential_fields()
        .iter()
        .map(|field| CredentialInput {
            role,
            crm,
            field: *field,
            key: field.namespaced_key(role),
            label: field.label(),
            placeholder: field.placeholder(),
            kind: field.kind(),
            value: String::new(),
        })
        .collect()
}
