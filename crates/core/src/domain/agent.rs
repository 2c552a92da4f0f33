use serde::{Deserialize, Serialize};

/// Direction of the calls the requested voice agent handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Inbound,
    Outbound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentGender {
    Female,
    Male,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeType {
    Text,
    Url,
    Both,
}

/// Capabilities a requester can enable on the agent. Declaration order is the
/// order the options are presented and submitted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Functionality {
    BookAppointment,
    CreateTicket,
    SmsFollowUp,
    CollectInformation,
    QualifyLead,
}

impl AgentType {
    pub const ALL: [Self; 2] = [Self::Inbound, Self::Outbound];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    /// Value written to the record store.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }
}

impl AgentGender {
    pub const ALL: [Self; 3] = [Self::Female, Self::Male, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Neutral => "neutral",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Neutral => "Neutral",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "female" => Some(Self::Female),
            "male" => Some(Self::Male),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl KnowledgeType {
    pub const ALL: [Self; 3] = [Self::Text, Self::Url, Self::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Both => "both",
        }
    }

    /// Record-store value. `Url` keeps the first-letter-capitalized spelling
    /// existing rows were written with.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Url => "Url",
            Self::Both => "Both",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "url" => Some(Self::Url),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

impl Functionality {
    pub const ALL: [Self; 5] = [
        Self::BookAppointment,
        Self::CreateTicket,
        Self::SmsFollowUp,
        Self::CollectInformation,
        Self::QualifyLead,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BookAppointment => "Book Appointment",
            Self::CreateTicket => "Create Ticket",
            Self::SmsFollowUp => "SMS Follow-up",
            Self::CollectInformation => "Collect Information",
            Self::QualifyLead => "Qualify Lead",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|option| option.label().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for Functionality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
