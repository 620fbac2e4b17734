use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, VariantNames};

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Default,
    EnumString,
    VariantNames,
    Display,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    ConsultRequest,
    ConsultAccept,
    ConsultReject,
    ConsultMessage,
    DocumentUpload,
    Analysis,
    Reminder,
    Tip,
    #[default]
    #[serde(other)]
    General,
}

impl NotificationType {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::ConsultRequest
            | NotificationType::ConsultAccept
            | NotificationType::ConsultReject => "Consultation",
            NotificationType::ConsultMessage => "Message",
            NotificationType::DocumentUpload => "Document",
            NotificationType::Analysis => "Analysis",
            NotificationType::Reminder => "Reminder",
            NotificationType::Tip => "Health Tip",
            NotificationType::General => "General",
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, Display, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConsultationStatus {
    Pending,
    Active,
    Ended,
    Rejected,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, Display, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SenderType {
    Patient,
    Doctor,
}

/// Status transitions a consultation accepts, rendered as the endpoint segment.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ConsultationAction {
    Accept,
    Reject,
    End,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, VariantNames, Display, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    /// Endpoint listing the consultations visible to this role.
    pub fn consultations_endpoint(&self) -> &'static str {
        match self {
            Role::Doctor => "/doctor/consultations",
            Role::Patient | Role::Admin => "/consultation/active",
        }
    }

    /// Consultation requests still waiting for a doctor.
    pub fn pending_requests_endpoint(&self) -> &'static str {
        match self {
            Role::Doctor => "/doctor/requests",
            Role::Patient | Role::Admin => "/consultation/requests/pending",
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Default, EnumString, Display, PartialEq, Eq,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PersistencePolicy {
    /// Session lives only as long as the process.
    #[default]
    TabScoped,
    /// Session is also written to the session file and survives restarts.
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
}
