use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ConsultationStatus;
use crate::utils::decode::deserialize_lenient_timestamp;

pub type ConsultationId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub id: ConsultationId,
    pub status: ConsultationStatus,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_photo_url: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_photo_url: Option<String>,
    /// Set on pending requests only.
    #[serde(default)]
    pub primary_symptoms: Option<String>,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Consultation {
    /// Name of the other party, whichever side of the consultation we are on.
    pub fn counterpart_name(&self) -> &str {
        self.patient_name
            .as_deref()
            .or(self.doctor_name.as_deref())
            .unwrap_or("Unknown")
    }
}
