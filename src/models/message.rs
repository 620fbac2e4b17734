use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::enums::SenderType;
use crate::utils::decode::{decode_list, deserialize_lenient_timestamp, null_as_default};

pub type MessageId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender_type: SenderType,
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<SharedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedDocument {
    pub id: i64,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything the messages endpoint returns for one consultation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageThread {
    pub messages: Vec<Message>,
    pub documents: Vec<SharedDocument>,
}

/// The two shapes served by `GET /consultation/{id}/messages`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ThreadPayload {
    Legacy(Vec<Value>),
    Current {
        #[serde(default)]
        messages: Value,
        #[serde(default)]
        documents: Value,
    },
}

impl MessageThread {
    /// Decodes either payload shape once; anything unrecognised is an empty thread.
    pub fn from_payload(payload: Option<Value>) -> Self {
        let Some(payload) = payload else {
            return Self::default();
        };

        match serde_json::from_value::<ThreadPayload>(payload) {
            Ok(ThreadPayload::Legacy(messages)) => Self {
                messages: decode_list(Some(Value::Array(messages)), "message"),
                documents: Vec::new(),
            },
            Ok(ThreadPayload::Current {
                messages,
                documents,
            }) => Self {
                messages: decode_list(Some(messages), "message"),
                documents: decode_list(Some(documents), "document"),
            },
            Err(e) => {
                tracing::warn!("Unrecognised message thread payload: {e}");
                Self::default()
            }
        }
    }

    pub fn last_message_id(&self) -> Option<MessageId> {
        self.messages.last().map(|m| m.id)
    }

    /// Messages that arrived after `seen`, in server order.
    pub fn messages_after(&self, seen: Option<MessageId>) -> &[Message] {
        match seen.and_then(|id| self.messages.iter().position(|m| m.id == id)) {
            Some(index) => &self.messages[index + 1..],
            None if seen.is_some() => &[],
            None => &self.messages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_outgoing"))]
pub struct OutgoingMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<i64>,
}

fn validate_outgoing(message: &OutgoingMessage) -> Result<(), ValidationError> {
    if message.content.trim().is_empty() && message.document_ids.is_empty() {
        return Err(ValidationError::new("empty_message"));
    }
    Ok(())
}

impl OutgoingMessage {
    pub fn new(content: &str, document_ids: Vec<i64>) -> Self {
        Self {
            content: content.trim().to_string(),
            document_ids,
        }
    }
}
