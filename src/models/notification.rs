use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{NotificationFilter, NotificationType};
use crate::utils::decode::{deserialize_lenient_timestamp, null_as_default};

pub type NotificationId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: NotificationType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Notification {
    pub fn matches(&self, filter: NotificationFilter) -> bool {
        match filter {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !self.is_read,
        }
    }
}

/// Badge counters. Never persisted; recomputed on every refresh.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSummary {
    pub total: u64,
    pub unread: u64,
}

impl NotificationSummary {
    pub fn from_list(items: &[Notification]) -> Self {
        Self {
            total: items.len() as u64,
            unread: items.iter().filter(|n| !n.is_read).count() as u64,
        }
    }

    pub fn mark_one_read(&mut self) {
        self.unread = self.unread.saturating_sub(1);
    }

    pub fn mark_all_read(&mut self) {
        self.unread = 0;
    }

    pub fn remove_one(&mut self, was_unread: bool) {
        self.total = self.total.saturating_sub(1);
        if was_unread {
            self.unread = self.unread.saturating_sub(1);
        }
    }
}
