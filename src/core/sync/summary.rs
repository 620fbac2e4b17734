use serde_json::Value;

use crate::errors::Error;
use crate::models::{Notification, NotificationSummary};

/// Badge counts for the current notification list.
///
/// The summary endpoint wins when it answers with a numeric `unread`;
/// otherwise (error, empty body, wrong shape) the counts are derived from
/// `items`. Summary failures are background noise and only logged.
pub fn aggregate(
    summary: Result<Option<Value>, Error>,
    items: &[Notification],
) -> NotificationSummary {
    match summary {
        Ok(Some(payload)) => match from_payload(&payload, items.len() as u64) {
            Some(summary) => summary,
            None => {
                tracing::warn!("Unexpected notification summary shape: {payload}");
                NotificationSummary::from_list(items)
            }
        },
        Ok(None) => NotificationSummary::from_list(items),
        Err(e) => {
            tracing::warn!("Notification summary unavailable, counting locally: {e}");
            NotificationSummary::from_list(items)
        }
    }
}

fn from_payload(payload: &Value, fallback_total: u64) -> Option<NotificationSummary> {
    let unread = payload.get("unread").and_then(as_count)?;
    let total = payload
        .get("total")
        .and_then(as_count)
        .unwrap_or(fallback_total);
    Some(NotificationSummary { total, unread })
}

/// Numeric JSON as a non-negative count.
fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if let Some(n) = value.as_i64() {
        return Some(n.max(0) as u64);
    }
    value.as_f64().map(|n| if n > 0.0 { n as u64 } else { 0 })
}
