use async_trait::async_trait;
use serde_json::Value;

use super::client::ApiClient;
use crate::errors::Error;
use crate::models::{Notification, NotificationId};
use crate::utils::decode::decode_list;

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(&self) -> Result<Vec<Notification>, Error>;

    /// Raw summary payload; its shape is checked by the aggregator.
    async fn notification_summary(&self) -> Result<Option<Value>, Error>;

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), Error>;

    async fn mark_all_notifications_read(&self) -> Result<(), Error>;

    async fn delete_notification(&self, id: NotificationId) -> Result<(), Error>;
}

#[async_trait]
impl NotificationApi for ApiClient {
    async fn list_notifications(&self) -> Result<Vec<Notification>, Error> {
        let payload = self.get("/notifications").await?;
        Ok(decode_list(payload, "notification"))
    }

    async fn notification_summary(&self) -> Result<Option<Value>, Error> {
        self.get("/notifications?summary=true").await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), Error> {
        self.post(&format!("/notifications/{id}/read"), None).await?;
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> Result<(), Error> {
        self.post("/notifications/read_all", None).await?;
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<(), Error> {
        self.delete(&format!("/notifications/{id}")).await?;
        Ok(())
    }
}
