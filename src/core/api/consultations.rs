use async_trait::async_trait;
use validator::Validate;

use super::client::ApiClient;
use crate::enums::{ConsultationAction, Role};
use crate::errors::Error;
use crate::models::{Consultation, ConsultationId, Message, MessageThread, OutgoingMessage};
use crate::utils::decode::decode_list;

#[async_trait]
pub trait ConsultationApi: Send + Sync {
    async fn list_consultations(&self, role: Role) -> Result<Vec<Consultation>, Error>;

    async fn list_pending_requests(&self, role: Role) -> Result<Vec<Consultation>, Error>;

    async fn message_thread(&self, id: ConsultationId) -> Result<MessageThread, Error>;

    /// Returns the created message when the server echoes it back.
    async fn send_message(
        &self,
        id: ConsultationId,
        message: &OutgoingMessage,
    ) -> Result<Option<Message>, Error>;

    async fn mark_viewing(&self, id: ConsultationId) -> Result<(), Error>;

    async fn transition(&self, id: ConsultationId, action: ConsultationAction) -> Result<(), Error>;
}

#[async_trait]
impl ConsultationApi for ApiClient {
    async fn list_consultations(&self, role: Role) -> Result<Vec<Consultation>, Error> {
        let payload = self.get(role.consultations_endpoint()).await?;
        Ok(decode_list(payload, "consultation"))
    }

    async fn list_pending_requests(&self, role: Role) -> Result<Vec<Consultation>, Error> {
        let payload = self.get(role.pending_requests_endpoint()).await?;
        Ok(decode_list(payload, "consultation request"))
    }

    async fn message_thread(&self, id: ConsultationId) -> Result<MessageThread, Error> {
        let payload = self.get(&format!("/consultation/{id}/messages")).await?;
        Ok(MessageThread::from_payload(payload))
    }

    async fn send_message(
        &self,
        id: ConsultationId,
        message: &OutgoingMessage,
    ) -> Result<Option<Message>, Error> {
        message
            .validate()
            .map_err(|_| Error::bad_request("Message content or documents are required"))?;

        let body = serde_json::to_value(message)?;
        let created = self
            .post(&format!("/consultation/{id}/messages"), Some(&body))
            .await?;

        Ok(created.and_then(|value| serde_json::from_value(value).ok()))
    }

    async fn mark_viewing(&self, id: ConsultationId) -> Result<(), Error> {
        self.post(&format!("/consultation/{id}/viewing"), None).await?;
        Ok(())
    }

    async fn transition(&self, id: ConsultationId, action: ConsultationAction) -> Result<(), Error> {
        self.post(&format!("/consultation/{id}/{action}"), None).await?;
        Ok(())
    }
}
