use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use validator::Validate;

use super::alerts::AlertCenter;
use super::gate::{RequestGate, Ticket};
use super::poller::PollKind;
use super::reconcile::{reconcile_collection, reconcile_selection, select_initial};
use crate::config::SyncSettings;
use crate::core::api::ConsultationApi;
use crate::enums::{ConsultationAction, Role};
use crate::errors::Error;
use crate::models::{Consultation, ConsultationId, MessageThread, OutgoingMessage};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultationSnapshot {
    pub consultations: Vec<Arc<Consultation>>,
    /// Requests waiting for a doctor to accept or reject them.
    pub pending: Vec<Arc<Consultation>>,
    pub selected: Option<Arc<Consultation>>,
    pub thread: MessageThread,
    pub draft: String,
}

impl ConsultationSnapshot {
    pub fn selected_id(&self) -> Option<ConsultationId> {
        self.selected.as_ref().map(|c| c.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server accepted the message and the thread was re-fetched.
    Delivered,
    /// The POST failed; the thread was re-fetched in case it landed anyway.
    Unconfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected,
    Cancelled,
}

/// Gate for destructive actions.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone)]
struct ChatSettings {
    role: Role,
    auto_select: bool,
    refetch_delay: Duration,
    refetch_attempts: usize,
}

pub struct ConsultationSync<A> {
    api: Arc<A>,
    settings: ChatSettings,
    state: RwLock<ConsultationSnapshot>,
    list_gate: RequestGate,
    pending_gate: RequestGate,
    thread_gate: RequestGate,
    alerts: Arc<AlertCenter>,
    updates: watch::Sender<ConsultationSnapshot>,
}

impl<A: ConsultationApi> ConsultationSync<A> {
    pub fn new(api: Arc<A>, settings: &SyncSettings, alerts: Arc<AlertCenter>) -> Self {
        let (updates, _) = watch::channel(ConsultationSnapshot::default());
        Self {
            api,
            settings: ChatSettings {
                role: settings.role,
                auto_select: settings.auto_select,
                refetch_delay: settings.resend_refetch_delay,
                refetch_attempts: settings.resend_refetch_attempts.max(1),
            },
            state: RwLock::new(ConsultationSnapshot::default()),
            list_gate: RequestGate::new(),
            pending_gate: RequestGate::new(),
            thread_gate: RequestGate::new(),
            alerts,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConsultationSnapshot> {
        self.updates.subscribe()
    }

    pub fn alerts(&self) -> &Arc<AlertCenter> {
        &self.alerts
    }

    pub async fn snapshot(&self) -> ConsultationSnapshot {
        self.state.read().await.clone()
    }

    pub async fn selected(&self) -> Option<Arc<Consultation>> {
        self.state.read().await.selected.clone()
    }

    /// One poll cycle: the consultation list and pending requests first,
    /// then the selected thread.
    pub async fn refresh(&self, kind: PollKind) -> Result<(), Error> {
        let selected = self.refresh_list(kind).await;
        if let Err(e) = self.refresh_pending().await {
            tracing::warn!("Pending consultation requests unavailable: {e}");
        }

        if let Some(selected) = selected? {
            self.load_thread(selected.id).await;
            self.mark_viewing(selected.id).await;
        }
        Ok(())
    }

    /// Re-fetches pending requests. Failures keep the previous list.
    pub async fn refresh_pending(&self) -> Result<(), Error> {
        let ticket = self.pending_gate.issue();
        let fetched = self.api.list_pending_requests(self.settings.role).await?;

        let mut state = self.state.write().await;
        if !self.pending_gate.admit(ticket) {
            tracing::debug!("Dropping stale pending requests {ticket:?}");
            return Ok(());
        }
        let pending = reconcile_collection(&state.pending, fetched);
        if pending != state.pending {
            state.pending = pending;
            self.publish(&state);
        }
        Ok(())
    }

    /// Applies a fresh consultation list; `None` when nothing is selected
    /// or the response was stale.
    async fn refresh_list(&self, kind: PollKind) -> Result<Option<Arc<Consultation>>, Error> {
        let ticket = self.list_gate.issue();
        let fetched = match self.api.list_consultations(self.settings.role).await {
            Ok(list) => list,
            Err(e) => {
                if !kind.is_silent() && !e.is_auth() {
                    self.alerts.error(e.to_string());
                }
                return Err(e);
            }
        };

        let selected = {
            let mut state = self.state.write().await;
            if !self.list_gate.admit(ticket) {
                tracing::debug!("Dropping stale consultation list {ticket:?}");
                return Ok(None);
            }

            let consultations = reconcile_collection(&state.consultations, fetched);
            let had_selection = state.selected.is_some();
            let mut selected = reconcile_selection(state.selected.as_ref(), &consultations);
            if !had_selection && self.settings.auto_select {
                selected = select_initial(&consultations);
            }

            if selected.as_ref().map(|c| c.id) != state.selected_id() {
                state.thread = MessageThread::default();
            }
            state.consultations = consultations;
            state.selected = selected.clone();
            self.publish(&state);
            selected
        };
        Ok(selected)
    }

    pub async fn select(&self, id: ConsultationId) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            let Some(consultation) = state.consultations.iter().find(|c| c.id == id).cloned()
            else {
                return Err(Error::not_found(&format!("consultation {id}")));
            };
            if state.selected_id() != Some(id) {
                state.thread = MessageThread::default();
            }
            state.selected = Some(consultation);
            self.publish(&state);
        }

        self.load_thread(id).await;
        self.mark_viewing(id).await;
        Ok(())
    }

    pub async fn set_draft(&self, text: &str) {
        let mut state = self.state.write().await;
        state.draft = text.to_string();
        self.publish(&state);
    }

    /// Sends the current draft. The draft is cleared before the request goes
    /// out and is not restored on failure.
    pub async fn send_draft(&self) -> Result<SendOutcome, Error> {
        let (id, message) = {
            let mut state = self.state.write().await;
            let Some(id) = state.selected_id() else {
                return Err(Error::bad_request("No consultation selected"));
            };
            let message = OutgoingMessage::new(&state.draft, Vec::new());
            if message.content.is_empty() {
                return Err(Error::bad_request("Message content is required"));
            }
            state.draft.clear();
            self.publish(&state);
            (id, message)
        };

        self.deliver(id, message).await
    }

    /// Sends `content` with optional shared documents to the selected consultation.
    pub async fn send_message(
        &self,
        content: &str,
        document_ids: Vec<i64>,
    ) -> Result<SendOutcome, Error> {
        let message = OutgoingMessage::new(content, document_ids);
        message
            .validate()
            .map_err(|_| Error::bad_request("Message content or documents are required"))?;
        let id = self
            .state
            .read()
            .await
            .selected_id()
            .ok_or_else(|| Error::bad_request("No consultation selected"))?;

        self.deliver(id, message).await
    }

    pub async fn end_selected(&self, confirmation: &impl Confirmation) -> Result<EndOutcome, Error> {
        let Some(id) = self.state.read().await.selected_id() else {
            return Err(Error::bad_request("No consultation selected"));
        };
        if !confirmation.confirm("Are you sure you want to end this consultation?") {
            tracing::debug!("Ending consultation {id} cancelled by user");
            return Ok(EndOutcome::Cancelled);
        }

        let ticket = self.list_gate.issue();
        self.api
            .transition(id, ConsultationAction::End)
            .await
            .map_err(|e| self.report(e))?;

        {
            let mut state = self.state.write().await;
            self.list_gate.admit(ticket);
            if state.selected_id() == Some(id) {
                state.selected = None;
                state.thread = MessageThread::default();
            }
            self.publish(&state);
        }
        tracing::info!("Consultation {id} ended");

        if let Err(e) = self.refresh(PollKind::Background).await {
            tracing::warn!("Refreshing consultations after ending {id} failed: {e}");
        }
        Ok(EndOutcome::Ended)
    }

    pub async fn accept(&self, id: ConsultationId) -> Result<(), Error> {
        self.answer_request(id, ConsultationAction::Accept).await
    }

    pub async fn reject(
        &self,
        id: ConsultationId,
        confirmation: &impl Confirmation,
    ) -> Result<RejectOutcome, Error> {
        if !confirmation.confirm("Are you sure you want to reject this consultation request?") {
            tracing::debug!("Rejecting request {id} cancelled by user");
            return Ok(RejectOutcome::Cancelled);
        }
        self.answer_request(id, ConsultationAction::Reject).await?;
        Ok(RejectOutcome::Rejected)
    }

    /// Accepts or rejects a pending request, then refreshes both lists.
    async fn answer_request(&self, id: ConsultationId, action: ConsultationAction) -> Result<(), Error> {
        let ticket = self.pending_gate.issue();
        self.api
            .transition(id, action)
            .await
            .map_err(|e| self.report(e))?;

        {
            let mut state = self.state.write().await;
            self.pending_gate.admit(ticket);
            state.pending.retain(|c| c.id != id);
            self.publish(&state);
        }
        tracing::info!("Consultation request {id}: {action}");

        if let Err(e) = self.refresh(PollKind::Background).await {
            tracing::warn!("Refreshing consultations after {action} on {id} failed: {e}");
        }
        Ok(())
    }

    async fn deliver(&self, id: ConsultationId, message: OutgoingMessage) -> Result<SendOutcome, Error> {
        match self.api.send_message(id, &message).await {
            Ok(_) => {
                self.load_thread(id).await;
                Ok(SendOutcome::Delivered)
            }
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                tracing::warn!("Sending to consultation {id} failed, re-fetching thread: {e}");
                let delay = self.settings.refetch_delay;
                tokio::time::sleep(delay).await;

                let retries = FixedInterval::new(delay).take(self.settings.refetch_attempts - 1);
                if let Err(e) = Retry::spawn(retries, || self.try_load_thread(id)).await {
                    tracing::warn!("Re-fetching thread {id} after failed send gave up: {e}");
                }
                Ok(SendOutcome::Unconfirmed)
            }
        }
    }

    /// Poll-path thread load: a failed fetch empties the thread.
    async fn load_thread(&self, id: ConsultationId) {
        let ticket = self.thread_gate.issue();
        let thread = match self.api.message_thread(id).await {
            Ok(thread) => thread,
            Err(e) => {
                tracing::debug!("Fetching messages for consultation {id} failed: {e}");
                MessageThread::default()
            }
        };
        self.apply_thread(ticket, id, thread).await;
    }

    async fn try_load_thread(&self, id: ConsultationId) -> Result<(), Error> {
        let ticket = self.thread_gate.issue();
        let thread = self.api.message_thread(id).await?;
        self.apply_thread(ticket, id, thread).await;
        Ok(())
    }

    async fn apply_thread(
        &self,
        ticket: Ticket,
        id: ConsultationId,
        thread: MessageThread,
    ) {
        let mut state = self.state.write().await;
        if state.selected_id() != Some(id) {
            tracing::debug!("Dropping thread of consultation {id}, no longer selected");
            return;
        }
        if !self.thread_gate.admit(ticket) {
            tracing::debug!("Dropping stale thread of consultation {id} {ticket:?}");
            return;
        }
        if state.thread != thread {
            state.thread = thread;
            self.publish(&state);
        }
    }

    async fn mark_viewing(&self, id: ConsultationId) {
        if let Err(e) = self.api.mark_viewing(id).await {
            tracing::debug!("Marking consultation {id} as viewed failed: {e}");
        }
    }

    fn report(&self, e: Error) -> Error {
        self.alerts.error(e.to_string());
        e
    }

    fn publish(&self, state: &ConsultationSnapshot) {
        self.updates.send_replace(state.clone());
    }
}
