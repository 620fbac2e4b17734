use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use super::alerts::AlertCenter;
use super::gate::{RequestGate, Ticket};
use super::poller::PollKind;
use super::summary::aggregate;
use crate::core::api::NotificationApi;
use crate::enums::NotificationFilter;
use crate::errors::Error;
use crate::models::{Notification, NotificationId, NotificationSummary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    pub items: Vec<Notification>,
    pub summary: NotificationSummary,
}

/// Local mirror of the user's notifications and badge counts.
///
/// Refreshes replace the list wholesale; mutations are confirmed by the
/// server before they touch local state. The list and the badge counts
/// each have their own gate; mutations advance both, so a poll issued
/// before a mutation can never undo it.
pub struct NotificationSync<A> {
    api: Arc<A>,
    state: RwLock<NotificationSnapshot>,
    list_gate: RequestGate,
    summary_gate: RequestGate,
    alerts: Arc<AlertCenter>,
    updates: watch::Sender<NotificationSnapshot>,
}

impl<A: NotificationApi> NotificationSync<A> {
    pub fn new(api: Arc<A>, alerts: Arc<AlertCenter>) -> Self {
        let (updates, _) = watch::channel(NotificationSnapshot::default());
        Self {
            api,
            state: RwLock::new(NotificationSnapshot::default()),
            list_gate: RequestGate::new(),
            summary_gate: RequestGate::new(),
            alerts,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.updates.subscribe()
    }

    pub fn alerts(&self) -> &Arc<AlertCenter> {
        &self.alerts
    }

    pub async fn snapshot(&self) -> NotificationSnapshot {
        self.state.read().await.clone()
    }

    pub async fn summary(&self) -> NotificationSummary {
        self.state.read().await.summary
    }

    pub async fn filtered(&self, filter: NotificationFilter) -> Vec<Notification> {
        self.state
            .read()
            .await
            .items
            .iter()
            .filter(|n| n.matches(filter))
            .cloned()
            .collect()
    }

    /// Fetches the list and the summary together. A failing summary falls
    /// back to local counts; a failing list leaves state untouched.
    pub async fn refresh(&self, kind: PollKind) -> Result<(), Error> {
        let ticket = self.list_gate.issue();
        let summary_ticket = self.summary_gate.issue();
        let (list, summary) = futures::future::join(
            self.api.list_notifications(),
            self.api.notification_summary(),
        )
        .await;

        let items = match list {
            Ok(items) => items,
            Err(e) => {
                if !kind.is_silent() && !e.is_auth() {
                    self.alerts.error(e.to_string());
                }
                return Err(e);
            }
        };
        let summary = aggregate(summary, &items);

        let mut state = self.state.write().await;
        if !self.list_gate.admit(ticket) {
            tracing::debug!("Dropping stale notification list {ticket:?}");
            return Ok(());
        }
        state.items = items;
        if self.summary_gate.admit(summary_ticket) {
            state.summary = summary;
        }
        self.publish(&state);

        tracing::debug!(
            total = state.summary.total,
            unread = state.summary.unread,
            "Notifications refreshed"
        );
        Ok(())
    }

    /// Badge-only refresh: asks the summary endpoint and counts the local
    /// list when it cannot answer.
    pub async fn refresh_summary(&self) -> Result<(), Error> {
        let ticket = self.summary_gate.issue();
        let response = self.api.notification_summary().await;

        let mut state = self.state.write().await;
        if !self.summary_gate.admit(ticket) {
            tracing::debug!("Dropping stale notification summary {ticket:?}");
            return Ok(());
        }
        state.summary = aggregate(response, &state.items);
        self.publish(&state);
        Ok(())
    }

    pub async fn mark_read(&self, id: NotificationId) -> Result<(), Error> {
        let tickets = self.issue_for_mutation();
        self.api
            .mark_notification_read(id)
            .await
            .map_err(|e| self.report(e))?;

        let mut state = self.state.write().await;
        self.admit_mutation(tickets);
        let was_unread = match state.items.iter_mut().find(|n| n.id == id) {
            Some(item) => !std::mem::replace(&mut item.is_read, true),
            None => true,
        };
        if was_unread {
            state.summary.mark_one_read();
        }
        self.publish(&state);
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), Error> {
        let tickets = self.issue_for_mutation();
        self.api
            .mark_all_notifications_read()
            .await
            .map_err(|e| self.report(e))?;

        let mut state = self.state.write().await;
        self.admit_mutation(tickets);
        for item in state.items.iter_mut() {
            item.is_read = true;
        }
        state.summary.mark_all_read();
        self.publish(&state);
        Ok(())
    }

    pub async fn delete(&self, id: NotificationId) -> Result<(), Error> {
        let tickets = self.issue_for_mutation();
        self.api
            .delete_notification(id)
            .await
            .map_err(|e| self.report(e))?;

        let mut state = self.state.write().await;
        self.admit_mutation(tickets);
        let removed = state
            .items
            .iter()
            .position(|n| n.id == id)
            .map(|index| state.items.remove(index));
        let was_unread = removed.as_ref().is_some_and(|n| !n.is_read);
        state.summary.remove_one(was_unread);
        self.publish(&state);
        Ok(())
    }

    fn issue_for_mutation(&self) -> (Ticket, Ticket) {
        (self.list_gate.issue(), self.summary_gate.issue())
    }

    fn admit_mutation(&self, (list, summary): (Ticket, Ticket)) {
        self.list_gate.admit(list);
        self.summary_gate.admit(summary);
    }

    fn report(&self, e: Error) -> Error {
        self.alerts.error(e.to_string());
        e
    }

    fn publish(&self, state: &NotificationSnapshot) {
        self.updates.send_replace(state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http::StatusCode;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeNotificationApi {
        server: Mutex<Vec<Notification>>,
        summary_fails: AtomicBool,
        mutations_fail: AtomicBool,
        scripted_lists: Mutex<VecDeque<oneshot::Receiver<Vec<Notification>>>>,
    }

    impl FakeNotificationApi {
        fn with(items: Vec<Notification>) -> Arc<Self> {
            Arc::new(Self {
                server: Mutex::new(items),
                ..Self::default()
            })
        }

        fn check_mutation(&self) -> Result<(), Error> {
            if self.mutations_fail.load(Ordering::SeqCst) {
                return Err(Error::api(StatusCode::NOT_FOUND, "Notification not found"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationApi for FakeNotificationApi {
        async fn list_notifications(&self) -> Result<Vec<Notification>, Error> {
            let scripted = self.scripted_lists.lock().unwrap().pop_front();
            match scripted {
                Some(rx) => Ok(rx.await.unwrap_or_default()),
                None => Ok(self.server.lock().unwrap().clone()),
            }
        }

        async fn notification_summary(&self) -> Result<Option<Value>, Error> {
            if self.summary_fails.load(Ordering::SeqCst) {
                return Err(Error::api(StatusCode::INTERNAL_SERVER_ERROR, "summary down"));
            }
            let server = self.server.lock().unwrap();
            let unread = server.iter().filter(|n| !n.is_read).count();
            Ok(Some(json!({ "total": server.len(), "unread": unread })))
        }

        async fn mark_notification_read(&self, id: NotificationId) -> Result<(), Error> {
            self.check_mutation()?;
            for n in self.server.lock().unwrap().iter_mut().filter(|n| n.id == id) {
                n.is_read = true;
            }
            Ok(())
        }

        async fn mark_all_notifications_read(&self) -> Result<(), Error> {
            self.check_mutation()?;
            for n in self.server.lock().unwrap().iter_mut() {
                n.is_read = true;
            }
            Ok(())
        }

        async fn delete_notification(&self, id: NotificationId) -> Result<(), Error> {
            self.check_mutation()?;
            self.server.lock().unwrap().retain(|n| n.id != id);
            Ok(())
        }
    }

    fn notification(id: i64, is_read: bool) -> Notification {
        serde_json::from_value(json!({
            "id": id,
            "type": "consult_message",
            "title": format!("Notification {id}"),
            "is_read": is_read
        }))
        .unwrap()
    }

    fn sync_for(api: Arc<FakeNotificationApi>) -> NotificationSync<FakeNotificationApi> {
        NotificationSync::new(api, Arc::new(AlertCenter::new(Duration::from_secs(4))))
    }

    #[tokio::test]
    async fn summary_failure_derives_counts_from_list() {
        let api = FakeNotificationApi::with(vec![notification(1, false), notification(2, true)]);
        api.summary_fails.store(true, Ordering::SeqCst);
        let sync = sync_for(api);

        sync.refresh(PollKind::Initial).await.unwrap();

        assert_eq!(sync.summary().await, NotificationSummary { total: 2, unread: 1 });
        assert!(sync.alerts().active().is_empty());
    }

    #[tokio::test]
    async fn mark_read_flips_item_and_decrements_once() {
        let api = FakeNotificationApi::with(vec![notification(1, false), notification(2, false)]);
        let sync = sync_for(api);
        sync.refresh(PollKind::Initial).await.unwrap();

        sync.mark_read(1).await.unwrap();
        sync.mark_read(1).await.unwrap();

        let snapshot = sync.snapshot().await;
        assert!(snapshot.items.iter().find(|n| n.id == 1).unwrap().is_read);
        assert_eq!(snapshot.summary, NotificationSummary { total: 2, unread: 1 });
    }

    #[tokio::test]
    async fn mark_read_clamps_at_zero() {
        let api = FakeNotificationApi::with(vec![]);
        let sync = sync_for(api);
        sync.refresh(PollKind::Initial).await.unwrap();

        sync.mark_read(42).await.unwrap();
        assert_eq!(sync.summary().await.unread, 0);
    }

    #[tokio::test]
    async fn mark_all_read_stays_zero_after_next_poll() {
        let api = FakeNotificationApi::with(vec![notification(1, false), notification(2, false)]);
        let sync = sync_for(api);
        sync.refresh(PollKind::Initial).await.unwrap();

        sync.mark_all_read().await.unwrap();
        assert_eq!(sync.summary().await.unread, 0);

        sync.refresh(PollKind::Background).await.unwrap();
        assert_eq!(sync.summary().await, NotificationSummary { total: 2, unread: 0 });
        assert!(sync.filtered(NotificationFilter::Unread).await.is_empty());
    }

    #[tokio::test]
    async fn delete_adjusts_counts_by_read_state() {
        let api = FakeNotificationApi::with(vec![
            notification(1, false),
            notification(2, true),
            notification(3, false),
        ]);
        let sync = sync_for(api);
        sync.refresh(PollKind::Initial).await.unwrap();

        sync.delete(2).await.unwrap();
        let snapshot = sync.snapshot().await;
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.summary, NotificationSummary { total: 2, unread: 2 });

        sync.delete(1).await.unwrap();
        let snapshot = sync.snapshot().await;
        assert_eq!(snapshot.items.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(snapshot.summary, NotificationSummary { total: 1, unread: 1 });
    }

    #[tokio::test]
    async fn failed_mutation_leaves_state_and_raises_alert() {
        let api = FakeNotificationApi::with(vec![notification(1, false)]);
        let sync = sync_for(Arc::clone(&api));
        sync.refresh(PollKind::Initial).await.unwrap();
        let before = sync.snapshot().await;

        api.mutations_fail.store(true, Ordering::SeqCst);
        assert!(sync.mark_read(1).await.is_err());
        assert!(sync.delete(1).await.is_err());
        assert!(sync.mark_all_read().await.is_err());

        assert_eq!(sync.snapshot().await, before);
        let alerts = sync.alerts().active();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].text, "Notification not found");
    }

    #[tokio::test]
    async fn out_of_order_polls_keep_latest_issued() {
        let api = FakeNotificationApi::with(vec![]);
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        api.scripted_lists.lock().unwrap().extend([rx_a, rx_b]);
        let sync = sync_for(api);

        let poll_a = sync.refresh(PollKind::Background);
        let poll_b = sync.refresh(PollKind::Background);
        let driver = async {
            tx_b.send(vec![notification(2, false)]).unwrap();
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            tx_a.send(vec![notification(1, false)]).unwrap();
        };

        let (a, b, _) = tokio::join!(poll_a, poll_b, driver);
        a.unwrap();
        b.unwrap();

        let ids: Vec<_> = sync.snapshot().await.items.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn poll_issued_before_mutation_cannot_undo_it() {
        let api = FakeNotificationApi::with(vec![notification(1, false)]);
        let (tx, rx) = oneshot::channel();
        let sync = sync_for(Arc::clone(&api));
        sync.refresh(PollKind::Initial).await.unwrap();

        api.scripted_lists.lock().unwrap().push_back(rx);
        let stale_poll = sync.refresh(PollKind::Background);
        let mutate_then_release = async {
            tokio::task::yield_now().await;
            sync.mark_read(1).await.unwrap();
            tx.send(vec![notification(1, false)]).unwrap();
        };
        let (poll, _) = tokio::join!(stale_poll, mutate_then_release);
        poll.unwrap();

        let snapshot = sync.snapshot().await;
        assert!(snapshot.items[0].is_read);
        assert_eq!(snapshot.summary.unread, 0);
    }

    #[tokio::test]
    async fn subscribers_see_applied_changes() {
        let api = FakeNotificationApi::with(vec![notification(1, false)]);
        let sync = sync_for(api);
        let mut updates = sync.subscribe();

        sync.refresh(PollKind::Initial).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().summary.unread, 1);

        sync.mark_read(1).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().summary.unread, 0);
    }

    #[tokio::test]
    async fn summary_only_refresh_falls_back_to_local_list() {
        let api = FakeNotificationApi::with(vec![notification(1, false), notification(2, false)]);
        let sync = sync_for(Arc::clone(&api));
        sync.refresh(PollKind::Initial).await.unwrap();

        api.server.lock().unwrap().clear();
        sync.refresh_summary().await.unwrap();
        assert_eq!(sync.summary().await, NotificationSummary { total: 0, unread: 0 });

        api.summary_fails.store(true, Ordering::SeqCst);
        sync.refresh_summary().await.unwrap();
        assert_eq!(sync.summary().await, NotificationSummary { total: 2, unread: 2 });
        assert_eq!(sync.snapshot().await.items.len(), 2);
    }

    #[tokio::test]
    async fn badge_refresh_does_not_drop_slower_list_poll() {
        let api = FakeNotificationApi::with(vec![notification(1, false)]);
        let (tx, rx) = oneshot::channel();
        api.scripted_lists.lock().unwrap().push_back(rx);
        let sync = sync_for(Arc::clone(&api));

        let list_poll = sync.refresh(PollKind::Background);
        let badge_then_release = async {
            tokio::task::yield_now().await;
            sync.refresh_summary().await.unwrap();
            tx.send(vec![notification(1, false)]).unwrap();
        };
        let (poll, _) = tokio::join!(list_poll, badge_then_release);
        poll.unwrap();

        let snapshot = sync.snapshot().await;
        let ids: Vec<_> = snapshot.items.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(snapshot.summary, NotificationSummary { total: 1, unread: 1 });
    }
}
