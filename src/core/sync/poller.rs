use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Floor for poll intervals; a zero period would make the timer panic.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// First refresh after start; callers may show progress and report errors.
    Initial,
    /// Timer-driven refresh; errors stay in the logs.
    Background,
}

impl PollKind {
    pub fn is_silent(&self) -> bool {
        matches!(self, PollKind::Background)
    }
}

/// Owns a running poll loop. Dropping it aborts the loop, including any
/// refresh still in flight.
pub struct PollerHandle {
    name: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the loop and waits for it; an in-flight refresh is cancelled.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!("Poller {} ended abnormally: {e}", self.name);
                }
            }
        }
        tracing::debug!("Poller {} stopped", self.name);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Runs `refresh` right away, then every `every`. Refreshes never overlap:
/// a slow one delays the next tick and missed ticks are skipped.
pub fn spawn_poller<F, Fut>(name: impl Into<String>, every: Duration, refresh: F) -> PollerHandle
where
    F: Fn(PollKind) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let name = name.into();
    let every = if every < MIN_POLL_INTERVAL {
        tracing::warn!("Poller {name} interval {every:?} raised to {MIN_POLL_INTERVAL:?}");
        MIN_POLL_INTERVAL
    } else {
        every
    };
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let task_name = name.clone();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut kind = PollKind::Initial;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown_rx => break,
                result = refresh(kind) => {
                    if let Err(e) = result {
                        tracing::warn!("Poller {task_name} refresh failed: {e:#}");
                    }
                }
            }

            kind = PollKind::Background;
        }
    });

    tracing::debug!("Poller {name} started with interval {every:?}");

    PollerHandle {
        name,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}
