use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub text: String,
    pub raised_at: Instant,
}

/// Transient user-facing alerts that dismiss themselves after `ttl`.
#[derive(Debug)]
pub struct AlertCenter {
    ttl: Duration,
    alerts: Mutex<Vec<Alert>>,
}

impl AlertCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn raise(&self, kind: AlertKind, text: impl Into<String>) {
        let alert = Alert {
            kind,
            text: text.into(),
            raised_at: Instant::now(),
        };
        match kind {
            AlertKind::Error => tracing::warn!("alert: {}", alert.text),
            AlertKind::Success => tracing::info!("alert: {}", alert.text),
        }
        let mut alerts = self.lock();
        alerts.retain(|alert| alert.raised_at.elapsed() < self.ttl);
        alerts.push(alert);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.raise(AlertKind::Error, text);
    }

    /// Alerts still on screen; expired ones are dropped.
    pub fn active(&self) -> Vec<Alert> {
        let now = Instant::now();
        let mut alerts = self.lock();
        alerts.retain(|alert| now.duration_since(alert.raised_at) < self.ttl);
        alerts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Alert>> {
        self.alerts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
