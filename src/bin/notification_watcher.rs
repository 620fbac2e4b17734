use std::sync::Arc;

use telecare_sync::config::{APP_CONFIG, SyncSettings};
use telecare_sync::core::api::ApiClient;
use telecare_sync::core::auth::AuthStore;
use telecare_sync::core::sync::{AlertCenter, NotificationSync, spawn_poller};
use telecare_sync::utils::tracing::init_standard_tracing;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_standard_tracing(env!("CARGO_CRATE_NAME"));

    let settings = SyncSettings::from(&*APP_CONFIG);
    let auth = Arc::new(AuthStore::from_config(&APP_CONFIG).await?);
    let client = ApiClient::new(&APP_CONFIG.api_base_url, settings.request_timeout, auth)?;
    tracing::info!("Watching notifications at {}", client.base_url());

    let alerts = Arc::new(AlertCenter::new(settings.alert_ttl));
    let sync = Arc::new(NotificationSync::new(Arc::new(client), alerts));

    let list_sync = Arc::clone(&sync);
    let list_poller = spawn_poller("notifications", settings.notification_poll, move |kind| {
        let sync = Arc::clone(&list_sync);
        async move { sync.refresh(kind).await.map_err(anyhow::Error::from) }
    });

    let badge_sync = Arc::clone(&sync);
    let badge_poller = spawn_poller("notification-summary", settings.summary_poll, move |_| {
        let sync = Arc::clone(&badge_sync);
        async move { sync.refresh_summary().await.map_err(anyhow::Error::from) }
    });

    let mut updates = sync.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last = updates.borrow().summary;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.summary != last {
                tracing::info!(
                    "Notifications: {} total, {} unread",
                    snapshot.summary.total,
                    snapshot.summary.unread
                );
                if let Some(newest) = snapshot.items.first() {
                    tracing::info!("Latest [{}] {}", newest.r#type.label(), newest.title);
                }
                last = snapshot.summary;
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    for poller in [list_poller, badge_poller] {
        tracing::debug!("Stopping {}", poller.name());
        poller.stop().await;
    }
    reporter.abort();

    Ok(())
}
