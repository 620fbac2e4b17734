use std::sync::Arc;

use telecare_sync::config::{APP_CONFIG, SyncSettings};
use telecare_sync::core::api::ApiClient;
use telecare_sync::core::auth::AuthStore;
use telecare_sync::core::sync::{AlertCenter, ConsultationSync, spawn_poller};
use telecare_sync::utils::tracing::init_standard_tracing;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_standard_tracing(env!("CARGO_CRATE_NAME"));

    let settings = SyncSettings::from(&*APP_CONFIG);
    let auth = Arc::new(AuthStore::from_config(&APP_CONFIG).await?);
    let client = ApiClient::new(&APP_CONFIG.api_base_url, settings.request_timeout, auth)?;
    tracing::info!(
        "Watching {} consultations at {}",
        settings.role,
        client.base_url()
    );

    let alerts = Arc::new(AlertCenter::new(settings.alert_ttl));
    let sync = Arc::new(ConsultationSync::new(Arc::new(client), &settings, alerts));

    let poll_sync = Arc::clone(&sync);
    let poller = spawn_poller("consultations", settings.consultation_poll, move |kind| {
        let sync = Arc::clone(&poll_sync);
        async move { sync.refresh(kind).await.map_err(anyhow::Error::from) }
    });

    let mut updates = sync.subscribe();
    let reporter = tokio::spawn(async move {
        let mut selected = None;
        let mut seen = None;
        let mut pending_ids = Vec::new();
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();

            for request in snapshot.pending.iter().filter(|r| !pending_ids.contains(&r.id)) {
                tracing::info!(
                    "Pending request {} from {}: {}",
                    request.id,
                    request.counterpart_name(),
                    request.primary_symptoms.as_deref().unwrap_or("no symptoms given")
                );
            }
            pending_ids = snapshot.pending.iter().map(|r| r.id).collect();

            if snapshot.selected_id() != selected {
                selected = snapshot.selected_id();
                seen = None;
                match &snapshot.selected {
                    Some(consultation) => tracing::info!(
                        "Consultation {} with {} ({})",
                        consultation.id,
                        consultation.counterpart_name(),
                        consultation.status
                    ),
                    None => tracing::info!("No consultation selected"),
                }
            }

            for message in snapshot.thread.messages_after(seen) {
                tracing::info!("[{}] {}", message.sender_type, message.content);
            }
            if let Some(last) = snapshot.thread.last_message_id() {
                seen = Some(last);
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    tracing::debug!("Stopping {}", poller.name());
    poller.stop().await;
    reporter.abort();

    Ok(())
}
