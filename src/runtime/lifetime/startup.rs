use crate::config::get_config;
use crate::services::{AgentService, ReportingService, SettlementService, TrackingService};
use crate::storage::{SeaOrmStorage, StorageFactory};
use crate::system::event::{EventBus, LogNotificationHandler};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the HTTP server needs, wired once before the first worker spawns.
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub events: Arc<EventBus>,
    pub agent_service: Arc<AgentService>,
    pub tracking_service: Arc<TrackingService>,
    pub reporting_service: Arc<ReportingService>,
    pub settlement_service: Arc<SettlementService>,
}

/// Pre-startup hook for CLI mode.
pub async fn cli_pre_startup() {
    // Reserved for future CLI-specific initialization
}

/// Build the storage backend, event bus and services for server mode.
///
/// Logging must already be initialized; every step here reports through it.
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.get_backend_name());

    let config = get_config();
    let events = Arc::new(EventBus::new(config.tracking.event_history_size));
    events.register_handler(Arc::new(LogNotificationHandler));

    let agent_service = Arc::new(AgentService::new(storage.clone(), events.clone()));
    let tracking_service = Arc::new(TrackingService::new(storage.clone(), events.clone()));
    let reporting_service = Arc::new(ReportingService::new(storage.clone()));
    let settlement_service = Arc::new(SettlementService::new(storage.clone(), events.clone()));

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        events,
        agent_service,
        tracking_service,
        reporting_service,
        settlement_service,
    })
}
