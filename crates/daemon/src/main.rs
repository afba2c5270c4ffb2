//! Batchline - Main Entry Point
//! HTTP/SSE server + in-memory job store + expiry sweeper

mod logging;
mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// Import workspace crates
use batchline_api_http::{ApiServer, AppState, TracingHooks};
use batchline_core::application::{shutdown_channel, ExpirySweeper, JobEngine, StatusQuery};
use batchline_core::port::id_provider::UuidProvider;
use batchline_core::port::time_provider::SystemTimeProvider;
use batchline_core::port::ItemProcessor;
use batchline_infra_memory::MemoryJobStore;
use batchline_infra_system::{CommandProcessor, FileProbeProcessor};
use settings::{ProcessorKind, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    // 2. Initialize logging (+ optional OpenTelemetry)
    let _log_guard = logging::init(&settings.logging)?;

    info!("Batchline v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let store = Arc::new(MemoryJobStore::new(settings.store_config()));
    let engine = JobEngine::new(
        store.clone(),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        settings.engine_config(),
    );
    let query = StatusQuery::new(store.clone(), settings.query_config());
    let processor = build_processor(&settings);

    info!(
        processor = ?settings.processor.kind,
        ttl_secs = settings.store.ttl_secs,
        poll_interval_secs = settings.query.poll_interval_secs,
        escalate_item_failures = settings.engine.escalate_item_failures,
        "Components wired"
    );

    // 4. Start expiry sweeper
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let sweeper = ExpirySweeper::new(store.clone(), store.config().sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx.clone()));

    // 5. Start HTTP server
    let state = AppState::new(engine, query, processor, Arc::new(TracingHooks))
        .with_keep_alive(settings.keep_alive());
    let (addr, server_handle) = ApiServer::new(settings.server_config(), state)
        .start(shutdown_rx)
        .await
        .context("HTTP server start failed")?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown (open streams get a grace period)
    shutdown_tx.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, server_handle).await.is_err() {
        warn!("Open streams did not finish within the grace period");
    }
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, sweeper_handle).await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}

fn build_processor(settings: &Settings) -> Arc<dyn ItemProcessor> {
    let processor = &settings.processor;
    match processor.kind {
        ProcessorKind::File => Arc::new(FileProbeProcessor::new(
            processor.root_dir(),
            processor.max_bytes,
        )),
        ProcessorKind::Command => Arc::new(CommandProcessor::new(
            processor.env_allowlist.clone(),
            processor.timeout(),
        )),
    }
}
