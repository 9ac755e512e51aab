//! HTML to PDF gateway server.
//!
//! Configuration comes from the environment (and `app.env`); see
//! [`html2pdf_gateway::config::env`]. Run with:
//!
//! ```bash
//! GATEWAY_API_TOKENS=change-me cargo run
//! curl -X POST http://localhost:8080/ \
//!     -H 'Authorization: Bearer change-me' \
//!     -H 'Content-Type: application/json' \
//!     -d '{"html":"<h1>Hello</h1>"}' -o hello.pdf
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use html2pdf_gateway::clock::{Clock, SystemClock};
use html2pdf_gateway::integrations::axum::router;
use html2pdf_gateway::store::{CounterStore, MemoryCounterStore};
use html2pdf_gateway::{AppState, BrowserCoordinator, ChromeBrowserFactory, GatewayConfig};
use tokio::signal;

/// Connect to Redis when configured.
#[cfg(feature = "redis-store")]
async fn external_store(config: &GatewayConfig) -> Option<Arc<dyn CounterStore>> {
    let url = config.redis_url.as_deref()?;
    match html2pdf_gateway::store::RedisCounterStore::connect(url).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            log::warn!("⚠️ {}; falling back to in-process counters", e);
            None
        }
    }
}

#[cfg(not(feature = "redis-store"))]
async fn external_store(config: &GatewayConfig) -> Option<Arc<dyn CounterStore>> {
    if config.redis_url.is_some() {
        log::warn!("⚠️ REDIS_URL is set but the redis-store feature is disabled");
    }
    None
}

/// Pick the durable counter store.
async fn counter_store(config: &GatewayConfig, clock: Arc<dyn Clock>) -> Arc<dyn CounterStore> {
    match external_store(config).await {
        Some(store) => store,
        None => {
            log::info!("Using in-process counter store");
            Arc::new(MemoryCounterStore::with_clock(clock))
        }
    }
}

/// Wait for Ctrl+C or SIGTERM, then close the browser session.
async fn shutdown_signal(coordinator: BrowserCoordinator) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, cleaning up...");
    coordinator.shutdown().await;
    log::info!("Cleanup complete");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting html2pdf-gateway...");

    let config = html2pdf_gateway::config::env::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = counter_store(&config, Arc::clone(&clock)).await;
    let factory = Arc::new(ChromeBrowserFactory::from_optional_path(
        config.chrome_path.clone(),
    ));
    let bind_addr = config.bind_addr.clone();

    let state = AppState::new(config, store, factory, clock)?;
    let coordinator = state.coordinator.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("🚀 Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(coordinator))
    .await?;

    log::info!("Server stopped");
    Ok(())
}
