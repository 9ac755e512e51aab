//! # html2pdf-gateway
//!
//! Authenticated, rate-limited HTML to PDF HTTP endpoint backed by a single
//! leased headless Chrome session.
//!
//! ## Features
//!
//! - **Bearer Auth and CORS**: fixed token set and origin allow-list, with
//!   CORS headers on every response including failures
//! - **Hybrid Rate Limiting**: per-client fixed windows decided in memory,
//!   replicated lazily to a durable store (in-process or Redis)
//! - **Request-Driven Janitor**: bounded cache memory without a background timer
//! - **Single-Slot Browser Coordinator**: one session, FIFO waiters, liveness
//!   probe before reuse, idle eviction after 60s
//! - **Upstream Cooldown**: capacity rejections from the browser provider
//!   pause all launches for 60s; requests fail fast in the meantime
//! - **RAII Leases**: the session returns to the slot even when rendering
//!   fails or the request is cancelled
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        integrations::axum (pipeline)        │
//! │  CORS → method → auth → rate limit → parse  │
//! └───────┬──────────────────────┬──────────────┘
//!         │                      │
//!         ▼                      ▼
//! ┌────────────────┐    ┌─────────────────────────────┐
//! │  RateLimiter   │    │     BrowserCoordinator      │
//! │ ┌────────────┐ │    │ ┌─────────────────────────┐ │
//! │ │WindowCache │ │    │ │ Slot: [TrackedSession]  │ │
//! │ └────────────┘ │    │ │ FIFO permit (1)         │ │
//! │ ┌────────────┐ │    │ │ Cooldown (blockedUntil) │ │
//! │ │CounterStore│ │    │ │ Idle reaper             │ │
//! │ └────────────┘ │    │ └─────────────────────────┘ │
//! │  CacheJanitor  │    └──────────────┬──────────────┘
//! └────────────────┘                   │
//!                                      ▼
//!                       ┌─────────────────────────────┐
//!                       │   Headless Chrome session   │
//!                       │ (managed by headless_chrome)│
//!                       └─────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//! use std::net::SocketAddr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfigBuilder::new()
//!         .api_token("change-me")
//!         .allowed_origins(vec!["https://app.example.com".to_string()])
//!         .build()?;
//!
//!     let state = AppState::new(
//!         config,
//!         Arc::new(MemoryCounterStore::new()),
//!         Arc::new(ChromeBrowserFactory::with_defaults()),
//!         Arc::new(SystemClock),
//!     )?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(
//!         listener,
//!         router(state).into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! With the `env-config` feature (default), [`config::env::from_env`] reads
//! an optional `app.env` file and these variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_BIND_ADDR` | `0.0.0.0:8080` | Listen address |
//! | `GATEWAY_API_TOKENS` | (required) | Comma-separated bearer tokens |
//! | `GATEWAY_ALLOWED_ORIGINS` | `http://localhost:3000` | Comma-separated origins, first is fallback |
//! | `RATE_LIMIT_MAX_REQUESTS` | 10 | Requests per window |
//! | `RATE_LIMIT_WINDOW_SECONDS` | 60 | Window length |
//! | `RATE_LIMIT_SYNC_INTERVAL_SECONDS` | 30 | Steady-state durable sync spacing |
//! | `CACHE_SWEEP_INTERVAL_SECONDS` | 300 | Janitor interval |
//! | `CACHE_GRACE_SECONDS` | 60 | Kept past window end |
//! | `CACHE_MAX_ENTRIES` | 1000 | Cache size cap |
//! | `BROWSER_IDLE_TIMEOUT_SECONDS` | 60 | Idle session eviction |
//! | `BROWSER_RENDER_TIMEOUT_SECONDS` | 30 | Render bound |
//! | `BROWSER_COOLDOWN_SECONDS` | 60 | Upstream capacity cooldown |
//! | `CHROME_PATH` | auto | Custom Chrome binary |
//! | `REDIS_URL` | unset | Durable store (feature `redis-store`) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Environment-based configuration (default) |
//! | `redis-store` | Redis counter store |
//! | `test-utils` | Mock browser factory, mock counter store, manual clock |
//!
//! ## Error Handling
//!
//! Browser-level operations return [`Result<T, BrowserError>`](Result);
//! the service layer maps them onto
//! [`PdfServiceError`](service::PdfServiceError), which knows its HTTP status:
//!
//! ```rust,ignore
//! match coordinator.acquire().await {
//!     Ok(mut lease) => { /* render */ }
//!     Err(BrowserError::UpstreamCapacity { retry_after }) => {
//!         // provider is cooling down
//!     }
//!     Err(e) => eprintln!("Coordinator error: {}", e),
//! }
//! ```
//!
//! ## Testing
//!
//! Enable `test-utils` to drive everything without Chrome or Redis:
//!
//! ```rust,ignore
//! use html2pdf_gateway::clock::ManualClock;
//! use html2pdf_gateway::factory::mock::MockBrowserFactory;
//!
//! let coordinator = BrowserCoordinator::builder()
//!     .factory(Box::new(MockBrowserFactory::always_fails("429 Too Many Requests")))
//!     .clock(Arc::new(ManualClock::new()))
//!     .build()?;
//! ```

#![doc(html_root_url = "https://docs.rs/html2pdf-gateway/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod auth;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod coordinator;
pub mod cors;
pub mod error;
pub mod factory;
pub mod handle;
pub mod integrations;
pub mod prelude;
pub mod rate_limit;
pub mod service;
pub mod state;
pub mod stats;
pub mod store;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod tracked;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

pub use config::{
    CoordinatorConfig, GatewayConfig, GatewayConfigBuilder, JanitorConfig, RateLimitConfig,
};
pub use cooldown::Cooldown;
pub use coordinator::{BrowserCoordinator, BrowserCoordinatorBuilder};
pub use error::{BrowserError, Result};
pub use factory::{BrowserFactory, ChromeBrowserFactory, create_chrome_options};
pub use handle::SessionLease;
pub use state::AppState;
pub use stats::CoordinatorStats;
pub use traits::{BrowserSession, Healthcheck};

#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};
