//! Shared application state.
//!
//! Everything that lives for the whole process (the limiter cache, the
//! cooldown, the browser slot) is owned here and handed to the router. There
//! are no globals: two `AppState`s never share anything unless given the
//! same components.

use std::sync::Arc;

use crate::auth::TokenAuthenticator;
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::coordinator::BrowserCoordinator;
use crate::cors::CorsPolicy;
use crate::error::Result;
use crate::factory::BrowserFactory;
use crate::rate_limit::{CacheJanitor, RateLimiter, WindowCache};
use crate::store::CounterStore;

/// Components shared by every request.
///
/// Cheap to clone.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::new(
///     config,
///     Arc::new(MemoryCounterStore::new()),
///     Arc::new(ChromeBrowserFactory::with_defaults()),
///     Arc::new(SystemClock),
/// )?;
/// let app = html2pdf_gateway::integrations::axum::router(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Validated gateway configuration.
    pub config: Arc<GatewayConfig>,

    /// Per-client limiter.
    pub limiter: Arc<RateLimiter>,

    /// Sweeps the limiter cache.
    pub janitor: Arc<CacheJanitor>,

    /// Single-slot browser coordinator.
    pub coordinator: BrowserCoordinator,

    /// Origin allow-list.
    pub cors: Arc<CorsPolicy>,

    /// Bearer-token check.
    pub auth: Arc<TokenAuthenticator>,

    /// Shared time source.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire all components from `config`.
    ///
    /// Must be called inside a Tokio runtime (the coordinator schedules its
    /// idle checks on it).
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Configuration`](crate::BrowserError::Configuration)
    /// if the coordinator cannot be built.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn CounterStore>,
        factory: Arc<dyn BrowserFactory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let cache = Arc::new(WindowCache::new());

        let limiter = RateLimiter::new(
            config.rate_limit.clone(),
            Arc::clone(&cache),
            store,
            Arc::clone(&clock),
        );
        let janitor = CacheJanitor::new(config.janitor.clone(), cache, Arc::clone(&clock));

        let coordinator = BrowserCoordinator::builder()
            .config(config.coordinator.clone())
            .shared_factory(factory)
            .clock(Arc::clone(&clock))
            .build()?;

        let cors = CorsPolicy::new(config.allowed_origins.clone());
        let auth = TokenAuthenticator::new(config.api_tokens.clone());

        log::info!(
            "✅ Gateway state ready ({} token(s), {} allowed origin(s))",
            auth.token_count(),
            cors.allowed_origins().len()
        );

        Ok(Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            janitor: Arc::new(janitor),
            coordinator,
            cors: Arc::new(cors),
            auth: Arc::new(auth),
            clock,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bind_addr", &self.config.bind_addr)
            .field("cached_clients", &self.limiter.cache().len())
            .field("browser", &self.coordinator.stats())
            .finish()
    }
}
