//! Configuration for the gateway, the rate limiter and the browser coordinator.
//!
//! This module provides [`GatewayConfig`] and [`GatewayConfigBuilder`] plus the
//! per-component settings they aggregate: [`RateLimitConfig`],
//! [`JanitorConfig`] and [`CoordinatorConfig`].
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use html2pdf_gateway::GatewayConfigBuilder;
//!
//! let config = GatewayConfigBuilder::new()
//!     .api_token("secret-token")
//!     .allowed_origins(vec!["https://app.example.com".to_string()])
//!     .max_requests(20)
//!     .rate_window(Duration::from_secs(60))
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.rate_limit.max_requests, 20);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, configuration can be loaded
//! from environment variables and an optional `app.env` file. See
//! [`mod@env`] for the variable list.

use std::time::Duration;

/// Settings for the per-client fixed-window limiter.
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `max_requests` | 10 | Requests admitted per window |
/// | `window` | 60s | Window length |
/// | `sync_interval` | 30s | Max staleness of the durable copy |
/// | `sync_threshold` | 0.8 | Fraction of the limit at which every admit syncs |
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per identifier per window.
    pub max_requests: u32,

    /// Length of one fixed window.
    pub window: Duration,

    /// Minimum spacing between steady-state durable writes for one identifier.
    pub sync_interval: Duration,

    /// Fraction of `max_requests` at or above which every admitted request
    /// is written through synchronously.
    pub sync_threshold: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            sync_interval: Duration::from_secs(30),
            sync_threshold: 0.8,
        }
    }
}

/// Settings for the request-driven cache sweep.
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// Minimum time between two sweeps.
    pub sweep_interval: Duration,

    /// How long past its window end an entry is kept.
    pub grace_period: Duration,

    /// Upper bound on cached identifiers after a sweep.
    pub max_entries: usize,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
            grace_period: Duration::from_secs(60),
            max_entries: 1000,
        }
    }
}

/// Settings for the single-slot browser coordinator.
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `idle_timeout` | 60s | Close the session after this long unused |
/// | `render_timeout` | 30s | Bound on one render call |
/// | `cooldown` | 60s | Fail-fast period after an upstream 429 |
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Idle period after which the retained session is closed.
    pub idle_timeout: Duration,

    /// Upper bound on a single HTML render, including content load.
    pub render_timeout: Duration,

    /// Process-wide refusal period after an upstream capacity rejection.
    pub cooldown: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60),
            render_timeout: Duration::from_secs(30),
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Complete gateway configuration.
///
/// Use [`GatewayConfigBuilder`] for validation and convenience.
///
/// # Example
///
/// ```rust
/// use html2pdf_gateway::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.rate_limit.max_requests, 10);
/// assert_eq!(config.janitor.max_entries, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,

    /// Bearer tokens accepted by the endpoint.
    pub api_tokens: Vec<String>,

    /// CORS allow-list. The first entry is the fallback origin.
    pub allowed_origins: Vec<String>,

    /// Custom Chrome/Chromium binary, auto-detected when `None`.
    pub chrome_path: Option<String>,

    /// Durable counter store location, in-process store when `None`.
    pub redis_url: Option<String>,

    /// Per-client limiter settings.
    pub rate_limit: RateLimitConfig,

    /// Local cache maintenance settings.
    pub janitor: JanitorConfig,

    /// Browser session settings.
    pub coordinator: CoordinatorConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            api_tokens: Vec::new(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            chrome_path: None,
            redis_url: None,
            rate_limit: RateLimitConfig::default(),
            janitor: JanitorConfig::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

/// Builder for [`GatewayConfig`] with validation.
///
/// # Validation
///
/// The [`build()`](Self::build) method checks:
/// - at least one API token is configured
/// - the origin allow-list is non-empty and every entry is an http(s) origin
/// - `max_requests`, `window`, `max_entries`, `render_timeout` and `cooldown` are non-zero
/// - `sync_threshold` lies in `(0, 1]`
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
        }
    }

    /// Set the bind address.
    pub fn bind_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// Add one accepted bearer token.
    pub fn api_token<S: Into<String>>(mut self, token: S) -> Self {
        self.config.api_tokens.push(token.into());
        self
    }

    /// Replace the accepted bearer tokens.
    pub fn api_tokens(mut self, tokens: Vec<String>) -> Self {
        self.config.api_tokens = tokens;
        self
    }

    /// Replace the CORS allow-list.
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.config.allowed_origins = origins;
        self
    }

    /// Set a custom Chrome binary path.
    pub fn chrome_path(mut self, path: Option<String>) -> Self {
        self.config.chrome_path = path;
        self
    }

    /// Set the durable store URL.
    pub fn redis_url(mut self, url: Option<String>) -> Self {
        self.config.redis_url = url;
        self
    }

    /// Set the per-window request maximum.
    ///
    /// ```rust
    /// use html2pdf_gateway::GatewayConfigBuilder;
    ///
    /// let config = GatewayConfigBuilder::new()
    ///     .api_token("t")
    ///     .max_requests(3)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.rate_limit.max_requests, 3);
    /// ```
    pub fn max_requests(mut self, max: u32) -> Self {
        self.config.rate_limit.max_requests = max;
        self
    }

    /// Set the fixed window length.
    pub fn rate_window(mut self, window: Duration) -> Self {
        self.config.rate_limit.window = window;
        self
    }

    /// Set the steady-state sync interval.
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.rate_limit.sync_interval = interval;
        self
    }

    /// Set the near-limit sync threshold.
    pub fn sync_threshold(mut self, threshold: f64) -> Self {
        self.config.rate_limit.sync_threshold = threshold;
        self
    }

    /// Set the janitor sweep interval.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.janitor.sweep_interval = interval;
        self
    }

    /// Set the post-window grace period.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.janitor.grace_period = grace;
        self
    }

    /// Set the cache size cap.
    pub fn max_cache_entries(mut self, max: usize) -> Self {
        self.config.janitor.max_entries = max;
        self
    }

    /// Set the session idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.coordinator.idle_timeout = timeout;
        self
    }

    /// Set the render timeout.
    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.config.coordinator.render_timeout = timeout;
        self
    }

    /// Set the upstream cooldown length.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.coordinator.cooldown = cooldown;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    ///
    /// ```rust
    /// use html2pdf_gateway::GatewayConfigBuilder;
    ///
    /// // No token configured
    /// assert!(GatewayConfigBuilder::new().build().is_err());
    ///
    /// // Zero limit
    /// let result = GatewayConfigBuilder::new().api_token("t").max_requests(0).build();
    /// assert!(result.is_err());
    /// ```
    pub fn build(self) -> std::result::Result<GatewayConfig, String> {
        let config = self.config;

        if config.api_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err("at least one API token must be configured".to_string());
        }

        if config.allowed_origins.is_empty() {
            return Err("allowed_origins must not be empty".to_string());
        }

        for origin in &config.allowed_origins {
            let parsed = url::Url::parse(origin)
                .map_err(|e| format!("invalid allowed origin '{}': {}", origin, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("allowed origin '{}' must use http or https", origin));
            }
        }

        if config.rate_limit.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }

        if config.rate_limit.window.is_zero() {
            return Err("rate window must be greater than 0".to_string());
        }

        let threshold = config.rate_limit.sync_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err("sync_threshold must be in (0, 1]".to_string());
        }

        if config.janitor.max_entries == 0 {
            return Err("max_cache_entries must be greater than 0".to_string());
        }

        if config.coordinator.render_timeout.is_zero() {
            return Err("render_timeout must be greater than 0".to_string());
        }

        if config.coordinator.cooldown.is_zero() {
            return Err("cooldown must be greater than 0".to_string());
        }

        Ok(config)
    }
}

impl Default for GatewayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `GATEWAY_BIND_ADDR` | String | `0.0.0.0:8080` | Listen address |
/// | `GATEWAY_API_TOKENS` | CSV | required | Accepted bearer tokens |
/// | `GATEWAY_ALLOWED_ORIGINS` | CSV | `http://localhost:3000` | CORS allow-list |
/// | `RATE_LIMIT_MAX_REQUESTS` | u32 | 10 | Requests per window |
/// | `RATE_LIMIT_WINDOW_SECONDS` | u64 | 60 | Window length |
/// | `RATE_LIMIT_SYNC_INTERVAL_SECONDS` | u64 | 30 | Steady-state sync spacing |
/// | `CACHE_SWEEP_INTERVAL_SECONDS` | u64 | 300 | Janitor interval |
/// | `CACHE_GRACE_SECONDS` | u64 | 60 | Post-window retention |
/// | `CACHE_MAX_ENTRIES` | usize | 1000 | Cache cap |
/// | `BROWSER_IDLE_TIMEOUT_SECONDS` | u64 | 60 | Session idle timeout |
/// | `BROWSER_RENDER_TIMEOUT_SECONDS` | u64 | 30 | Render bound |
/// | `BROWSER_COOLDOWN_SECONDS` | u64 | 60 | Upstream cooldown |
/// | `CHROME_PATH` | String | auto | Custom Chrome binary path |
/// | `REDIS_URL` | String | unset | Durable counter store |
///
/// # Example `app.env` File
///
/// ```text
/// GATEWAY_API_TOKENS=change-me
/// GATEWAY_ALLOWED_ORIGINS=https://app.example.com,https://admin.example.com
/// RATE_LIMIT_MAX_REQUESTS=10
/// # REDIS_URL=redis://127.0.0.1:6379
/// ```
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::BrowserError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from `app.env` file.
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(default)
    }

    fn csv(name: &str) -> Option<Vec<String>> {
        std::env::var(name).ok().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Also loads `app.env` if present (via `dotenvy`).
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Configuration`] if configuration values are invalid.
    pub fn from_env() -> Result<GatewayConfig, BrowserError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let defaults = GatewayConfig::default();

        let bind_addr = std::env::var("GATEWAY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let api_tokens = csv("GATEWAY_API_TOKENS").unwrap_or_default();
        let allowed_origins = csv("GATEWAY_ALLOWED_ORIGINS").unwrap_or(defaults.allowed_origins);

        let max_requests = var_or("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests);
        let window_secs = var_or("RATE_LIMIT_WINDOW_SECONDS", 60u64);
        let sync_secs = var_or("RATE_LIMIT_SYNC_INTERVAL_SECONDS", 30u64);
        let sweep_secs = var_or("CACHE_SWEEP_INTERVAL_SECONDS", 300u64);
        let grace_secs = var_or("CACHE_GRACE_SECONDS", 60u64);
        let max_entries = var_or("CACHE_MAX_ENTRIES", defaults.janitor.max_entries);
        let idle_secs = var_or("BROWSER_IDLE_TIMEOUT_SECONDS", 60u64);
        let render_secs = var_or("BROWSER_RENDER_TIMEOUT_SECONDS", 30u64);
        let cooldown_secs = var_or("BROWSER_COOLDOWN_SECONDS", 60u64);

        log::info!("Loading gateway configuration from environment:");
        log::info!("   - Bind address: {}", bind_addr);
        log::info!("   - API tokens: {}", api_tokens.len());
        log::info!("   - Allowed origins: {:?}", allowed_origins);
        log::info!("   - Rate limit: {} per {}s", max_requests, window_secs);
        log::info!("   - Sync interval: {}s", sync_secs);
        log::info!(
            "   - Cache sweep: every {}s, grace {}s, max {} entries",
            sweep_secs,
            grace_secs,
            max_entries
        );
        log::info!(
            "   - Browser: idle {}s, render timeout {}s, cooldown {}s",
            idle_secs,
            render_secs,
            cooldown_secs
        );

        GatewayConfigBuilder::new()
            .bind_addr(bind_addr)
            .api_tokens(api_tokens)
            .allowed_origins(allowed_origins)
            .chrome_path(chrome_path_from_env())
            .redis_url(std::env::var("REDIS_URL").ok())
            .max_requests(max_requests)
            .rate_window(Duration::from_secs(window_secs))
            .sync_interval(Duration::from_secs(sync_secs))
            .sweep_interval(Duration::from_secs(sweep_secs))
            .grace_period(Duration::from_secs(grace_secs))
            .max_cache_entries(max_entries)
            .idle_timeout(Duration::from_secs(idle_secs))
            .render_timeout(Duration::from_secs(render_secs))
            .cooldown(Duration::from_secs(cooldown_secs))
            .build()
            .map_err(BrowserError::Configuration)
    }

    /// Get Chrome path from environment.
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
