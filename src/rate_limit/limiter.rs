//! Hybrid fixed-window rate limiter.
//!
//! The local [`WindowCache`] decides every request. The durable
//! [`CounterStore`] is consulted only on a cache miss and is written
//! lazily:
//!
//! | Situation | Durable write |
//! |-----------|---------------|
//! | first request of a window (count 1) | awaited |
//! | count at or above the sync threshold | awaited |
//! | sync interval elapsed since last write | spawned, not awaited |
//! | otherwise | none |
//!
//! Store failures are logged and never change the decision.
//!
//! Writes for one identifier reach the store in count order: a spawned
//! write is kept in the identifier's slot, and the next write (spawned or
//! awaited) waits for it first.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use tokio::task::JoinHandle;

use super::cache::{RateWindow, WindowCache};
use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::store::{CounterStore, StoredWindow, counter_key, ttl_for};

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is admitted.
    pub allowed: bool,

    /// Configured maximum per window.
    pub limit: u32,

    /// Requests left in the window; 0 on rejection.
    pub remaining: u32,

    /// End of the window the decision was made in.
    pub window_end: DateTime<Utc>,
}

impl RateLimitResult {
    /// Whole seconds until `window_end`, rounded up, never below 1.
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use html2pdf_gateway::rate_limit::RateLimitResult;
    ///
    /// let now = Utc::now();
    /// let result = RateLimitResult {
    ///     allowed: false,
    ///     limit: 3,
    ///     remaining: 0,
    ///     window_end: now + Duration::milliseconds(2_100),
    /// };
    /// assert_eq!(result.retry_after_secs(now), 3);
    /// assert_eq!(result.retry_after_secs(now + Duration::seconds(10)), 1);
    /// ```
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.window_end - now).num_milliseconds();
        if millis <= 0 {
            return 1;
        }
        let secs = (millis as u64).div_ceil(1000);
        secs.max(1)
    }

    /// `window_end` as an RFC 3339 timestamp for `X-RateLimit-Reset`.
    pub fn reset_rfc3339(&self) -> String {
        self.window_end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

enum SyncMode {
    Await,
    Spawn,
    Skip,
}

/// Per-identifier fixed-window limiter over a local cache and a durable store.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = RateLimiter::new(
///     RateLimitConfig::default(),
///     Arc::new(WindowCache::new()),
///     Arc::new(MemoryCounterStore::new()),
///     Arc::new(SystemClock),
/// );
///
/// let result = limiter.check("203.0.113.7").await;
/// if !result.allowed {
///     println!("retry in {}s", result.retry_after_secs(Utc::now()));
/// }
/// ```
pub struct RateLimiter {
    config: RateLimitConfig,
    cache: Arc<WindowCache>,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter over shared cache, store and clock.
    pub fn new(
        config: RateLimitConfig,
        cache: Arc<WindowCache>,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        log::info!(
            "🚦 Rate limiter: {} requests per {}s, {} store",
            config.max_requests,
            config.window.as_secs(),
            store.name()
        );
        Self {
            config,
            cache,
            store,
            clock,
        }
    }

    /// The limiter's configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// The shared window cache.
    pub fn cache(&self) -> &Arc<WindowCache> {
        &self.cache
    }

    /// Admit or reject one request from `identifier`.
    ///
    /// Never fails: an unreachable store degrades to memory-only limiting.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        let max = self.config.max_requests;
        let slot = self.cache.slot(identifier);
        let mut guard = slot.lock().await;

        let now = self.clock.now();
        let mut window = match guard.window {
            Some(window) => window,
            None => self.load_window(identifier, now).await,
        };

        if now >= window.window_end {
            log::trace!("Window rollover for {}", identifier);
            window.count = 0;
            window.window_end = now + self.window_len();
        }

        if window.count.saturating_add(1) > max {
            guard.window = Some(window);
            log::debug!(
                "Rate limit exceeded for {} ({} of {})",
                identifier,
                window.count,
                max
            );
            return RateLimitResult {
                allowed: false,
                limit: max,
                remaining: 0,
                window_end: window.window_end,
            };
        }

        window.count += 1;
        let mode = self.sync_mode(&window, now);
        if !matches!(mode, SyncMode::Skip) {
            window.last_synced_at = Some(now);
        }
        guard.window = Some(window);

        let stored = StoredWindow {
            count: window.count,
            window_end: window.window_end,
        };
        match mode {
            SyncMode::Await => {
                if let Some(pending) = guard.pending_sync.as_mut() {
                    if let Err(e) = pending.await {
                        log::warn!("⚠️ Deferred counter sync for {} aborted: {}", identifier, e);
                    }
                }
                guard.pending_sync = None;
                self.persist(identifier, stored, now).await;
            }
            SyncMode::Spawn => {
                let previous = guard.pending_sync.take();
                guard.pending_sync = Some(self.persist_deferred(identifier, stored, now, previous));
            }
            SyncMode::Skip => {}
        }
        drop(guard);

        RateLimitResult {
            allowed: true,
            limit: max,
            remaining: max - window.count,
            window_end: window.window_end,
        }
    }

    fn window_len(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.window).unwrap_or(chrono::Duration::seconds(60))
    }

    /// Cache miss: adopt an unexpired durable window or start fresh.
    async fn load_window(&self, identifier: &str, now: DateTime<Utc>) -> RateWindow {
        let fresh = RateWindow::fresh(now + self.window_len());

        match self.store.get(&counter_key(identifier)).await {
            Ok(Some(stored)) if now < stored.window_end => {
                log::debug!(
                    "Adopted stored window for {} (count {})",
                    identifier,
                    stored.count
                );
                RateWindow {
                    count: stored.count,
                    window_end: stored.window_end,
                    last_synced_at: Some(now),
                }
            }
            Ok(_) => fresh,
            Err(e) => {
                log::warn!(
                    "⚠️ {} store read failed for {}, limiting in memory only: {}",
                    self.store.name(),
                    identifier,
                    e
                );
                fresh
            }
        }
    }

    fn sync_mode(&self, window: &RateWindow, now: DateTime<Utc>) -> SyncMode {
        let near_limit = f64::from(window.count) + 1e-9
            >= self.config.sync_threshold * f64::from(self.config.max_requests);

        if window.count == 1 || near_limit {
            return SyncMode::Await;
        }

        let interval = chrono::Duration::from_std(self.config.sync_interval)
            .unwrap_or(chrono::Duration::seconds(30));
        match window.last_synced_at {
            Some(last) if now - last < interval => SyncMode::Skip,
            _ => SyncMode::Spawn,
        }
    }

    async fn persist(&self, identifier: &str, value: StoredWindow, now: DateTime<Utc>) {
        let key = counter_key(identifier);
        if let Err(e) = self
            .store
            .put(&key, value, ttl_for(value.window_end, now))
            .await
        {
            log::warn!("⚠️ Failed to sync counter for {}: {}", identifier, e);
        }
    }

    /// Steady-state sync that may outlive the response.
    ///
    /// Runs after `previous`, the identifier's earlier spawned write.
    fn persist_deferred(
        &self,
        identifier: &str,
        value: StoredWindow,
        now: DateTime<Utc>,
        previous: Option<JoinHandle<()>>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let key = counter_key(identifier);
        let ttl = ttl_for(value.window_end, now);

        tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            if let Err(e) = store.put(&key, value, ttl).await {
                log::warn!("⚠️ Deferred counter sync for {} failed: {}", key, e);
            }
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
