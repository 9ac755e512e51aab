//! Request-driven cleanup of the window cache.
//!
//! There is no background timer: the HTTP pipeline calls
//! [`CacheJanitor::sweep_if_due`] at the start of every request and a sweep
//! runs at most once per `sweep_interval`.
//!
//! A sweep has two passes:
//!
//! 1. Drop entries whose window ended more than `grace_period` ago.
//! 2. If the cache is still above `max_entries`, evict idle entries by
//!    ascending window end until it fits. Entries held by an in-flight
//!    request are never evicted; if only those remain the cache stays
//!    over the cap until a later sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use super::cache::WindowCache;
use crate::clock::Clock;
use crate::config::JanitorConfig;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed as expired.
    pub expired: usize,

    /// Entries evicted to honour the size cap.
    pub evicted: usize,

    /// Entries left afterwards.
    pub remaining: usize,
}

/// Bounds the memory of a [`WindowCache`].
pub struct CacheJanitor {
    config: JanitorConfig,
    cache: Arc<WindowCache>,
    clock: Arc<dyn Clock>,
    last_sweep_ms: AtomicI64,
}

impl CacheJanitor {
    /// Create a janitor. The first sweep is due one interval after creation.
    pub fn new(config: JanitorConfig, cache: Arc<WindowCache>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now().timestamp_millis();
        Self {
            config,
            cache,
            clock,
            last_sweep_ms: AtomicI64::new(now),
        }
    }

    /// Sweep if `sweep_interval` has passed since the last sweep.
    ///
    /// Concurrent callers race on a compare-and-swap; exactly one sweeps.
    pub fn sweep_if_due(&self) -> Option<SweepReport> {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let interval_ms = i64::try_from(self.config.sweep_interval.as_millis()).unwrap_or(i64::MAX);

        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now_ms.saturating_sub(last) < interval_ms {
            return None;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        Some(self.sweep(now))
    }

    /// Run both passes as of `now`.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let grace = chrono::Duration::from_std(self.config.grace_period)
            .unwrap_or(chrono::Duration::seconds(60));
        let mut report = SweepReport::default();

        for view in self.cache.snapshot() {
            if view.in_use {
                continue;
            }
            let removed = self.cache.remove_idle_if(&view.key, |window| match window {
                Some(w) => now > w.window_end + grace,
                None => true,
            });
            if removed {
                report.expired += 1;
            }
        }

        let cap = self.config.max_entries;
        if self.cache.len() > cap {
            let mut candidates: Vec<_> = self
                .cache
                .snapshot()
                .into_iter()
                .filter(|v| !v.in_use)
                .collect();
            // Oldest window first; unknown ends sort first.
            candidates.sort_by_key(|v| v.window_end);

            for view in candidates {
                if self.cache.len() <= cap {
                    break;
                }
                if self.cache.remove_idle_if(&view.key, |_| true) {
                    report.evicted += 1;
                }
            }

            if self.cache.len() > cap {
                log::debug!(
                    "Cache above cap ({} > {}) with only in-use entries left",
                    self.cache.len(),
                    cap
                );
            }
        }

        report.remaining = self.cache.len();
        if report.expired + report.evicted > 0 {
            log::info!(
                "🧹 Cache sweep: {} expired, {} evicted, {} remaining",
                report.expired,
                report.evicted,
                report.remaining
            );
        } else {
            log::debug!("Cache sweep: nothing to remove ({} entries)", report.remaining);
        }
        report
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clock::ManualClock;
    use crate::rate_limit::RateWindow;

    fn janitor(max_entries: usize) -> (CacheJanitor, Arc<WindowCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(WindowCache::new());
        let config = JanitorConfig {
            sweep_interval: Duration::from_secs(300),
            grace_period: Duration::from_secs(60),
            max_entries,
        };
        (
            CacheJanitor::new(config, cache.clone(), clock.clone()),
            cache,
            clock,
        )
    }

    fn ending_in(clock: &ManualClock, secs: i64) -> RateWindow {
        RateWindow::fresh(clock.now() + chrono::Duration::seconds(secs))
    }

    /// Verifies that sweeps are rate limited by the interval.
    #[test]
    fn test_sweep_if_due_respects_interval() {
        let (janitor, _, clock) = janitor(10);

        assert!(janitor.sweep_if_due().is_none());
        clock.advance(Duration::from_secs(299));
        assert!(janitor.sweep_if_due().is_none());
        clock.advance(Duration::from_secs(1));
        assert!(janitor.sweep_if_due().is_some());
        assert!(janitor.sweep_if_due().is_none());
    }

    /// Verifies the grace period boundary is exclusive.
    #[test]
    fn test_expired_pass_uses_grace() {
        let (janitor, cache, clock) = janitor(10);
        cache.insert("just-past-grace", ending_in(&clock, -61));
        cache.insert("at-grace", ending_in(&clock, -60));
        cache.insert("live", ending_in(&clock, 30));

        let report = janitor.sweep(clock.now());
        assert_eq!(report.expired, 1);
        assert_eq!(report.evicted, 0);
        assert!(cache.get("just-past-grace").is_none());
        assert!(cache.get("at-grace").is_some());
        assert!(cache.get("live").is_some());
    }

    /// Verifies the cap evicts the oldest windows first.
    #[test]
    fn test_cap_evicts_oldest() {
        let (janitor, cache, clock) = janitor(2);
        cache.insert("a", ending_in(&clock, 10));
        cache.insert("b", ending_in(&clock, 40));
        cache.insert("c", ending_in(&clock, 20));
        cache.insert("d", ending_in(&clock, 30));

        let report = janitor.sweep(clock.now());
        assert_eq!(report.evicted, 2);
        assert_eq!(report.remaining, 2);
        assert!(cache.get("b").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_under_cap_unexpired_untouched() {
        let (janitor, cache, clock) = janitor(5);
        for i in 0..5 {
            cache.insert(&format!("k{}", i), ending_in(&clock, 1));
        }
        let report = janitor.sweep(clock.now());
        assert_eq!(report, SweepReport { expired: 0, evicted: 0, remaining: 5 });
    }

    /// Verifies in-use entries survive the expiry pass and the cap pass.
    #[tokio::test]
    async fn test_in_use_entries_protected() {
        let (janitor, cache, clock) = janitor(1);
        cache.insert("busy", ending_in(&clock, -600));
        cache.insert("idle", ending_in(&clock, 5));

        let slot = cache.slot("busy");
        let _guard = slot.lock().await;

        let report = janitor.sweep(clock.now());
        assert_eq!(report.expired, 0);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.remaining, 1);
        assert!(cache.get("idle").is_none());
    }

    /// Verifies that the cap never splits an identifier held by a request.
    #[tokio::test]
    async fn test_cap_waits_for_in_use_entries() {
        let (janitor, cache, clock) = janitor(1);
        cache.insert("first", ending_in(&clock, 10));
        cache.insert("second", ending_in(&clock, 20));

        let first = cache.slot("first");
        let second = cache.slot("second");
        {
            let _a = first.lock().await;
            let _b = second.lock().await;

            let report = janitor.sweep(clock.now());
            assert_eq!(report.evicted, 0);
            assert_eq!(report.remaining, 2);

            // The held slot is still the one the cache hands out.
            assert!(Arc::ptr_eq(&first, &cache.slot("first")));
        }
        drop(first);
        drop(second);

        let report = janitor.sweep(clock.now());
        assert_eq!(report.evicted, 1);
        assert_eq!(report.remaining, 1);
        assert!(cache.get("second").is_some());
    }

    /// Verifies an entry with a running durable write is not removed.
    #[tokio::test]
    async fn test_pending_sync_blocks_removal() {
        let (janitor, cache, clock) = janitor(10);
        cache.insert("syncing", ending_in(&clock, -600));

        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        cache.slot("syncing").lock().await.pending_sync = Some(tokio::spawn(async move {
            let _ = wait.await;
        }));

        assert_eq!(janitor.sweep(clock.now()).expired, 0);

        let _ = release.send(());
        for _ in 0..50 {
            if !cache.snapshot()[0].in_use {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(janitor.sweep(clock.now()).expired, 1);
    }
}
