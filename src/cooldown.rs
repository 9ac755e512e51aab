//! Process-wide upstream capacity cooldown.
//!
//! When the browser provider rejects a launch for capacity reasons, every
//! request for the next cooldown period fails fast without contacting the
//! provider. The state is a single atomic `blocked_until` timestamp in epoch
//! milliseconds, where 0 means not blocked.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Upstream cooldown state.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use chrono::Utc;
/// use html2pdf_gateway::Cooldown;
///
/// let cooldown = Cooldown::new(Duration::from_secs(60));
/// let now = Utc::now();
/// assert!(cooldown.remaining(now).is_none());
///
/// cooldown.trigger(now);
/// assert_eq!(cooldown.remaining(now), Some(Duration::from_secs(60)));
/// ```
#[derive(Debug)]
pub struct Cooldown {
    period: Duration,
    blocked_until_ms: AtomicI64,
}

impl Cooldown {
    /// Create an inactive cooldown that blocks for `period` once triggered.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            blocked_until_ms: AtomicI64::new(0),
        }
    }

    /// Configured cooldown length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until `now + period` and return the wait time.
    ///
    /// A later deadline already in place is kept.
    pub fn trigger(&self, now: DateTime<Utc>) -> Duration {
        let period_ms = i64::try_from(self.period.as_millis()).unwrap_or(i64::MAX);
        let until = now.timestamp_millis().saturating_add(period_ms);
        let previous = self.blocked_until_ms.fetch_max(until, Ordering::SeqCst);

        log::warn!(
            "🧊 Upstream capacity exceeded, refusing browser launches for {}s",
            self.period.as_secs()
        );

        let deadline = previous.max(until);
        Duration::from_millis((deadline - now.timestamp_millis()).max(0) as u64)
    }

    /// Time left in the cooldown, freshly computed from `now`.
    ///
    /// `None` once `now >= blocked_until`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.blocked_until_ms.load(Ordering::SeqCst);
        let now_ms = now.timestamp_millis();
        if until == 0 || now_ms >= until {
            None
        } else {
            Some(Duration::from_millis((until - now_ms) as u64))
        }
    }

    /// Whether the cooldown is active at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_some()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
