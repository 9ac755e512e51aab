//! Tracked browser session with lifecycle metadata.
//!
//! Each session launched by the coordinator is wrapped in a
//! [`TrackedSession`] that tracks:
//! - **Unique ID**: for log correlation
//! - **Creation time**: for diagnostics
//! - **Last use**: for idle eviction
//! - **Suspect flag**: set when a render timed out
//!
//! # Architecture
//!
//! ```text
//! TrackedSession
//! ├── id: u64 (unique identifier)
//! ├── session: Arc<dyn BrowserSession>
//! ├── created_at: DateTime<Utc>
//! ├── last_used: DateTime<Utc> (idle eviction)
//! └── suspect: bool (timed out while rendering)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::traits::BrowserSession;

/// A browser session with metadata for the coordinator.
///
/// # Lifecycle
///
/// ```text
/// launch ──→ TrackedSession::new()
///               │
///               ▼
///          leased to a request ──→ returned to the slot (last_used = now)
///               │                         │
///               │                         ├──→ idle > timeout ──→ closed
///               │                         │
///               │                         └──→ next acquire ──→ probe ──→ reuse / close
///               │
///               └──→ render timeout ──→ suspect (probe decides on next acquire)
/// ```
#[derive(Clone)]
pub(crate) struct TrackedSession {
    /// Process-unique identifier, assigned sequentially.
    id: u64,

    /// The remote session.
    session: Arc<dyn BrowserSession>,

    /// Launch time.
    created_at: DateTime<Utc>,

    /// End of the most recent lease.
    last_used: DateTime<Utc>,

    /// A render on this session timed out.
    suspect: bool,
}

impl TrackedSession {
    /// Track a freshly launched session.
    pub(crate) fn new(session: Arc<dyn BrowserSession>, now: DateTime<Utc>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);

        log::debug!("🆕 Tracking browser session {}", id);

        Self {
            id,
            session,
            created_at: now,
            last_used: now,
            suspect: false,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn session(&self) -> &Arc<dyn BrowserSession> {
        &self.session
    }

    pub(crate) fn last_used(&self) -> DateTime<Utc> {
        self.last_used
    }

    pub(crate) fn is_suspect(&self) -> bool {
        self.suspect
    }

    /// Record the end of a lease.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used = now;
    }

    pub(crate) fn mark_suspect(&mut self) {
        self.suspect = true;
    }

    /// Clear the suspect flag after a passing probe.
    pub(crate) fn clear_suspect(&mut self) {
        self.suspect = false;
    }

    /// Unused for at least `idle_timeout` as of `now`.
    ///
    /// Exactly `idle_timeout` of idleness counts as expired.
    pub(crate) fn is_idle_expired(&self, idle_timeout: Duration, now: DateTime<Utc>) -> bool {
        let idle = now - self.last_used;
        match chrono::Duration::from_std(idle_timeout) {
            Ok(limit) => idle >= limit,
            Err(_) => false,
        }
    }

    /// Seconds since launch, for logs.
    pub(crate) fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

impl std::fmt::Debug for TrackedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedSession")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("last_used", &self.last_used)
            .field("suspect", &self.suspect)
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::factory::BrowserFactory;
    use crate::factory::mock::MockBrowserFactory;

    fn tracked(now: DateTime<Utc>) -> TrackedSession {
        let session = MockBrowserFactory::new().create().unwrap();
        TrackedSession::new(session, now)
    }

    /// Verifies idle expiry including the exact boundary.
    #[test]
    fn test_idle_expiry_boundary() {
        let clock = ManualClock::new();
        let tracked = tracked(clock.now());
        let timeout = Duration::from_secs(60);

        clock.advance(Duration::from_secs(59));
        assert!(!tracked.is_idle_expired(timeout, clock.now()));

        clock.advance(Duration::from_secs(1));
        assert!(tracked.is_idle_expired(timeout, clock.now()));
    }

    #[test]
    fn test_touch_resets_idle() {
        let clock = ManualClock::new();
        let mut tracked = tracked(clock.now());
        let timeout = Duration::from_secs(60);

        clock.advance(Duration::from_secs(90));
        tracked.touch(clock.now());
        assert!(!tracked.is_idle_expired(timeout, clock.now()));
        assert_eq!(tracked.age_secs(clock.now()), 90);
    }

    #[test]
    fn test_suspect_flag() {
        let mut tracked = tracked(ManualClock::new().now());
        assert!(!tracked.is_suspect());
        tracked.mark_suspect();
        assert!(tracked.is_suspect());
        tracked.clear_suspect();
        assert!(!tracked.is_suspect());
    }

    #[test]
    fn test_ids_are_unique() {
        let now = ManualClock::new().now();
        let a = tracked(now);
        let b = tracked(now);
        assert_ne!(a.id(), b.id());
    }
}
