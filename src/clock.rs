//! Time source abstraction.
//!
//! Rate-limit windows are persisted as absolute wall-clock timestamps, so
//! every component that reasons about time reads it through a [`Clock`].
//! Production code uses [`SystemClock`]; tests inject a
//! [`ManualClock`] and advance it explicitly.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_gateway::clock::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! println!("It is {}", now.to_rfc3339());
//! ```

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
///
/// # Thread Safety
///
/// Clocks are shared between the rate limiter, the cache janitor and the
/// browser coordinator, so implementations must be `Send + Sync`.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-utils"))]
mod manual {
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};

    use super::Clock;

    /// Manually driven clock for deterministic tests.
    ///
    /// Starts at a fixed instant and only moves when told to.
    ///
    /// ```rust,ignore
    /// let clock = ManualClock::new();
    /// let before = clock.now();
    /// clock.advance(Duration::from_secs(5));
    /// assert_eq!((clock.now() - before).num_seconds(), 5);
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock pinned to 2024-01-01T00:00:00Z.
        pub fn new() -> Self {
            let start = Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now);
            Self::starting_at(start)
        }

        /// Create a clock pinned to `start`.
        pub fn starting_at(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
            let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
            *now += delta;
        }

        /// Jump to an absolute instant.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(|e| e.into_inner())
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(1500));
        assert_eq!((clock.now() - start).num_milliseconds(), 1500);
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new();
        let target = clock.now() + chrono::Duration::hours(3);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
