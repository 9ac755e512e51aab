//! Counter store with failure injection for tests.
//!
//! This module is only available with the `test-utils` feature or in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{CounterStore, MemoryCounterStore, StoreError, StoredWindow};
use crate::clock::Clock;

/// Wraps a [`MemoryCounterStore`], counts calls and can be switched offline.
///
/// ```rust,ignore
/// let store = MockCounterStore::new(clock.clone());
/// store.set_failing(true);
/// assert!(store.get("ratelimit:x").await.is_err());
/// ```
pub struct MockCounterStore {
    inner: MemoryCounterStore,
    failing: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
    put_delay: Duration,
    slow_count: Option<(u32, Duration)>,
}

impl MockCounterStore {
    /// Healthy store on `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: MemoryCounterStore::with_clock(clock),
            failing: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            put_delay: Duration::ZERO,
            slow_count: None,
        }
    }

    /// Make every `put` sleep before completing.
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = delay;
        self
    }

    /// Make a `put` of exactly `count` sleep for `delay`; other puts are
    /// unaffected.
    pub fn with_slow_put_for_count(mut self, count: u32, delay: Duration) -> Self {
        self.slow_count = Some((count, delay));
        self
    }

    /// Switch failure mode on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `get` calls so far, including failed ones.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// `put` calls so far, including failed ones.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Read a value directly, bypassing counters and failure mode.
    pub async fn peek(&self, key: &str) -> Option<StoredWindow> {
        self.inner.get(key).await.ok().flatten()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("mock store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CounterStore for MockCounterStore {
    async fn get(&self, key: &str) -> Result<Option<StoredWindow>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: StoredWindow, ttl: Duration) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if !self.put_delay.is_zero() {
            tokio::time::sleep(self.put_delay).await;
        }
        if let Some((count, delay)) = self.slow_count {
            if value.count == count {
                tokio::time::sleep(delay).await;
            }
        }
        self.check_online()?;
        self.inner.put(key, value, ttl).await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_failing_mode() {
        let clock = Arc::new(ManualClock::new());
        let store = MockCounterStore::new(clock.clone());
        let value = StoredWindow {
            count: 1,
            window_end: clock.now(),
        };

        store.set_failing(true);
        assert!(store.put("k", value, Duration::from_secs(60)).await.is_err());
        assert!(store.get("k").await.is_err());

        store.set_failing(false);
        store.put("k", value, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(value));

        assert_eq!(store.get_count(), 2);
        assert_eq!(store.put_count(), 2);
    }
}
