//! Durable counter store.
//!
//! The rate limiter keeps its authoritative per-process state in memory and
//! replicates it lazily into a [`CounterStore`] so that limits survive
//! process restarts. The store is a plain key-value map with per-key TTL;
//! it may be slow, eventually consistent or unavailable at any time.
//!
//! # Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | [`MemoryCounterStore`] | always | In-process map, used when no external store is configured |
//! | [`RedisCounterStore`] | `redis-store` | Redis via `ConnectionManager` |
//! | [`mock::MockCounterStore`] | `test-utils` | Failure injection and call counting |
//!
//! # Wire Format
//!
//! Values are JSON: `{"count": 3, "windowEnd": 1704067260000}` with
//! `windowEnd` in epoch milliseconds.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod memory;
#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use memory::MemoryCounterStore;
#[cfg(feature = "redis-store")]
pub use redis_store::RedisCounterStore;

/// Key prefix for rate-limit counters.
pub const KEY_PREFIX: &str = "ratelimit:";

/// Smallest TTL ever written. Hosted KV stores commonly reject lower values.
pub const MIN_TTL: Duration = Duration::from_secs(60);

/// Errors from a [`CounterStore`].
///
/// The rate limiter logs these and carries on in memory-only mode; they
/// never reach HTTP clients.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("Counter store serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// The replicated part of a rate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWindow {
    /// Admitted requests in the window.
    pub count: u32,

    /// Absolute end of the window.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub window_end: DateTime<Utc>,
}

impl StoredWindow {
    /// Encode as the JSON wire format.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON wire format.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Key-value store holding replicated counters.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use html2pdf_gateway::store::{CounterStore, StoreError, StoredWindow};
///
/// struct NullStore;
///
/// #[async_trait]
/// impl CounterStore for NullStore {
///     async fn get(&self, _key: &str) -> Result<Option<StoredWindow>, StoreError> {
///         Ok(None)
///     }
///
///     async fn put(&self, _key: &str, _value: StoredWindow, _ttl: Duration) -> Result<(), StoreError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a counter. `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<StoredWindow>, StoreError>;

    /// Write a counter that expires after `ttl`.
    async fn put(&self, key: &str, value: StoredWindow, ttl: Duration) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str {
        "counter-store"
    }
}

/// Store key for a client identifier.
///
/// ```rust
/// assert_eq!(html2pdf_gateway::store::counter_key("10.0.0.1"), "ratelimit:10.0.0.1");
/// ```
pub fn counter_key(identifier: &str) -> String {
    format!("{}{}", KEY_PREFIX, identifier)
}

/// TTL for a window ending at `window_end`: the time left, at least [`MIN_TTL`].
pub fn ttl_for(window_end: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let left = (window_end - now).to_std().unwrap_or(Duration::ZERO);
    let whole = Duration::from_secs(left.as_secs() + u64::from(left.subsec_nanos() > 0));
    whole.max(MIN_TTL)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Verifies the JSON wire format uses camelCase and epoch millis.
    #[test]
    fn test_stored_window_wire_format() {
        let window = StoredWindow {
            count: 3,
            window_end: Utc.timestamp_millis_opt(1_704_067_260_000).unwrap(),
        };

        let json = window.to_json().unwrap();
        assert_eq!(json, r#"{"count":3,"windowEnd":1704067260000}"#);
        assert_eq!(StoredWindow::from_json(&json).unwrap(), window);
    }

    #[test]
    fn test_stored_window_bad_json() {
        assert!(matches!(
            StoredWindow::from_json("{\"count\":\"x\"}"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_ttl_floor() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(ttl_for(now + chrono::Duration::seconds(10), now), MIN_TTL);
        assert_eq!(ttl_for(now - chrono::Duration::seconds(10), now), MIN_TTL);
        assert_eq!(
            ttl_for(now + chrono::Duration::milliseconds(90_500), now),
            Duration::from_secs(91)
        );
    }
}
