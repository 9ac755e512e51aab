//! In-process counter store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CounterStore, StoreError, StoredWindow};
use crate::clock::{Clock, SystemClock};

/// Counter store backed by a concurrent map.
///
/// Used when no external store is configured. Values do not survive a
/// restart, so limits are only enforced within one process lifetime.
/// Expired entries are dropped lazily on read.
pub struct MemoryCounterStore {
    entries: DashMap<String, (StoredWindow, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored keys, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<StoredWindow>, StoreError> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, expires_at) = *entry;
                if now < expires_at {
                    return Ok(Some(value));
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, (_, expires_at)| now >= *expires_at);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: StoredWindow, ttl: Duration) -> Result<(), StoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::Serialization(format!("invalid ttl: {}", e)))?;
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
