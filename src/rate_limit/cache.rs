//! Process-local window cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;

/// One identifier's fixed-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests admitted in the current window.
    pub count: u32,

    /// Absolute end of the current window.
    pub window_end: DateTime<Utc>,

    /// Last time the counter was handed to the durable store, `None` if never.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl RateWindow {
    /// A new, empty window ending at `window_end`.
    pub fn fresh(window_end: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_end,
            last_synced_at: None,
        }
    }
}

/// Contents of one identifier's slot.
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    /// `None` until the first check loads or creates a window.
    pub(crate) window: Option<RateWindow>,

    /// Spawned durable write that may still be running. Later writes for
    /// the same identifier wait for it so the store never goes backwards.
    pub(crate) pending_sync: Option<JoinHandle<()>>,
}

impl SlotState {
    /// A spawned write for this identifier has not finished yet.
    pub(crate) fn sync_in_flight(&self) -> bool {
        self.pending_sync
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Per-identifier slot. The async mutex is the identifier's critical section.
pub(crate) type WindowSlot = Arc<tokio::sync::Mutex<SlotState>>;

/// View of one cache entry for the janitor.
#[derive(Debug, Clone)]
pub(crate) struct EntryView {
    pub(crate) key: String,
    /// `None` when the slot is empty or could not be inspected.
    pub(crate) window_end: Option<DateTime<Utc>>,
    /// A request currently holds or is about to lock the slot, or a
    /// durable write for it is still running.
    pub(crate) in_use: bool,
}

/// Mapping from client identifier to [`RateWindow`].
///
/// Authoritative for admit/reject decisions within one process lifetime.
/// Lookups are lock-free across identifiers; each identifier has its own
/// async mutex so concurrent requests for the same client are linearized.
#[derive(Default)]
pub struct WindowCache {
    entries: DashMap<String, WindowSlot>,
}

impl WindowCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current window for `identifier`, if cached and not locked.
    pub fn get(&self, identifier: &str) -> Option<RateWindow> {
        let slot = self.entries.get(identifier)?;
        let window = slot.try_lock().ok().and_then(|state| state.window);
        window
    }

    /// Slot for `identifier`, created empty on first use.
    pub(crate) fn slot(&self, identifier: &str) -> WindowSlot {
        if let Some(slot) = self.entries.get(identifier) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.entries.entry(identifier.to_string()).or_default().value())
    }

    /// Point-in-time view of all entries.
    pub(crate) fn snapshot(&self) -> Vec<EntryView> {
        self.entries
            .iter()
            .map(|entry| {
                let slot = entry.value();
                let shared = Arc::strong_count(slot) > 1;
                match slot.try_lock() {
                    Ok(state) => EntryView {
                        key: entry.key().clone(),
                        window_end: state.window.map(|w| w.window_end),
                        in_use: shared || state.sync_in_flight(),
                    },
                    Err(_) => EntryView {
                        key: entry.key().clone(),
                        window_end: None,
                        in_use: true,
                    },
                }
            })
            .collect()
    }

    /// Remove `key` if no request is using it, no durable write for it is
    /// running, and `pred` holds for its window.
    ///
    /// The check and removal happen under the map's shard lock, so a request
    /// cannot pick up the slot in between.
    pub(crate) fn remove_idle_if(
        &self,
        key: &str,
        pred: impl FnOnce(Option<&RateWindow>) -> bool,
    ) -> bool {
        self.entries
            .remove_if(key, |_, slot| {
                if Arc::strong_count(slot) > 1 {
                    return false;
                }
                match slot.try_lock() {
                    Ok(state) if !state.sync_in_flight() => pred(state.window.as_ref()),
                    _ => false,
                }
            })
            .is_some()
    }

    /// Seed an entry directly.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn insert(&self, identifier: &str, window: RateWindow) {
        self.entries.insert(
            identifier.to_string(),
            Arc::new(tokio::sync::Mutex::new(SlotState {
                window: Some(window),
                pending_sync: None,
            })),
        );
    }
}
