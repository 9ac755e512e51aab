//! Coordinator statistics for monitoring and health checks.
//!
//! This module provides [`CoordinatorStats`], a snapshot of the browser
//! coordinator's current state. It is served by `GET /health`.
//!
//! # Example
//!
//! ```rust,ignore
//! let stats = coordinator.stats();
//! println!("Session open: {}, waiting: {}", stats.session_open, stats.waiting);
//! ```

use serde::Serialize;

/// Snapshot of coordinator state at a point in time.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `session_open` | A session exists (idle in the slot or leased) |
/// | `leased` | The session is held by an in-flight render |
/// | `waiting` | Requests queued for the session |
/// | `launches` | Sessions launched since start |
/// | `cooldown_remaining_secs` | Remaining upstream cooldown, if active |
///
/// # Example
///
/// ```rust
/// use html2pdf_gateway::CoordinatorStats;
///
/// let stats = CoordinatorStats {
///     session_open: true,
///     leased: false,
///     waiting: 0,
///     launches: 1,
///     cooldown_remaining_secs: None,
///     shutting_down: false,
/// };
///
/// assert!(stats.is_idle());
/// assert!(!stats.is_cooling_down());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStats {
    /// Whether a live session is retained or leased.
    ///
    /// # Note
    ///
    /// This value can change immediately after reading if another request
    /// acquires or releases the session.
    pub session_open: bool,

    /// Whether the session is currently leased to a request.
    pub leased: bool,

    /// Number of requests waiting in the FIFO queue.
    pub waiting: usize,

    /// Total sessions launched since the coordinator was built.
    pub launches: u64,

    /// Whole seconds left in the upstream cooldown, `None` when not blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_secs: Option<u64>,

    /// Whether [`shutdown`](crate::BrowserCoordinator::shutdown) was called.
    pub shutting_down: bool,
}

impl CoordinatorStats {
    /// A session is open and nobody is using it.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.session_open && !self.leased
    }

    /// Upstream cooldown is in effect.
    #[inline]
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining_secs.is_some()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CoordinatorStats {
        CoordinatorStats {
            session_open: false,
            leased: false,
            waiting: 0,
            launches: 0,
            cooldown_remaining_secs: None,
            shutting_down: false,
        }
    }

    #[test]
    fn test_is_idle() {
        assert!(!stats().is_idle());

        let open = CoordinatorStats {
            session_open: true,
            ..stats()
        };
        assert!(open.is_idle());

        let leased = CoordinatorStats {
            session_open: true,
            leased: true,
            ..stats()
        };
        assert!(!leased.is_idle());
    }

    /// Verifies the health payload field names.
    #[test]
    fn test_serialize_camel_case() {
        let json = serde_json::to_value(CoordinatorStats {
            cooldown_remaining_secs: Some(12),
            waiting: 2,
            ..stats()
        })
        .unwrap();

        assert_eq!(json["cooldownRemainingSecs"], 12);
        assert_eq!(json["waiting"], 2);
        assert_eq!(json["sessionOpen"], false);

        let json = serde_json::to_value(stats()).unwrap();
        assert!(json.get("cooldownRemainingSecs").is_none());
    }
}
