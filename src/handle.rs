//! RAII lease on the coordinator's browser session.
//!
//! This module provides [`SessionLease`], which grants exclusive use of the
//! browser session and hands it back to the coordinator when dropped.
//!
//! # Overview
//!
//! The lease guarantees release even if:
//! - The caller returns early
//! - Rendering fails or times out
//! - The request future is cancelled
//!
//! Release never closes the session; it goes back into the coordinator's
//! slot and the next queued request is woken.
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! let mut lease = coordinator.acquire().await?;
//! let pdf = lease.render(&html, &options).await?;
//! // lease dropped here, session returned
//! ```

use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use crate::coordinator::CoordinatorInner;
use crate::error::{BrowserError, Result};
use crate::service::PdfOptions;
use crate::tracked::TrackedSession;

/// Exclusive lease on the browser session.
///
/// Obtained from [`BrowserCoordinator::acquire`](crate::BrowserCoordinator::acquire).
pub struct SessionLease {
    /// `Some` until dropped.
    tracked: Option<TrackedSession>,

    /// The coordinator's single permit.
    permit: Option<OwnedSemaphorePermit>,

    coordinator: Arc<CoordinatorInner>,
}

impl SessionLease {
    pub(crate) fn new(
        tracked: TrackedSession,
        permit: OwnedSemaphorePermit,
        coordinator: Arc<CoordinatorInner>,
    ) -> Self {
        Self {
            tracked: Some(tracked),
            permit: Some(permit),
            coordinator,
        }
    }

    /// Identifier of the leased session, for logs.
    pub fn id(&self) -> u64 {
        self.tracked.as_ref().map(|t| t.id()).unwrap_or(0)
    }

    /// Whether a render on this session timed out.
    pub fn is_suspect(&self) -> bool {
        self.tracked.as_ref().is_some_and(|t| t.is_suspect())
    }

    /// Render `html` on the leased session.
    ///
    /// The browser work runs on the blocking pool and is bounded by the
    /// coordinator's render timeout.
    ///
    /// # Errors
    ///
    /// - [`BrowserError::RenderTimeout`] when the bound is exceeded. The
    ///   session is marked suspect and probed before its next use.
    /// - [`BrowserError::RenderFailed`] for provider failures.
    pub async fn render(&mut self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let timeout = self.coordinator.render_timeout();
        let tracked = self
            .tracked
            .as_mut()
            .ok_or_else(|| BrowserError::RenderFailed("lease already released".to_string()))?;

        let session = Arc::clone(tracked.session());
        let html = html.to_owned();
        let options = options.clone();

        log::debug!(
            "Rendering {} bytes of HTML on session {} (timeout {}s)",
            html.len(),
            tracked.id(),
            timeout.as_secs()
        );

        let task = tokio::task::spawn_blocking(move || session.render(&html, &options, timeout));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                log::error!("❌ Render task on session {} failed: {}", tracked.id(), e);
                tracked.mark_suspect();
                Err(BrowserError::RenderFailed(format!("render task failed: {}", e)))
            }
            Err(_) => {
                log::warn!(
                    "⚠️ Render on session {} exceeded {}s, marking suspect",
                    tracked.id(),
                    timeout.as_secs()
                );
                tracked.mark_suspect();
                Err(BrowserError::RenderTimeout(timeout))
            }
        }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if let (Some(tracked), Some(permit)) = (self.tracked.take(), self.permit.take()) {
            log::debug!("SessionLease {} dropped, returning session", tracked.id());
            CoordinatorInner::release(&self.coordinator, tracked, permit);
        }
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tracked {
            Some(tracked) => f
                .debug_struct("SessionLease")
                .field("id", &tracked.id())
                .field("suspect", &tracked.is_suspect())
                .finish(),
            None => f
                .debug_struct("SessionLease")
                .field("state", &"returned")
                .finish(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
