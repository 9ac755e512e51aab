//! Liveness probe for remote browser sessions.
//!
//! The coordinator retains one browser session between requests. Before a
//! retained session is handed out again it is probed through
//! [`Healthcheck::ping`]; a failed probe discards the session and a
//! replacement is launched.

use crate::error::Result;

/// Trait for browser-like objects that support a cheap liveness probe.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because the probe runs on the blocking
/// thread pool while the session is owned by the coordinator.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use html2pdf_gateway::{Healthcheck, Result, BrowserError};
///
/// struct MyBrowser {
///     inner: SomeBrowserType,
/// }
///
/// impl Healthcheck for MyBrowser {
///     fn ping(&self) -> Result<()> {
///         let tab = self.inner.new_tab()
///             .map_err(|e| BrowserError::HealthCheckFailed(e.to_string()))?;
///         let _ = tab.close();
///         Ok(())
///     }
/// }
/// ```
///
/// # How It's Used
///
/// ```text
/// acquire()
///    │
///    ├── slot empty ─────────────────→ launch
///    │
///    ├── idle expired ──→ close ─────→ launch
///    │
///    └── ping() ──→ ✓ OK ────────────→ reuse
///               └─→ ✗ Failed → close → launch
/// ```
pub trait Healthcheck: Send + Sync {
    /// Verify the session is still functional.
    ///
    /// Should perform a lightweight operation like creating and closing a
    /// tab. Implementations block, so callers run them on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::HealthCheckFailed`](crate::BrowserError::HealthCheckFailed)
    /// if the session is unresponsive or its process has exited.
    fn ping(&self) -> Result<()>;
}
