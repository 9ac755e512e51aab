//! The remote browser session abstraction.

use std::time::Duration;

use crate::error::Result;
use crate::service::PdfOptions;
use crate::traits::Healthcheck;

/// One live remote browser process.
///
/// A session is exclusively leased to a single in-flight render at a time
/// by the [`BrowserCoordinator`](crate::BrowserCoordinator); implementations
/// do not need to support concurrent renders.
///
/// All methods block. The coordinator calls them from
/// [`tokio::task::spawn_blocking`].
pub trait BrowserSession: Healthcheck {
    /// Render `html` into PDF bytes.
    ///
    /// `timeout` bounds content-load readiness inside the session. The
    /// coordinator applies the same bound around the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::RenderFailed`](crate::BrowserError::RenderFailed)
    /// when the page cannot be loaded or printed.
    fn render(&self, html: &str, options: &PdfOptions, timeout: Duration) -> Result<Vec<u8>>;

    /// Close the session and release the remote process.
    ///
    /// Best effort: failures are logged by the implementation, never
    /// returned. Calling `close` more than once is harmless.
    fn close(&self);
}
