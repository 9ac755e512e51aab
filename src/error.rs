//! Error types for the browser coordinator.
//!
//! This module provides [`BrowserError`], the unified error type for every
//! operation that touches the remote browser session, and a convenient
//! [`Result`] type alias.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_gateway::{BrowserError, Result};
//!
//! fn render() -> Result<Vec<u8>> {
//!     Err(BrowserError::Configuration("example error".to_string()))
//! }
//!
//! match render() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(BrowserError::ShuttingDown) => println!("Coordinator is shutting down"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::time::Duration;

/// Phrases that identify an upstream capacity rejection.
///
/// Matched case-insensitively against launch failure messages.
const CAPACITY_REJECTION_MARKERS: &[&str] = &["429", "rate limit", "too many requests"];

/// Errors that can occur while acquiring or using a browser session.
///
/// # Example
///
/// ```rust
/// use html2pdf_gateway::BrowserError;
///
/// fn describe(error: &BrowserError) -> &'static str {
///     match error {
///         BrowserError::UpstreamCapacity { .. } => "upstream cooling down",
///         BrowserError::RenderTimeout(_) => "render timed out",
///         BrowserError::ShuttingDown => "shutting down",
///         _ => "other failure",
///     }
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrowserError {
    /// Failed to launch a new browser session.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not installed
    /// - The remote provider refused the launch
    /// - System resource limits exceeded
    ///
    /// A launch failure whose message looks like a capacity rejection is
    /// converted into [`BrowserError::UpstreamCapacity`] by the coordinator.
    #[error("Failed to create browser: {0}")]
    BrowserCreation(String),

    /// The liveness probe failed.
    ///
    /// The coordinator discards the session and launches a replacement;
    /// callers never see this variant from [`acquire`](crate::BrowserCoordinator::acquire).
    #[error("Browser health check failed: {0}")]
    HealthCheckFailed(String),

    /// The remote session failed while rendering the document.
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// Rendering did not finish within the configured bound.
    ///
    /// The session is marked suspect and re-probed before its next use.
    #[error("Render timed out after {}s", .0.as_secs())]
    RenderTimeout(Duration),

    /// The upstream browser provider is out of capacity.
    ///
    /// Either this request's launch was rejected, or a process-wide
    /// cooldown from an earlier rejection is still active. `retry_after`
    /// is the remaining cooldown, computed at the time of the failure.
    #[error("Browser capacity exceeded, retry after {}s", .retry_after.as_secs())]
    UpstreamCapacity {
        /// Time left until the cooldown expires.
        retry_after: Duration,
    },

    /// Operation attempted during coordinator shutdown.
    #[error("Coordinator is shutting down")]
    ShuttingDown,

    /// Invalid configuration provided.
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_gateway::BrowserError;
    ///
    /// let error = BrowserError::Configuration(
    ///     "render_timeout must be greater than 0".to_string()
    /// );
    /// println!("{}", error); // "Configuration error: render_timeout must be greater than 0"
    /// ```
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BrowserError {
    /// Returns `true` when this error carries the upstream capacity signal.
    ///
    /// Launch failures are classified by message text, because remote
    /// providers surface their 429 responses as plain error strings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_gateway::BrowserError;
    ///
    /// let err = BrowserError::BrowserCreation("HTTP 429 Too Many Requests".into());
    /// assert!(err.is_capacity_rejection());
    ///
    /// let err = BrowserError::BrowserCreation("binary not found".into());
    /// assert!(!err.is_capacity_rejection());
    /// ```
    pub fn is_capacity_rejection(&self) -> bool {
        match self {
            Self::UpstreamCapacity { .. } => true,
            Self::BrowserCreation(msg) => is_capacity_message(msg),
            _ => false,
        }
    }
}

/// Checks a free-form upstream message for a capacity rejection marker.
pub(crate) fn is_capacity_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CAPACITY_REJECTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Convenience conversion from [`String`] to [`BrowserError::Configuration`].
impl From<String> for BrowserError {
    fn from(msg: String) -> Self {
        BrowserError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`BrowserError::Configuration`].
impl From<&str> for BrowserError {
    fn from(msg: &str) -> Self {
        BrowserError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`BrowserError`].
pub type Result<T> = std::result::Result<T, BrowserError>;

// ============================================================================
// Unit Tests
// ============================================================================
