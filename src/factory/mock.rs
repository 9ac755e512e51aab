//! Mock browser factory for testing.
//!
//! This module provides a scriptable [`BrowserFactory`] whose sessions never
//! touch a real browser, so coordinator and HTTP behaviour can be tested
//! without Chrome installed.
//!
//! # Feature Flag
//!
//! This module is only available when:
//! - The `test-utils` feature is enabled, OR
//! - During testing (`#[cfg(test)]`)
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::factory::mock::MockBrowserFactory;
//!
//! // Provider that refuses every launch with a capacity error
//! let factory = MockBrowserFactory::always_fails("429 Too Many Requests");
//!
//! // Provider whose renders take a while
//! let factory = MockBrowserFactory::new().with_render_delay(Duration::from_millis(50));
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::BrowserFactory;
use crate::error::{BrowserError, Result};
use crate::service::PdfOptions;
use crate::traits::{BrowserSession, Healthcheck};

/// Mock browser factory.
///
/// This factory can be configured to:
/// - Always succeed with a [`MockSession`]
/// - Always fail with a specific launch error
/// - Fail after N successful launches
/// - Produce sessions whose renders are slow or fail
///
/// Every launched session is kept so tests can inspect it afterwards.
pub struct MockBrowserFactory {
    /// Launch error message, when launches should fail.
    error_message: Option<String>,

    /// Fail after this many successful launches.
    fail_after: Option<usize>,

    /// Launch attempts so far.
    creation_count: Arc<AtomicUsize>,

    /// Delay applied to every render.
    render_delay: Duration,

    /// Error returned by every render.
    render_error: Option<String>,

    /// Sessions handed out, oldest first.
    sessions: Mutex<Vec<Arc<MockSession>>>,
}

impl MockBrowserFactory {
    /// Factory whose launches always succeed.
    pub fn new() -> Self {
        Self {
            error_message: None,
            fail_after: None,
            creation_count: Arc::new(AtomicUsize::new(0)),
            render_delay: Duration::ZERO,
            render_error: None,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Factory whose launches always fail with `message`.
    ///
    /// ```rust,ignore
    /// let factory = MockBrowserFactory::always_fails("Chrome not installed");
    /// assert!(factory.create().is_err());
    /// assert_eq!(factory.creation_count(), 1);
    /// ```
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self {
            error_message: Some(message.into()),
            fail_after: Some(0),
            ..Self::new()
        }
    }

    /// Factory that launches `n` sessions, then fails with `message`.
    pub fn fail_after_n<S: Into<String>>(n: usize, message: S) -> Self {
        Self {
            error_message: Some(message.into()),
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// Make every render of every session sleep for `delay` first.
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Make every render fail with `message`.
    pub fn with_render_error<S: Into<String>>(mut self, message: S) -> Self {
        self.render_error = Some(message.into());
        self
    }

    /// Number of launch attempts, successful or not.
    pub fn creation_count(&self) -> usize {
        self.creation_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the launch counter.
    ///
    /// Useful after the factory has been moved into a coordinator.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.creation_count)
    }

    /// Sessions launched so far, oldest first.
    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockBrowserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserFactory for MockBrowserFactory {
    fn create(&self) -> Result<Arc<dyn BrowserSession>> {
        let count = self.creation_count.fetch_add(1, Ordering::SeqCst);

        if let (Some(limit), Some(message)) = (self.fail_after, &self.error_message) {
            if count >= limit {
                log::debug!("MockBrowserFactory: launch {} fails: {}", count, message);
                return Err(BrowserError::BrowserCreation(message.clone()));
            }
        }

        let session = Arc::new(MockSession::new(
            count as u64,
            self.render_delay,
            self.render_error.clone(),
        ));
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::clone(&session));

        Ok(session)
    }
}

impl std::fmt::Debug for MockBrowserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowserFactory")
            .field("error_message", &self.error_message)
            .field("fail_after", &self.fail_after)
            .field("creation_count", &self.creation_count.load(Ordering::SeqCst))
            .finish()
    }
}

/// Session produced by [`MockBrowserFactory`].
///
/// Renders return a tiny fake PDF that starts with `%PDF-`. The session
/// records how it was used so tests can assert on it.
#[derive(Debug)]
pub struct MockSession {
    id: u64,
    render_delay: Duration,
    render_error: Option<String>,
    closed: AtomicBool,
    ping_fails: AtomicBool,
    pings: AtomicUsize,
    renders: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_options: Mutex<Option<PdfOptions>>,
}

impl MockSession {
    fn new(id: u64, render_delay: Duration, render_error: Option<String>) -> Self {
        Self {
            id,
            render_delay,
            render_error,
            closed: AtomicBool::new(false),
            ping_fails: AtomicBool::new(false),
            pings: AtomicUsize::new(0),
            renders: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Launch sequence number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Make subsequent probes fail (or pass again).
    pub fn set_ping_fails(&self, fails: bool) {
        self.ping_fails.store(fails, Ordering::SeqCst);
    }

    /// Whether [`close`](BrowserSession::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of probes performed.
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Number of renders started.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Highest number of renders ever running at once on this session.
    pub fn max_concurrent_renders(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent render.
    pub fn last_options(&self) -> Option<PdfOptions> {
        self.last_options
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Healthcheck for MockSession {
    fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(BrowserError::HealthCheckFailed("session closed".to_string()));
        }
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(BrowserError::HealthCheckFailed(
                "mock probe failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl BrowserSession for MockSession {
    fn render(&self, html: &str, options: &PdfOptions, _timeout: Duration) -> Result<Vec<u8>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        *self.last_options.lock().unwrap_or_else(|e| e.into_inner()) = Some(options.clone());

        if !self.render_delay.is_zero() {
            std::thread::sleep(self.render_delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = &self.render_error {
            return Err(BrowserError::RenderFailed(message.clone()));
        }

        Ok(format!("%PDF-1.4\n% mock {} bytes of html\n%%EOF", html.len()).into_bytes())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
