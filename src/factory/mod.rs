//! Browser session factories.
//!
//! This module provides the [`BrowserFactory`] trait and implementations
//! for launching remote browser sessions.
//!
//! # Available Factories
//!
//! | Factory | Description |
//! |---------|-------------|
//! | [`ChromeBrowserFactory`] | Launches headless Chrome/Chromium |
//! | [`mock::MockBrowserFactory`] | Scriptable sessions for tests (feature-gated) |
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::{BrowserFactory, ChromeBrowserFactory};
//!
//! let factory = ChromeBrowserFactory::with_defaults();
//! let session = factory.create()?;
//! session.ping()?;
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeBrowserFactory, ChromeSession, create_chrome_options};

use std::sync::Arc;

use crate::error::Result;
use crate::traits::BrowserSession;

/// Launches browser sessions on behalf of the coordinator.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because the factory is shared with
/// the blocking thread pool where launches run.
///
/// # Errors and Capacity Rejection
///
/// A provider that refuses a launch for capacity reasons should return
/// [`BrowserError::BrowserCreation`](crate::BrowserError::BrowserCreation)
/// with the provider's message (for example `"429 Too Many Requests"`).
/// The coordinator recognises such messages and starts its cooldown.
pub trait BrowserFactory: Send + Sync {
    /// Launch a new session.
    ///
    /// Blocking; the coordinator calls it from the blocking pool.
    fn create(&self) -> Result<Arc<dyn BrowserSession>>;
}
