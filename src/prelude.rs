//! Convenient imports for common usage patterns.
//!
//! # Usage
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//! ```
//!
//! This imports:
//!
//! - [`GatewayConfig`] / [`GatewayConfigBuilder`] - Configuration
//! - [`AppState`] and [`router`] - HTTP wiring
//! - [`BrowserCoordinator`] / [`SessionLease`] - Browser session access
//! - [`BrowserError`] / [`Result`] - Error type and alias
//! - [`BrowserFactory`] / [`ChromeBrowserFactory`] - Session launchers
//! - [`RateLimiter`] / [`WindowCache`] / [`CacheJanitor`] - Rate limiting
//! - [`CounterStore`] / [`MemoryCounterStore`] - Durable counters
//! - [`Clock`] / [`SystemClock`] - Time source
//! - [`RenderRequest`] / [`PdfOptions`] / [`PdfServiceError`] - Service types
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//!
//! let state = AppState::new(
//!     GatewayConfigBuilder::new().api_token("t").build()?,
//!     Arc::new(MemoryCounterStore::new()),
//!     Arc::new(ChromeBrowserFactory::with_defaults()),
//!     Arc::new(SystemClock),
//! )?;
//! let app = router(state);
//! ```

pub use crate::clock::{Clock, SystemClock};
pub use crate::config::{GatewayConfig, GatewayConfigBuilder};
pub use crate::coordinator::{BrowserCoordinator, BrowserCoordinatorBuilder};
pub use crate::error::{BrowserError, Result};
pub use crate::factory::{BrowserFactory, ChromeBrowserFactory};
pub use crate::handle::SessionLease;
pub use crate::integrations::axum::router;
pub use crate::rate_limit::{CacheJanitor, RateLimiter, WindowCache};
pub use crate::service::{PdfOptions, PdfServiceError, RenderRequest};
pub use crate::state::AppState;
pub use crate::stats::CoordinatorStats;
pub use crate::store::{CounterStore, MemoryCounterStore};
pub use crate::traits::Healthcheck;

#[cfg(feature = "env-config")]
pub use crate::config::env::from_env;

pub use std::sync::Arc;
