//! Traits at the seam between the coordinator and the browser provider.
//!
//! - [`Healthcheck`]: cheap liveness probe
//! - [`BrowserSession`]: a leased remote browser that can render HTML
//!
//! Both are object safe; the coordinator stores sessions as
//! `Arc<dyn BrowserSession>` so tests can substitute
//! [`MockSession`](crate::factory::mock::MockSession).

mod healthcheck;
mod session;

pub use healthcheck::Healthcheck;
pub use session::BrowserSession;
