//! Hybrid per-client rate limiting.
//!
//! | Type | Role |
//! |------|------|
//! | [`WindowCache`] | Authoritative in-process counters |
//! | [`RateLimiter`] | Fixed-window decision plus lazy durable sync |
//! | [`CacheJanitor`] | Request-driven expiry and size cap for the cache |
//!
//! The durable side is any [`CounterStore`](crate::store::CounterStore).

mod cache;
mod janitor;
mod limiter;

pub use cache::{RateWindow, WindowCache};
pub use janitor::{CacheJanitor, SweepReport};
pub use limiter::{RateLimitResult, RateLimiter};

pub use crate::config::{JanitorConfig, RateLimitConfig};
