//! Single-slot browser coordinator.
//!
//! This module provides [`BrowserCoordinator`], which owns at most one
//! remote browser session and leases it to one request at a time.
//!
//! # Overview
//!
//! The remote browser is scarce and externally rate limited, and one session
//! cannot serve two renders at once. The coordinator therefore:
//!
//! - Serializes access through a fair single-permit semaphore, so waiters
//!   are served in FIFO order
//! - Keeps the session between requests instead of relaunching it
//! - Probes a retained session before every reuse
//! - Closes the session after it has been idle for the configured timeout
//! - Enters a process-wide cooldown when the provider rejects a launch for
//!   capacity reasons, failing fast without contacting the provider
//!
//! # Architecture
//!
//! ```text
//! acquire()
//!    │
//!    ├── shutting down? ──────────────→ Err(ShuttingDown)
//!    ├── cooldown active? ────────────→ Err(UpstreamCapacity { remaining })
//!    │
//!    ▼
//! FIFO wait for the permit
//!    │
//!    ├── cooldown active? ────────────→ Err(UpstreamCapacity { remaining })
//!    ▼
//! slot ──→ idle expired? ──→ close ──┐
//!    │                               ├──→ launch ──→ capacity rejection? ──→ cooldown, Err
//!    └──→ probe ──→ failed ──→ close ┘
//!            │
//!            ▼
//!       SessionLease ──(drop)──→ back to slot, permit to next waiter,
//!                                idle check scheduled
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//!
//! let coordinator = BrowserCoordinator::builder()
//!     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!     .build()?;
//!
//! let mut lease = coordinator.acquire().await?;
//! let pdf = lease.render("<h1>Hello</h1>", &PdfOptions::default()).await?;
//! drop(lease); // session stays open for the next request
//!
//! coordinator.shutdown().await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::clock::{Clock, SystemClock};
use crate::config::CoordinatorConfig;
use crate::cooldown::Cooldown;
use crate::error::{BrowserError, Result};
use crate::factory::BrowserFactory;
use crate::handle::SessionLease;
use crate::service::types::ceil_secs;
use crate::stats::CoordinatorStats;
use crate::tracked::TrackedSession;

// ============================================================================
// CoordinatorInner
// ============================================================================

/// Shared state behind [`BrowserCoordinator`] and every [`SessionLease`].
///
/// # Locking
///
/// `slot` is a short-lived std mutex and is never held across an `.await`
/// or a blocking browser call. Exclusive use of the session is guaranteed
/// by the semaphore permit, not by `slot`.
pub(crate) struct CoordinatorInner {
    config: CoordinatorConfig,

    factory: Arc<dyn BrowserFactory>,

    clock: Arc<dyn Clock>,

    /// The retained session while nobody holds the permit.
    slot: Mutex<Option<TrackedSession>>,

    /// One permit. tokio's semaphore is fair, which gives FIFO hand-over.
    permit: Arc<Semaphore>,

    cooldown: Cooldown,

    shutting_down: AtomicBool,

    /// A lease is outstanding.
    leased: AtomicBool,

    /// Requests queued on the permit.
    waiting: AtomicUsize,

    /// Successful launches.
    launches: AtomicU64,

    /// Runtime used for spawning from `Drop`.
    runtime: tokio::runtime::Handle,
}

impl CoordinatorInner {
    fn lock_slot(&self) -> MutexGuard<'_, Option<TrackedSession>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub(crate) fn render_timeout(&self) -> Duration {
        self.config.render_timeout
    }

    fn cooldown_error(&self) -> Option<BrowserError> {
        self.cooldown
            .remaining(self.clock.now())
            .map(|retry_after| BrowserError::UpstreamCapacity { retry_after })
    }

    /// Take the retained session if it is still usable.
    ///
    /// Idle-expired sessions and sessions failing the probe are closed.
    async fn take_reusable(&self) -> Option<TrackedSession> {
        let mut tracked = self.lock_slot().take()?;
        let now = self.clock.now();

        if tracked.is_idle_expired(self.config.idle_timeout, now) {
            log::info!(
                "⏰ Browser session {} idle for {}s, closing",
                tracked.id(),
                (now - tracked.last_used()).num_seconds()
            );
            self.close_session(tracked).await;
            return None;
        }

        if tracked.is_suspect() {
            log::debug!(
                "Browser session {} timed out previously, probing before reuse",
                tracked.id()
            );
        }

        let session = Arc::clone(tracked.session());
        match tokio::task::spawn_blocking(move || session.ping()).await {
            Ok(Ok(())) => {
                log::trace!("✅ Browser session {} passed probe", tracked.id());
                tracked.clear_suspect();
                Some(tracked)
            }
            Ok(Err(e)) => {
                log::warn!(
                    "⚠️ Browser session {} failed probe, replacing: {}",
                    tracked.id(),
                    e
                );
                self.close_session(tracked).await;
                None
            }
            Err(e) => {
                log::error!("❌ Probe task for session {} failed: {}", tracked.id(), e);
                self.close_session(tracked).await;
                None
            }
        }
    }

    /// Launch a session, classifying capacity rejections into the cooldown.
    async fn launch(&self) -> Result<TrackedSession> {
        log::debug!("🚀 Launching browser session...");
        let factory = Arc::clone(&self.factory);

        let result = tokio::task::spawn_blocking(move || factory.create())
            .await
            .map_err(|e| BrowserError::BrowserCreation(format!("launch task failed: {}", e)))?;

        match result {
            Ok(session) => {
                self.launches.fetch_add(1, Ordering::Relaxed);
                let tracked = TrackedSession::new(session, self.clock.now());
                log::info!("✅ Browser session {} launched", tracked.id());
                Ok(tracked)
            }
            Err(e) if e.is_capacity_rejection() => {
                log::warn!("⚠️ Browser launch rejected for capacity: {}", e);
                let retry_after = self.cooldown.trigger(self.clock.now());
                Err(BrowserError::UpstreamCapacity { retry_after })
            }
            Err(e) => {
                log::error!("❌ Browser launch failed: {}", e);
                Err(e)
            }
        }
    }

    async fn close_session(&self, tracked: TrackedSession) {
        let id = tracked.id();
        let session = Arc::clone(tracked.session());
        if let Err(e) = tokio::task::spawn_blocking(move || session.close()).await {
            log::warn!("⚠️ Closing browser session {} panicked: {}", id, e);
        }
        log::debug!("Browser session {} closed", id);
    }

    /// Return a session from a finished lease.
    ///
    /// Called from [`SessionLease`]'s `Drop`, so it never blocks: the
    /// session goes back into the slot, the permit is released to the next
    /// FIFO waiter, and an idle check is scheduled.
    pub(crate) fn release(
        self_arc: &Arc<Self>,
        mut tracked: TrackedSession,
        permit: OwnedSemaphorePermit,
    ) {
        tracked.touch(self_arc.clock.now());
        let id = tracked.id();

        if self_arc.is_shutting_down() {
            log::debug!("Coordinator shutting down, closing session {} on release", id);
            self_arc.leased.store(false, Ordering::Release);
            drop(permit);
            let session = Arc::clone(tracked.session());
            self_arc.runtime.spawn_blocking(move || session.close());
            return;
        }

        *self_arc.lock_slot() = Some(tracked);
        self_arc.leased.store(false, Ordering::Release);
        drop(permit);

        log::trace!("Browser session {} returned to slot", id);
        Self::schedule_idle_check(self_arc, id);
    }

    /// Close session `id` if it is still unused after the idle timeout.
    fn schedule_idle_check(self_arc: &Arc<Self>, id: u64) {
        let idle_timeout = self_arc.config.idle_timeout;
        let weak: Weak<Self> = Arc::downgrade(self_arc);

        self_arc.runtime.spawn(async move {
            tokio::time::sleep(idle_timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.evict_if_idle(id).await;
            }
        });
    }

    async fn evict_if_idle(&self, id: u64) {
        // A leased session gets a fresh check when its lease ends.
        let Ok(_permit) = Arc::clone(&self.permit).try_acquire_owned() else {
            return;
        };

        let now = self.clock.now();
        let expired = {
            let mut slot = self.lock_slot();
            match slot.as_ref() {
                Some(t) if t.id() == id && t.is_idle_expired(self.config.idle_timeout, now) => {
                    slot.take()
                }
                _ => None,
            }
        };

        if let Some(tracked) = expired {
            log::info!(
                "⏰ Browser session {} idle for {}s (age {}s), closing",
                id,
                self.config.idle_timeout.as_secs(),
                tracked.age_secs(now)
            );
            self.close_session(tracked).await;
        }
    }
}

/// Decrements the waiter count even when the waiting future is dropped.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// BrowserCoordinator
// ============================================================================

/// Leases a single remote browser session to one request at a time.
///
/// Cheap to clone; clones share the same session and cooldown.
///
/// # Thread Safety
///
/// `BrowserCoordinator` is `Send + Sync`. Any number of tasks may call
/// [`acquire`](Self::acquire) concurrently; they are served in arrival order.
#[derive(Clone)]
pub struct BrowserCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl BrowserCoordinator {
    /// Create a new builder.
    pub fn builder() -> BrowserCoordinatorBuilder {
        BrowserCoordinatorBuilder::new()
    }

    /// Lease the browser session.
    ///
    /// Waits in FIFO order while another request holds the session.
    ///
    /// # Errors
    ///
    /// - [`BrowserError::ShuttingDown`] after [`shutdown`](Self::shutdown).
    /// - [`BrowserError::UpstreamCapacity`] while the cooldown is active
    ///   (the factory is not called) or when this launch was rejected for
    ///   capacity (the cooldown starts).
    /// - [`BrowserError::BrowserCreation`] for other launch failures.
    pub async fn acquire(&self) -> Result<SessionLease> {
        let inner = &self.inner;

        if inner.is_shutting_down() {
            log::warn!("Attempted to acquire browser during shutdown");
            return Err(BrowserError::ShuttingDown);
        }

        if let Some(err) = inner.cooldown_error() {
            log::debug!("Cooldown active, refusing acquisition: {}", err);
            return Err(err);
        }

        let permit = {
            let _waiting = WaitingGuard::enter(&inner.waiting);
            Arc::clone(&inner.permit)
                .acquire_owned()
                .await
                .map_err(|_| BrowserError::ShuttingDown)?
        };

        if inner.is_shutting_down() {
            return Err(BrowserError::ShuttingDown);
        }

        // A launch by the previous holder may have started the cooldown.
        if let Some(err) = inner.cooldown_error() {
            return Err(err);
        }

        let tracked = match inner.take_reusable().await {
            Some(tracked) => tracked,
            None => inner.launch().await?,
        };

        inner.leased.store(true, Ordering::Release);
        log::debug!("Browser session {} leased", tracked.id());

        Ok(SessionLease::new(tracked, permit, Arc::clone(inner)))
    }

    /// Remaining upstream cooldown, if active.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.inner.cooldown.remaining(self.inner.clock.now())
    }

    /// Snapshot of the coordinator state.
    pub fn stats(&self) -> CoordinatorStats {
        let inner = &self.inner;
        let leased = inner.leased.load(Ordering::Acquire);
        let retained = inner.lock_slot().is_some();

        CoordinatorStats {
            session_open: retained || leased,
            leased,
            waiting: inner.waiting.load(Ordering::SeqCst),
            launches: inner.launches.load(Ordering::Relaxed),
            cooldown_remaining_secs: self.cooldown_remaining().map(ceil_secs),
            shutting_down: inner.is_shutting_down(),
        }
    }

    /// Access the configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Stop leasing and close the retained session.
    ///
    /// Waiters are woken with [`BrowserError::ShuttingDown`]. A session that
    /// is currently leased is closed when its lease ends.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }

        log::info!("🛑 Shutting down browser coordinator...");
        inner.permit.close();

        let retained = inner.lock_slot().take();
        if let Some(tracked) = retained {
            inner.close_session(tracked).await;
        }

        log::info!("✅ Browser coordinator shutdown complete");
    }
}

impl std::fmt::Debug for BrowserCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserCoordinator")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

// ============================================================================
// BrowserCoordinatorBuilder
// ============================================================================

/// Builder for [`BrowserCoordinator`].
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = BrowserCoordinator::builder()
///     .config(CoordinatorConfig::default())
///     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
///     .build()?;
/// ```
pub struct BrowserCoordinatorBuilder {
    config: Option<CoordinatorConfig>,
    factory: Option<Arc<dyn BrowserFactory>>,
    clock: Option<Arc<dyn Clock>>,
}

impl BrowserCoordinatorBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: None,
            factory: None,
            clock: None,
        }
    }

    /// Set custom configuration.
    ///
    /// If not called, uses [`CoordinatorConfig::default()`].
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set browser factory (required).
    pub fn factory(mut self, factory: Box<dyn BrowserFactory>) -> Self {
        self.factory = Some(Arc::from(factory));
        self
    }

    /// Set a factory the caller keeps a handle to.
    pub fn shared_factory(mut self, factory: Arc<dyn BrowserFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Configuration`] if no factory was provided or
    /// when called outside a tokio runtime.
    pub fn build(self) -> Result<BrowserCoordinator> {
        let config = self.config.unwrap_or_default();
        let factory = self.factory.ok_or_else(|| {
            BrowserError::Configuration("No browser factory provided".to_string())
        })?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            BrowserError::Configuration(format!("coordinator requires a tokio runtime: {}", e))
        })?;

        log::info!(
            "🏗️ Building browser coordinator (idle {}s, render timeout {}s, cooldown {}s)",
            config.idle_timeout.as_secs(),
            config.render_timeout.as_secs(),
            config.cooldown.as_secs()
        );

        let inner = Arc::new(CoordinatorInner {
            cooldown: Cooldown::new(config.cooldown),
            config,
            factory,
            clock,
            slot: Mutex::new(None),
            permit: Arc::new(Semaphore::new(1)),
            shutting_down: AtomicBool::new(false),
            leased: AtomicBool::new(false),
            waiting: AtomicUsize::new(0),
            launches: AtomicU64::new(0),
            runtime,
        });

        Ok(BrowserCoordinator { inner })
    }
}

impl Default for BrowserCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::factory::mock::MockBrowserFactory;
    use crate::service::PdfOptions;

    fn coordinator_with(
        factory: Arc<MockBrowserFactory>,
        clock: Arc<ManualClock>,
        config: CoordinatorConfig,
    ) -> BrowserCoordinator {
        BrowserCoordinator::builder()
            .config(config)
            .shared_factory(factory)
            .clock(clock)
            .build()
            .unwrap()
    }

    fn setup() -> (BrowserCoordinator, Arc<MockBrowserFactory>, Arc<ManualClock>) {
        let factory = Arc::new(MockBrowserFactory::new());
        let clock = Arc::new(ManualClock::new());
        let coordinator = coordinator_with(
            Arc::clone(&factory),
            Arc::clone(&clock),
            CoordinatorConfig::default(),
        );
        (coordinator, factory, clock)
    }

    #[test]
    fn test_builder_requires_factory() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let result = BrowserCoordinator::builder().build();
        assert!(matches!(result, Err(BrowserError::Configuration(_))));
    }

    #[test]
    fn test_builder_requires_runtime() {
        let result = BrowserCoordinator::builder()
            .factory(Box::new(MockBrowserFactory::new()))
            .build();
        assert!(matches!(result, Err(BrowserError::Configuration(ref m)) if m.contains("tokio")));
    }

    /// Verifies that release keeps the session open and the next acquire reuses it.
    #[tokio::test]
    async fn test_session_reused_after_release() {
        let (coordinator, factory, _clock) = setup();

        let mut lease = coordinator.acquire().await.unwrap();
        let pdf = lease.render("<p>1</p>", &PdfOptions::default()).await.unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let first_id = lease.id();
        drop(lease);

        let stats = coordinator.stats();
        assert!(stats.is_idle());

        let lease = coordinator.acquire().await.unwrap();
        assert_eq!(lease.id(), first_id);
        assert_eq!(factory.creation_count(), 1);

        let mock = &factory.sessions()[0];
        assert!(!mock.is_closed());
        assert_eq!(mock.ping_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_relaunches() {
        let (coordinator, factory, _clock) = setup();

        drop(coordinator.acquire().await.unwrap());
        factory.sessions()[0].set_ping_fails(true);

        let _lease = coordinator.acquire().await.unwrap();
        assert_eq!(factory.creation_count(), 2);
        assert!(factory.sessions()[0].is_closed());
        assert!(!factory.sessions()[1].is_closed());
    }

    #[tokio::test]
    async fn test_idle_session_closed_on_acquire() {
        let (coordinator, factory, clock) = setup();

        drop(coordinator.acquire().await.unwrap());
        clock.advance(Duration::from_secs(60));

        let _lease = coordinator.acquire().await.unwrap();
        assert_eq!(factory.creation_count(), 2);
        assert!(factory.sessions()[0].is_closed());
        // Expired sessions are not probed.
        assert_eq!(factory.sessions()[0].ping_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_check_closes_unused_session() {
        let factory = Arc::new(MockBrowserFactory::new());
        let clock = Arc::new(ManualClock::new());
        let config = CoordinatorConfig {
            idle_timeout: Duration::from_millis(20),
            ..CoordinatorConfig::default()
        };
        let coordinator = coordinator_with(Arc::clone(&factory), Arc::clone(&clock), config);

        drop(coordinator.acquire().await.unwrap());
        clock.advance(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(factory.sessions()[0].is_closed());
        assert!(!coordinator.stats().session_open);
    }

    #[tokio::test]
    async fn test_idle_check_spares_recently_used_session() {
        let factory = Arc::new(MockBrowserFactory::new());
        let clock = Arc::new(ManualClock::new());
        let config = CoordinatorConfig {
            idle_timeout: Duration::from_millis(20),
            ..CoordinatorConfig::default()
        };
        let coordinator = coordinator_with(Arc::clone(&factory), Arc::clone(&clock), config);

        // The manual clock does not move, so the session is never idle long enough.
        drop(coordinator.acquire().await.unwrap());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!factory.sessions()[0].is_closed());
        assert!(coordinator.stats().session_open);
    }

    /// Verifies that a capacity rejection starts the cooldown and later calls skip the factory.
    #[tokio::test]
    async fn test_capacity_rejection_triggers_cooldown() {
        let factory = Arc::new(MockBrowserFactory::always_fails(
            "Unexpected server response: 429",
        ));
        let clock = Arc::new(ManualClock::new());
        let coordinator = coordinator_with(
            Arc::clone(&factory),
            Arc::clone(&clock),
            CoordinatorConfig::default(),
        );

        match coordinator.acquire().await {
            Err(BrowserError::UpstreamCapacity { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(60));
            }
            other => panic!("expected capacity error, got {:?}", other.map(|l| l.id())),
        }
        assert_eq!(factory.creation_count(), 1);

        clock.advance(Duration::from_secs(15));
        match coordinator.acquire().await {
            Err(BrowserError::UpstreamCapacity { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(45));
            }
            other => panic!("expected capacity error, got {:?}", other.map(|l| l.id())),
        }
        assert_eq!(factory.creation_count(), 1, "cooldown must not call the factory");
        assert_eq!(coordinator.stats().cooldown_remaining_secs, Some(45));

        clock.advance(Duration::from_secs(45));
        assert!(coordinator.acquire().await.is_err());
        assert_eq!(factory.creation_count(), 2, "factory is tried again after cooldown");
    }

    #[tokio::test]
    async fn test_other_launch_failure_no_cooldown() {
        let factory = Arc::new(MockBrowserFactory::always_fails("binary not found"));
        let clock = Arc::new(ManualClock::new());
        let coordinator = coordinator_with(
            Arc::clone(&factory),
            clock,
            CoordinatorConfig::default(),
        );

        assert!(matches!(
            coordinator.acquire().await,
            Err(BrowserError::BrowserCreation(_))
        ));
        assert!(coordinator.cooldown_remaining().is_none());
        assert!(coordinator.acquire().await.is_err());
        assert_eq!(factory.creation_count(), 2);
    }

    #[tokio::test]
    async fn test_render_timeout_marks_suspect_and_reprobes() {
        let factory = Arc::new(
            MockBrowserFactory::new().with_render_delay(Duration::from_millis(300)),
        );
        let clock = Arc::new(ManualClock::new());
        let config = CoordinatorConfig {
            render_timeout: Duration::from_millis(50),
            ..CoordinatorConfig::default()
        };
        let coordinator = coordinator_with(Arc::clone(&factory), clock, config);

        let mut lease = coordinator.acquire().await.unwrap();
        let err = lease.render("<p/>", &PdfOptions::default()).await.unwrap_err();
        assert!(matches!(err, BrowserError::RenderTimeout(_)));
        assert!(lease.is_suspect());
        drop(lease);

        // Released, not closed.
        assert!(!factory.sessions()[0].is_closed());

        let lease = coordinator.acquire().await.unwrap();
        assert!(!lease.is_suspect());
        assert_eq!(factory.sessions()[0].ping_count(), 1);
        assert_eq!(factory.creation_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_and_rejects() {
        let (coordinator, factory, _clock) = setup();

        drop(coordinator.acquire().await.unwrap());
        coordinator.shutdown().await;

        assert!(factory.sessions()[0].is_closed());
        assert!(matches!(
            coordinator.acquire().await,
            Err(BrowserError::ShuttingDown)
        ));
        assert!(coordinator.stats().shutting_down);
    }

    #[tokio::test]
    async fn test_shutdown_wakes_waiters() {
        let (coordinator, _factory, _clock) = setup();

        let lease = coordinator.acquire().await.unwrap();
        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.acquire().await.map(|l| l.id()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(coordinator.stats().waiting, 1);

        coordinator.shutdown().await;
        assert!(matches!(waiter.await.unwrap(), Err(BrowserError::ShuttingDown)));
        drop(lease);
    }
}
