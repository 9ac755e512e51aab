//! Concurrent access tests for the rate limiter and the browser coordinator.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use common::{harness, render_request, send, unique_client};
use html2pdf_gateway::clock::{Clock, ManualClock};
use html2pdf_gateway::factory::mock::MockBrowserFactory;
use html2pdf_gateway::prelude::*;
use html2pdf_gateway::rate_limit::RateLimitConfig;
use html2pdf_gateway::service::PdfOptions;
use html2pdf_gateway::store::mock::MockCounterStore;
use tokio::task::JoinSet;

fn limiter(max_requests: u32, store: Arc<MockCounterStore>, clock: Arc<ManualClock>) -> RateLimiter {
    let config = RateLimitConfig {
        max_requests,
        ..RateLimitConfig::default()
    };
    RateLimiter::new(config, Arc::new(WindowCache::new()), store, clock as Arc<dyn Clock>)
}

/// Test that concurrent checks for one client never over-admit.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_admit_exactly_max() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(
        MockCounterStore::new(clock.clone()).with_put_delay(Duration::from_millis(2)),
    );
    let limiter = Arc::new(limiter(5, store, clock));

    let admitted = Arc::new(AtomicUsize::new(0));
    let mut tasks = JoinSet::new();
    for _ in 0..40 {
        let limiter = Arc::clone(&limiter);
        let admitted = Arc::clone(&admitted);
        tasks.spawn(async move {
            if limiter.check("shared-client").await.allowed {
                admitted.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "Task should complete without panic");
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 5);
    assert_eq!(limiter.cache().get("shared-client").unwrap().count, 5);
}

/// Test that a burst of first requests reads the store once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cache_miss_single_store_read() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MockCounterStore::new(clock.clone()));
    let limiter = Arc::new(limiter(100, store.clone(), clock));

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move { limiter.check("burst").await });
    }

    let mut remaining = Vec::new();
    while let Some(result) = tasks.join_next().await {
        remaining.push(result.unwrap().remaining);
    }
    remaining.sort_unstable();

    assert_eq!(store.get_count(), 1);
    assert_eq!(remaining, (80..100).collect::<Vec<u32>>());
}

/// Test that the single session is never rendered on concurrently.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_concurrent_renders() {
    let factory = Arc::new(MockBrowserFactory::new().with_render_delay(Duration::from_millis(20)));
    let coordinator = BrowserCoordinator::builder()
        .shared_factory(factory.clone() as Arc<dyn BrowserFactory>)
        .clock(Arc::new(ManualClock::new()))
        .build()
        .unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let coordinator = coordinator.clone();
        tasks.spawn(async move {
            let mut lease = coordinator.acquire().await?;
            lease.render(&format!("<p>{}</p>", i), &PdfOptions::default()).await
        });
    }

    while let Some(result) = tasks.join_next().await {
        let pdf = result.unwrap().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    assert_eq!(factory.creation_count(), 1);
    let session = &factory.sessions()[0];
    assert_eq!(session.render_count(), 8);
    assert_eq!(session.max_concurrent_renders(), 1);

    let stats = coordinator.stats();
    assert_eq!(stats.waiting, 0);
    assert!(stats.is_idle());
}

/// Test that waiters are served in arrival order.
#[tokio::test]
async fn test_waiters_served_fifo() {
    let coordinator = BrowserCoordinator::builder()
        .factory(Box::new(MockBrowserFactory::new()))
        .clock(Arc::new(ManualClock::new()))
        .build()
        .unwrap();

    let holder = coordinator.acquire().await.unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut tasks = JoinSet::new();
    for i in 0..5 {
        let coordinator = coordinator.clone();
        let order = Arc::clone(&order);
        tasks.spawn(async move {
            let _lease = coordinator.acquire().await.unwrap();
            order.lock().unwrap().push(i);
        });
        // Let the task reach the queue before spawning the next.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(coordinator.stats().waiting, 5);
    drop(holder);

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok());
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

/// Test many clients through the full HTTP pipeline at once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_requests() {
    let h = harness(
        5,
        MockBrowserFactory::new().with_render_delay(Duration::from_millis(5)),
    );

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let state = h.state.clone();
        tasks.spawn(async move {
            send(&state, render_request(&unique_client(), r#"{"html":"<p/>"}"#))
                .await
                .status
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap(), StatusCode::OK);
    }

    assert_eq!(h.factory.creation_count(), 1);
    assert_eq!(h.factory.sessions()[0].max_concurrent_renders(), 1);
}
