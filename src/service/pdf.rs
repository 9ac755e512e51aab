//! Render orchestration (framework-agnostic).
//!
//! Ties the [`BrowserCoordinator`] to the request and response types:
//!
//! ```text
//! RenderRequest ──→ acquire() ──→ SessionLease::render() ──→ PdfResponse
//!                     │                  │
//!                     │ cooldown / queue │ timeout / provider error
//!                     ▼                  ▼
//!             PdfServiceError     PdfServiceError
//! ```
//!
//! The lease is a local, so the session returns to the coordinator on every
//! path out of [`render_pdf`], including cancellation of the calling future.

use std::time::Instant;

use super::types::{HealthResponse, PdfResponse, PdfServiceError, RenderRequest};
use crate::coordinator::BrowserCoordinator;
use crate::handle::SessionLease;

/// Lease the browser session.
///
/// Split out from [`render_pdf`] so HTTP handlers can report acquisition
/// failures (cooldown) separately from render failures.
///
/// # Errors
///
/// - [`PdfServiceError::UpstreamCapacity`] while the cooldown is active, or
///   when a launch was rejected for capacity.
/// - [`PdfServiceError::ShuttingDown`] after shutdown.
/// - [`PdfServiceError::RenderFailed`] when the browser cannot be started.
pub async fn acquire_session(
    coordinator: &BrowserCoordinator,
) -> Result<SessionLease, PdfServiceError> {
    coordinator.acquire().await.map_err(|e| {
        let err = PdfServiceError::from(e);
        match &err {
            PdfServiceError::UpstreamCapacity { retry_after, .. } => {
                log::warn!("⏳ Upstream capacity cooldown, retry in {}s", retry_after);
            }
            other => log::error!("❌ Failed to acquire browser session: {}", other),
        }
        err
    })
}

/// Render on an already acquired lease.
///
/// # Errors
///
/// [`PdfServiceError::RenderFailed`] on timeout or provider failure.
pub async fn render_with_lease(
    lease: &mut SessionLease,
    request: &RenderRequest,
) -> Result<PdfResponse, PdfServiceError> {
    let options = request.options();
    let started = Instant::now();

    log::debug!(
        "Rendering {} bytes of HTML as {:?} (background: {}) on session {}",
        request.html.len(),
        options.format(),
        options.print_background(),
        lease.id()
    );

    let data = lease.render(&request.html, &options).await.map_err(|e| {
        log::error!("❌ PDF render failed on session {}: {}", lease.id(), e);
        PdfServiceError::from(e)
    })?;

    log::info!(
        "✅ PDF generated ({} bytes HTML → {} bytes PDF) in {}ms",
        request.html.len(),
        data.len(),
        started.elapsed().as_millis()
    );

    Ok(PdfResponse::new(data))
}

/// Acquire, render and release.
///
/// ```rust,ignore
/// let request = RenderRequest::from_json_bytes(br#"{"html":"<h1>Hi</h1>"}"#)?;
/// let pdf = render_pdf(&coordinator, &request).await?;
/// std::fs::write("hi.pdf", &pdf.data)?;
/// ```
pub async fn render_pdf(
    coordinator: &BrowserCoordinator,
    request: &RenderRequest,
) -> Result<PdfResponse, PdfServiceError> {
    let mut lease = acquire_session(coordinator).await?;
    render_with_lease(&mut lease, request).await
}

/// Health snapshot for `GET /health`.
pub fn health(coordinator: &BrowserCoordinator) -> HealthResponse {
    HealthResponse::new(coordinator.stats())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::clock::ManualClock;
    use crate::factory::mock::MockBrowserFactory;
    use crate::factory::BrowserFactory;

    fn coordinator(factory: Arc<MockBrowserFactory>) -> BrowserCoordinator {
        BrowserCoordinator::builder()
            .shared_factory(factory as Arc<dyn BrowserFactory>)
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap()
    }

    fn request(html: &str) -> RenderRequest {
        RenderRequest {
            html: html.to_string(),
            pdf_options: None,
        }
    }

    #[tokio::test]
    async fn test_render_pdf_success() {
        let factory = Arc::new(MockBrowserFactory::new());
        let coordinator = coordinator(factory.clone());

        let pdf = render_pdf(&coordinator, &request("<h1>Hi</h1>")).await.unwrap();
        assert!(pdf.data.starts_with(b"%PDF-"));
        assert_eq!(pdf.filename, "document.pdf");
        assert!(!coordinator.stats().leased);
    }

    /// Verifies a provider failure maps to a 500 and still releases the session.
    #[tokio::test]
    async fn test_render_failure_maps_to_500() {
        let factory = Arc::new(MockBrowserFactory::new().with_render_error("target crashed"));
        let coordinator = coordinator(factory.clone());

        let err = render_pdf(&coordinator, &request("<p/>")).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "PDF generation failed");
        assert!(!coordinator.stats().leased);
        assert!(coordinator.stats().session_open);
    }

    #[tokio::test]
    async fn test_capacity_rejection_maps_to_429() {
        let factory = Arc::new(MockBrowserFactory::always_fails("HTTP 429 Too Many Requests"));
        let coordinator = coordinator(factory);

        let err = acquire_session(&coordinator).await.unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.retry_after(), Some(60));
    }

    #[tokio::test]
    async fn test_health_reports_stats() {
        let coordinator = coordinator(Arc::new(MockBrowserFactory::new()));
        let health = health(&coordinator);
        assert_eq!(health.status, "healthy");
        assert!(!health.browser.session_open);
    }
}
