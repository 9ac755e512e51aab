//! PDF rendering service.
//!
//! This module provides the **framework-agnostic core** of the gateway: the
//! request and response types, the error taxonomy with its HTTP mapping,
//! and the render orchestration on top of the
//! [`BrowserCoordinator`](crate::BrowserCoordinator).
//!
//! # Module Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  service module (this module)                 │
//! │                                                               │
//! │  ┌─────────────────────────┐  ┌─────────────────────────────┐ │
//! │  │       types.rs          │  │          pdf.rs             │ │
//! │  │  RenderRequest          │  │  acquire_session()          │ │
//! │  │  PdfOptions/PaperFormat │  │  render_with_lease()        │ │
//! │  │  PdfResponse            │  │  render_pdf()               │ │
//! │  │  PdfServiceError        │  │  health()                   │ │
//! │  │  ErrorResponse          │  │                             │ │
//! │  │  HealthResponse         │  │                             │ │
//! │  └─────────────────────────┘  └─────────────────────────────┘ │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │ used by
//!                                 ▼
//!                    integrations::axum (HTTP pipeline)
//! ```
//!
//! # Design
//!
//! "Thin handler, thick service":
//!
//! | Layer | Responsibility | This Module? |
//! |-------|----------------|--------------|
//! | **Service** | Validation, session lease, rendering, error taxonomy | ✅ Yes |
//! | **Handler** | Auth, CORS, rate limiting, HTTP mapping | ❌ No (integrations) |
//!
//! # Direct Usage (Non-HTTP)
//!
//! ```rust,ignore
//! use html2pdf_gateway::service::{render_pdf, RenderRequest};
//!
//! let request = RenderRequest::from_json_bytes(br#"{"html":"<h1>Report</h1>"}"#)?;
//! let pdf = render_pdf(&coordinator, &request).await?;
//! std::fs::write("report.pdf", &pdf.data)?;
//! ```
//!
//! # Error Handling
//!
//! ```rust
//! use html2pdf_gateway::service::{ErrorResponse, PdfServiceError};
//!
//! let error = PdfServiceError::RateLimited { retry_after: 12 };
//! assert_eq!(error.status_code(), 429);
//! assert_eq!(error.retry_after(), Some(12));
//!
//! let body = ErrorResponse::from(&error);
//! assert_eq!(body.retry_after, Some(12));
//! ```

mod pdf;
pub(crate) mod types;

// ============================================================================
// Re-exports: Types
// ============================================================================

pub use types::ErrorResponse;
pub use types::HealthResponse;
pub use types::MAX_DETAILS_LEN;
pub use types::PaperFormat;
pub use types::PdfOptions;
pub use types::PdfResponse;
pub use types::PdfServiceError;
pub use types::RenderRequest;

// ============================================================================
// Re-exports: Functions
// ============================================================================

pub use pdf::acquire_session;
pub use pdf::health;
pub use pdf::render_pdf;
pub use pdf::render_with_lease;
