//! Shared types for the PDF rendering endpoint.
//!
//! These types define the API contract of the gateway and are independent
//! of the HTTP framework that serves them.
//!
//! # Overview
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RenderRequest`] | JSON body of `POST /` |
//! | [`PdfOptions`] | Optional print settings |
//! | [`PaperFormat`] | Supported paper sizes |
//! | [`PdfResponse`] | Successful render result |
//! | [`PdfServiceError`] | Failure taxonomy with HTTP status mapping |
//! | [`ErrorResponse`] | JSON error body for API clients |
//! | [`HealthResponse`] | Body of `GET /health` |
//!
//! # Error Handling
//!
//! ```rust
//! use html2pdf_gateway::service::{ErrorResponse, PdfServiceError};
//!
//! let err = PdfServiceError::MissingToken;
//! assert_eq!(err.status_code(), 401);
//!
//! let body = ErrorResponse::from(&err);
//! assert_eq!(body.error, "Unauthorized: Bearer token required");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BrowserError;
use crate::stats::CoordinatorStats;

/// Maximum length of diagnostic detail echoed back to clients.
pub const MAX_DETAILS_LEN: usize = 500;

// ============================================================================
// Request Types
// ============================================================================

/// Supported paper sizes.
///
/// | Format | Width (in) | Height (in) |
/// |--------|-----------|-------------|
/// | `A4` | 8.27 | 11.69 |
/// | `A3` | 11.69 | 16.54 |
/// | `Letter` | 8.5 | 11 |
/// | `Legal` | 8.5 | 14 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaperFormat {
    /// ISO A4 (default).
    #[default]
    A4,
    /// ISO A3.
    A3,
    /// US Letter.
    Letter,
    /// US Legal.
    Legal,
}

impl PaperFormat {
    /// Paper `(width, height)` in inches.
    ///
    /// ```rust
    /// use html2pdf_gateway::service::PaperFormat;
    ///
    /// assert_eq!(PaperFormat::Letter.dimensions_inches(), (8.5, 11.0));
    /// ```
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.69),
            Self::A3 => (11.69, 16.54),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
        }
    }
}

/// Optional print settings carried by a [`RenderRequest`].
///
/// Unset fields fall back to A4 with backgrounds printed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    /// Paper size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PaperFormat>,

    /// Whether CSS backgrounds are printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_background: Option<bool>,
}

impl PdfOptions {
    /// Effective paper size, `A4` when unset.
    pub fn format(&self) -> PaperFormat {
        self.format.unwrap_or_default()
    }

    /// Effective background flag, `true` when unset.
    pub fn print_background(&self) -> bool {
        self.print_background.unwrap_or(true)
    }
}

/// Body of a render request.
///
/// # JSON Shape
///
/// ```json
/// {
///     "html": "<h1>Hello</h1>",
///     "pdfOptions": { "format": "Letter", "printBackground": false }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Document to render. Must contain non-whitespace content.
    pub html: String,

    /// Print settings; defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_options: Option<PdfOptions>,
}

impl RenderRequest {
    /// Parse and validate a raw request body.
    ///
    /// Bodies that are not JSON at all are reported as
    /// [`PdfServiceError::InvalidJson`]; well-formed JSON that does not match
    /// the schema (or carries blank HTML) as
    /// [`PdfServiceError::InvalidRequest`].
    ///
    /// ```rust
    /// use html2pdf_gateway::service::{PdfServiceError, RenderRequest};
    ///
    /// let req = RenderRequest::from_json_bytes(br#"{"html":"<p>x</p>"}"#).unwrap();
    /// assert_eq!(req.options().format().dimensions_inches().0, 8.27);
    ///
    /// let err = RenderRequest::from_json_bytes(b"not json").unwrap_err();
    /// assert!(matches!(err, PdfServiceError::InvalidJson(_)));
    /// ```
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, PdfServiceError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PdfServiceError::InvalidJson(e.to_string()))?;

        let request: RenderRequest = serde_json::from_value(value)
            .map_err(|e| PdfServiceError::InvalidRequest(e.to_string()))?;

        if request.html.trim().is_empty() {
            return Err(PdfServiceError::InvalidRequest(
                "html: must not be empty".to_string(),
            ));
        }

        Ok(request)
    }

    /// Print settings with defaults applied for an absent `pdfOptions`.
    pub fn options(&self) -> PdfOptions {
        self.pdf_options.clone().unwrap_or_default()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// A successfully rendered PDF.
#[derive(Debug, Clone)]
pub struct PdfResponse {
    /// Raw PDF bytes, starting with `%PDF-`.
    pub data: Vec<u8>,

    /// Filename suggested through `Content-Disposition`.
    pub filename: String,
}

impl PdfResponse {
    /// Wrap rendered bytes with the default filename.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: "document.pdf".to_string(),
        }
    }

    /// Value of the `Content-Disposition` header.
    ///
    /// ```rust
    /// use html2pdf_gateway::service::PdfResponse;
    ///
    /// let response = PdfResponse::new(b"%PDF-1.4".to_vec());
    /// assert_eq!(response.content_disposition(), "inline; filename=\"document.pdf\"");
    /// ```
    pub fn content_disposition(&self) -> String {
        format!("inline; filename=\"{}\"", self.filename)
    }

    /// Size of the PDF in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the endpoint responds.
    pub status: String,

    /// Service name identifier.
    pub service: String,

    /// Current browser coordinator state.
    pub browser: CoordinatorStats,
}

impl HealthResponse {
    /// Healthy response carrying a coordinator snapshot.
    pub fn new(browser: CoordinatorStats) -> Self {
        Self {
            status: "healthy".to_string(),
            service: "html2pdf-gateway".to_string(),
            browser,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Every way a render request can fail.
///
/// | Variant | Status | `error` field |
/// |---------|--------|---------------|
/// | `InvalidJson` | 400 | `Invalid JSON format` |
/// | `InvalidRequest` | 400 | `Invalid request` |
/// | `MissingToken` | 401 | `Unauthorized: Bearer token required` |
/// | `InvalidToken` | 401 | `Unauthorized: Invalid token` |
/// | `MethodNotAllowed` | 405 | `Method not allowed` |
/// | `RateLimited` | 429 | `Too many requests` |
/// | `UpstreamCapacity` | 429 | `Service temporarily unavailable` |
/// | `RenderFailed` | 500 | `PDF generation failed` |
/// | `ShuttingDown` | 500 | `Service shutting down` |
/// | `Internal` | 500 | `Internal server error` |
#[derive(Debug, Clone, thiserror::Error)]
pub enum PdfServiceError {
    /// The body is not JSON.
    #[error("Invalid JSON format")]
    InvalidJson(String),

    /// The body is JSON but violates the request schema.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// No bearer token was presented.
    #[error("Unauthorized: Bearer token required")]
    MissingToken,

    /// The bearer token is not in the accepted set.
    #[error("Unauthorized: Invalid token")]
    InvalidToken,

    /// Anything other than `POST` or `OPTIONS`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The client exhausted its window. `retry_after` is in whole seconds.
    #[error("Too many requests")]
    RateLimited {
        /// Seconds until the window ends, at least 1.
        retry_after: u64,
    },

    /// The upstream browser provider is cooling down.
    #[error("Service temporarily unavailable")]
    UpstreamCapacity {
        /// Seconds of cooldown remaining, at least 1.
        retry_after: u64,
        /// Diagnostic text from the coordinator.
        details: String,
    },

    /// Rendering failed or timed out.
    #[error("PDF generation failed")]
    RenderFailed(String),

    /// The coordinator has been shut down.
    #[error("Service shutting down")]
    ShuttingDown,

    /// Unexpected failure inside the gateway.
    #[error("Internal server error")]
    Internal(String),
}

impl PdfServiceError {
    /// HTTP status code for this error.
    ///
    /// ```rust
    /// use html2pdf_gateway::service::PdfServiceError;
    ///
    /// assert_eq!(PdfServiceError::InvalidJson("eof".into()).status_code(), 400);
    /// assert_eq!(PdfServiceError::RateLimited { retry_after: 3 }.status_code(), 429);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidJson(_) | Self::InvalidRequest(_) => 400,
            Self::MissingToken | Self::InvalidToken => 401,
            Self::MethodNotAllowed => 405,
            Self::RateLimited { .. } | Self::UpstreamCapacity { .. } => 429,
            Self::RenderFailed(_) | Self::ShuttingDown | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable identifier, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::UpstreamCapacity { .. } => "UPSTREAM_CAPACITY",
            Self::RenderFailed(_) => "RENDER_FAILED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Value for the `Retry-After` header, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } | Self::UpstreamCapacity { retry_after, .. } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }

    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::UpstreamCapacity { .. } | Self::RenderFailed(_)
        )
    }

    fn message(&self) -> Option<String> {
        match self {
            Self::InvalidJson(_) => Some("Request body must be valid JSON".to_string()),
            Self::InvalidRequest(_) => {
                Some("Request body does not match the expected schema".to_string())
            }
            Self::RateLimited { retry_after } => Some(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after
            )),
            Self::UpstreamCapacity { retry_after, .. } => Some(format!(
                "Browser capacity exceeded. Try again in {} seconds.",
                retry_after
            )),
            Self::RenderFailed(_) => Some("Failed to render the document".to_string()),
            Self::ShuttingDown => Some("The service is restarting".to_string()),
            Self::Internal(_) => Some("An unexpected error occurred".to_string()),
            Self::MissingToken | Self::InvalidToken | Self::MethodNotAllowed => None,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::InvalidJson(d)
            | Self::InvalidRequest(d)
            | Self::RenderFailed(d)
            | Self::Internal(d)
            | Self::UpstreamCapacity { details: d, .. } => Some(truncate_details(d)),
            _ => None,
        }
    }
}

impl From<BrowserError> for PdfServiceError {
    fn from(err: BrowserError) -> Self {
        match &err {
            BrowserError::UpstreamCapacity { retry_after } => Self::UpstreamCapacity {
                retry_after: ceil_secs(*retry_after),
                details: err.to_string(),
            },
            BrowserError::ShuttingDown => Self::ShuttingDown,
            BrowserError::Configuration(msg) => Self::Internal(msg.clone()),
            _ => Self::RenderFailed(err.to_string()),
        }
    }
}

/// Whole seconds, rounded up, never below 1.
pub(crate) fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

/// Cut diagnostic text to [`MAX_DETAILS_LEN`] characters.
pub(crate) fn truncate_details(details: &str) -> String {
    if details.chars().count() <= MAX_DETAILS_LEN {
        details.to_string()
    } else {
        details.chars().take(MAX_DETAILS_LEN).collect()
    }
}

/// JSON error body.
///
/// Optional fields are omitted when empty:
///
/// ```json
/// { "error": "Too many requests", "message": "Rate limit exceeded. Try again in 12 seconds.", "retryAfter": 12 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Short error title.
    pub error: String,

    /// Human-readable explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Truncated diagnostic detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Seconds until a retry may succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<&PdfServiceError> for ErrorResponse {
    fn from(err: &PdfServiceError) -> Self {
        Self {
            error: err.to_string(),
            message: err.message(),
            details: err.details(),
            retry_after: err.retry_after(),
        }
    }
}

impl From<PdfServiceError> for ErrorResponse {
    fn from(err: PdfServiceError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request_defaults() {
        let req = RenderRequest::from_json_bytes(br#"{"html":"<h1>Hi</h1>"}"#).unwrap();
        assert!(req.pdf_options.is_none());

        let options = req.options();
        assert_eq!(options.format(), PaperFormat::A4);
        assert!(options.print_background());
    }

    #[test]
    fn test_render_request_custom_options() {
        let req = RenderRequest::from_json_bytes(
            br#"{"html":"<p>x</p>","pdfOptions":{"format":"Legal","printBackground":false}}"#,
        )
        .unwrap();

        let options = req.options();
        assert_eq!(options.format(), PaperFormat::Legal);
        assert!(!options.print_background());
    }

    /// Verifies the split between "not JSON" and "wrong JSON".
    #[test]
    fn test_render_request_parse_errors() {
        let cases: [(&[u8], &str); 6] = [
            (b"not json", "Invalid JSON format"),
            (b"", "Invalid JSON format"),
            (b"{\"html\":", "Invalid JSON format"),
            (br#"{"markup":"<p/>"}"#, "Invalid request"),
            (br#"{"html":"   "}"#, "Invalid request"),
            (br#"{"html":"<p/>","pdfOptions":{"format":"A5"}}"#, "Invalid request"),
        ];

        for (body, expected) in cases {
            let err = RenderRequest::from_json_bytes(body).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(
                err.to_string(),
                expected,
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_paper_dimensions() {
        assert_eq!(PaperFormat::A4.dimensions_inches(), (8.27, 11.69));
        assert_eq!(PaperFormat::A3.dimensions_inches(), (11.69, 16.54));
        assert_eq!(PaperFormat::Legal.dimensions_inches(), (8.5, 14.0));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(PdfServiceError::MissingToken.status_code(), 401);
        assert_eq!(PdfServiceError::InvalidToken.status_code(), 401);
        assert_eq!(PdfServiceError::MethodNotAllowed.status_code(), 405);
        assert_eq!(
            PdfServiceError::UpstreamCapacity {
                retry_after: 60,
                details: String::new()
            }
            .status_code(),
            429
        );
        assert_eq!(PdfServiceError::RenderFailed("x".into()).status_code(), 500);
        assert_eq!(PdfServiceError::ShuttingDown.status_code(), 500);
    }

    #[test]
    fn test_error_retryable() {
        assert!(PdfServiceError::RateLimited { retry_after: 1 }.is_retryable());
        assert!(PdfServiceError::RenderFailed("x".into()).is_retryable());
        assert!(!PdfServiceError::InvalidToken.is_retryable());
        assert!(!PdfServiceError::InvalidJson("x".into()).is_retryable());
    }

    #[test]
    fn test_error_response_bodies() {
        let body = ErrorResponse::from(PdfServiceError::MissingToken);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Unauthorized: Bearer token required"})
        );

        let body = ErrorResponse::from(PdfServiceError::RateLimited { retry_after: 7 });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Too many requests");
        assert_eq!(json["retryAfter"], 7);
        assert!(json.get("details").is_none());

        let body = ErrorResponse::from(PdfServiceError::UpstreamCapacity {
            retry_after: 42,
            details: "cooldown".into(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["retryAfter"], 42);
        assert_eq!(json["details"], "cooldown");
        assert!(json["message"].as_str().unwrap().contains("42"));
    }

    #[test]
    fn test_details_truncated() {
        let long = "é".repeat(MAX_DETAILS_LEN + 100);
        let body = ErrorResponse::from(PdfServiceError::RenderFailed(long));
        assert_eq!(body.details.unwrap().chars().count(), MAX_DETAILS_LEN);
    }

    #[test]
    fn test_from_browser_error() {
        let err: PdfServiceError = BrowserError::UpstreamCapacity {
            retry_after: Duration::from_millis(59_200),
        }
        .into();
        assert_eq!(err.retry_after(), Some(60));

        let err: PdfServiceError = BrowserError::RenderTimeout(Duration::from_secs(30)).into();
        assert!(matches!(err, PdfServiceError::RenderFailed(ref d) if d.contains("timed out")));

        let err: PdfServiceError = BrowserError::ShuttingDown.into();
        assert!(matches!(err, PdfServiceError::ShuttingDown));
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::ZERO), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1001)), 2);
        assert_eq!(ceil_secs(Duration::from_secs(60)), 60);
    }

    #[test]
    fn test_pdf_response() {
        let response = PdfResponse::new(vec![0; 1024]);
        assert_eq!(response.size(), 1024);
        assert_eq!(response.filename, "document.pdf");
    }
}
