//! Axum HTTP pipeline.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | any | `/` and every unmatched path | [`render_handler`] |
//! | GET | `/health` | [`health_handler`] |
//!
//! # Pipeline
//!
//! Each render request walks these stages in order; the first failure
//! ends it:
//!
//! ```text
//! sweep cache → resolve origin → OPTIONS? 204
//!   → method POST? (405) → bearer token (401) → client rate limit (429)
//!   → parse body (400) → cooldown / acquire session (429)
//!   → render (500) → 200 application/pdf
//! ```
//!
//! Every response, failures included, carries the CORS headers for the
//! resolved origin.
//!
//! # Usage
//!
//! ```rust,ignore
//! let state = AppState::new(config, store, factory, Arc::new(SystemClock))?;
//! let app = html2pdf_gateway::integrations::axum::router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
//! ```

use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};

use crate::rate_limit::RateLimitResult;
use crate::service::{self, ErrorResponse, PdfServiceError, RenderRequest};
use crate::state::AppState;

/// Largest request body read, in bytes.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Identifier used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(render_handler))
        .route("/health", get(health_handler))
        .fallback(render_handler)
        .with_state(state)
}

/// Render endpoint. Runs the whole pipeline.
pub async fn render_handler(State(state): State<AppState>, request: Request) -> Response {
    state.janitor.sweep_if_due();

    let origin = state.cors.resolve_from(request.headers());
    let mut response = match run_pipeline(&state, request).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    };

    state.cors.apply(response.headers_mut(), &origin);
    response
}

/// `GET /health`: service status plus browser coordinator snapshot.
pub async fn health_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let origin = state.cors.resolve_from(&headers);
    let mut response = Json(service::health(&state.coordinator)).into_response();
    state.cors.apply(response.headers_mut(), &origin);
    response
}

async fn run_pipeline(state: &AppState, request: Request) -> Result<Response, PdfServiceError> {
    let method = request.method().clone();

    if method == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        state.cors.apply_preflight(response.headers_mut());
        return Ok(response);
    }

    if method != Method::POST {
        log::debug!("Rejected {} request", method);
        return Err(PdfServiceError::MethodNotAllowed);
    }

    state.auth.authenticate(request.headers())?;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identifier(request.headers(), peer);

    let limit = state.limiter.check(&client).await;
    if !limit.allowed {
        let retry_after = limit.retry_after_secs(state.clock.now());
        log::warn!("🚦 Client {} rate limited, retry in {}s", client, retry_after);
        let mut response = error_response(&PdfServiceError::RateLimited { retry_after });
        insert_rate_limit_headers(response.headers_mut(), &limit);
        return Ok(response);
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| PdfServiceError::InvalidRequest(format!("failed to read body: {}", e)))?;
    let render_request = RenderRequest::from_json_bytes(&body)?;

    let pdf = service::render_pdf(&state.coordinator, &render_request).await?;

    let disposition = pdf.content_disposition();
    let mut response = Response::new(Body::from(Bytes::from(pdf.data)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    insert_rate_limit_headers(headers, &limit);

    Ok(response)
}

/// Client key for rate limiting.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address,
/// then [`UNKNOWN_CLIENT`].
///
/// ```rust
/// use axum::http::{HeaderMap, HeaderValue};
/// use html2pdf_gateway::integrations::axum::client_identifier;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
/// assert_eq!(client_identifier(&headers, None), "203.0.113.7");
/// assert_eq!(client_identifier(&HeaderMap::new(), None), "unknown");
/// ```
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// JSON error response with `Retry-After` / `Allow` where applicable.
pub fn error_response(err: &PdfServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(ErrorResponse::from(err))).into_response();
    let headers = response.headers_mut();

    if let Some(secs) = err.retry_after() {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    if matches!(err, PdfServiceError::MethodNotAllowed) {
        headers.insert(header::ALLOW, HeaderValue::from_static("POST"));
    }
    response
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, limit: &RateLimitResult) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(limit.remaining));
    if let Ok(reset) = HeaderValue::from_str(&limit.reset_rfc3339()) {
        headers.insert("x-ratelimit-reset", reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_client_identifier_precedence() {
        let peer = Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 4000));

        let mut headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, peer), "192.0.2.1");

        headers.insert("x-real-ip", HeaderValue::from_static(" 198.51.100.2 "));
        assert_eq!(client_identifier(&headers, peer), "198.51.100.2");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_identifier(&headers, peer), "203.0.113.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 10.0.0.1"));
        assert_eq!(client_identifier(&headers, peer), "198.51.100.2");
    }

    #[test]
    fn test_error_response_headers() {
        let response = error_response(&PdfServiceError::MethodNotAllowed);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");

        let response = error_response(&PdfServiceError::RateLimited { retry_after: 7 });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");

        let response = error_response(&PdfServiceError::InvalidToken);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
