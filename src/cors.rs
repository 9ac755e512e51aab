//! Access-control headers for browser clients.
//!
//! The gateway answers CORS itself instead of through a middleware layer,
//! because every response, including early failures such as 401 and 429,
//! must carry headers for the resolved origin.
//!
//! # Origin Resolution
//!
//! | Request `Origin` | `Access-Control-Allow-Origin` |
//! |------------------|-------------------------------|
//! | In the allow-list | Echoed back |
//! | Missing or not allowed | First allow-list entry |

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

/// Methods advertised on preflight.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Request headers advertised on preflight.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Preflight cache lifetime in seconds.
pub const PREFLIGHT_MAX_AGE_SECS: u64 = 86_400;

/// Fixed origin allow-list.
///
/// ```rust
/// use html2pdf_gateway::cors::CorsPolicy;
///
/// let policy = CorsPolicy::new(vec![
///     "https://app.example.com".to_string(),
///     "http://localhost:3000".to_string(),
/// ]);
///
/// assert_eq!(policy.resolve(Some("http://localhost:3000")), "http://localhost:3000");
/// assert_eq!(policy.resolve(Some("https://evil.example")), "https://app.example.com");
/// assert_eq!(policy.resolve(None), "https://app.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// Create a policy. The first entry is the fallback origin.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// The allow-list.
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Whether `origin` is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    /// Origin to echo for a request carrying `origin`.
    pub fn resolve(&self, origin: Option<&str>) -> &str {
        let matched = origin.and_then(|o| self.allowed_origins.iter().find(|a| *a == o));
        match (matched, origin) {
            (Some(allowed), _) => allowed.as_str(),
            (None, Some(other)) => {
                log::debug!("Origin {} not allowed, using fallback", other);
                self.fallback()
            }
            (None, None) => self.fallback(),
        }
    }

    /// Origin from the request headers, resolved.
    pub fn resolve_from(&self, headers: &HeaderMap) -> String {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok());
        self.resolve(origin).to_string()
    }

    /// Headers every response carries.
    pub fn apply(&self, headers: &mut HeaderMap, resolved_origin: &str) {
        if let Ok(value) = HeaderValue::from_str(resolved_origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("*"),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }

    /// Extra headers for an `OPTIONS` preflight.
    pub fn apply_preflight(&self, headers: &mut HeaderMap) {
        let entries: [(HeaderName, HeaderValue); 3] = [
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(PREFLIGHT_MAX_AGE_SECS),
            ),
        ];
        for (name, value) in entries {
            headers.insert(name, value);
        }
    }

    fn fallback(&self) -> &str {
        self.allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or("null")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::new(vec![
            "https://app.example.com".to_string(),
            "http://localhost:3000".to_string(),
        ])
    }

    #[test]
    fn test_apply_sets_response_headers() {
        let mut headers = HeaderMap::new();
        policy().apply(&mut headers, "http://localhost:3000");

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_EXPOSE_HEADERS], "*");
        assert_eq!(headers[header::VARY], "Origin");
    }

    #[test]
    fn test_preflight_headers() {
        let mut headers = HeaderMap::new();
        policy().apply_preflight(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn test_resolve_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(policy().resolve_from(&headers), "https://app.example.com");

        headers.insert(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        assert_eq!(policy().resolve_from(&headers), "http://localhost:3000");
    }

    /// Verifies origin matching is exact, with no prefix or case folding.
    #[test]
    fn test_exact_match_only() {
        let p = policy();
        assert!(!p.is_allowed("http://localhost:30000"));
        assert!(!p.is_allowed("HTTPS://APP.EXAMPLE.COM"));
        assert_eq!(p.resolve(Some("http://localhost")), "https://app.example.com");
    }
}
