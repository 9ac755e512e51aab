//! Bearer-token authentication.

use std::collections::HashSet;

use axum::http::{HeaderMap, header};

use crate::service::PdfServiceError;

/// Accepts requests whose `Authorization: Bearer <token>` is in a fixed set.
///
/// ```rust
/// use axum::http::{HeaderMap, HeaderValue, header};
/// use html2pdf_gateway::auth::TokenAuthenticator;
///
/// let auth = TokenAuthenticator::new(vec!["s3cret".to_string()]);
///
/// let mut headers = HeaderMap::new();
/// assert!(auth.authenticate(&headers).is_err());
///
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
/// assert!(auth.authenticate(&headers).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    tokens: HashSet<String>,
}

impl TokenAuthenticator {
    /// Accept any of `tokens`. Blank entries are ignored.
    pub fn new(tokens: Vec<String>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tokens }
    }

    /// Number of accepted tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Check the request headers.
    ///
    /// Returns the accepted token.
    ///
    /// # Errors
    ///
    /// - [`PdfServiceError::MissingToken`] without a bearer `Authorization` header
    /// - [`PdfServiceError::InvalidToken`] for an unknown token
    pub fn authenticate<'a>(&self, headers: &'a HeaderMap) -> Result<&'a str, PdfServiceError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(PdfServiceError::MissingToken)?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(PdfServiceError::MissingToken)?;

        if self.tokens.contains(token) {
            Ok(token)
        } else {
            log::warn!("🔒 Rejected request with unknown bearer token");
            Err(PdfServiceError::InvalidToken)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        let auth = TokenAuthenticator::new(vec!["abc".to_string()]);

        for headers in [HeaderMap::new(), with_auth("Basic abc"), with_auth("Bearer ")] {
            assert!(matches!(
                auth.authenticate(&headers),
                Err(PdfServiceError::MissingToken)
            ));
        }
    }

    #[test]
    fn test_invalid_token() {
        let auth = TokenAuthenticator::new(vec!["abc".to_string()]);
        let err = auth.authenticate(&with_auth("Bearer abd")).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Unauthorized: Invalid token");
    }

    #[test]
    fn test_multiple_tokens() {
        let auth = TokenAuthenticator::new(vec![
            "one".to_string(),
            " ".to_string(),
            "two".to_string(),
        ]);
        assert_eq!(auth.token_count(), 2);
        assert_eq!(auth.authenticate(&with_auth("Bearer two")).unwrap(), "two");
    }
}
