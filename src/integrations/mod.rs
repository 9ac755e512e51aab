//! Web framework integrations.
//!
//! | Framework | Module |
//! |-----------|--------|
//! | Axum | [`axum`] |
//!
//! The integration owns everything HTTP-specific (CORS, auth, client
//! identification, status mapping) and delegates rendering to
//! [`crate::service`].

pub mod axum;
