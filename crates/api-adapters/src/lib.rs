//! # api-adapters
//!
//! Transport adapters. `web-axum` exposes the JSON API over axum: routing,
//! bearer-token and body extraction, stack-safe encoding of comment threads,
//! and the mapping from [`domains::DomainError`] to HTTP status codes.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod json;
#[cfg(feature = "web-axum")]
pub mod router;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use extract::{ApiJson, CurrentUser};
#[cfg(feature = "web-axum")]
pub use router::{build_router, AppState};
