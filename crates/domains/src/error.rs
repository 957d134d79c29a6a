//! # DomainError
//!
//! Centralized error handling for the gatepost ecosystem.
//! Every service and identity operation reports one of these outcomes;
//! transport adapters translate them into protocol responses.

use thiserror::Error;

/// The primary error type for all service-layer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Entity absent, or (for posts) present but invisible to the caller.
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Role or ownership check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A comment referenced a post or parent that does not exist, or a
    /// parent belonging to another post.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Missing required field, title too long, malformed registration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Identity claims missing, unparseable or expired.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unknown username or wrong password; the two are not distinguished.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure. The detail is logged, never shown to callers.
    #[error("internal store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        DomainError::NotFound(entity.to_string(), id.to_string())
    }
}

/// A specialized Result type for gatepost logic.
pub type Result<T> = std::result::Result<T, DomainError>;
