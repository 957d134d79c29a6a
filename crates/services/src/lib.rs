//! # services
//!
//! Orchestration of the domain: every operation takes the requesting
//! [`Identity`](domains::Identity), applies the pure policies from
//! `domains::policy`, and delegates persistence to the port traits.

pub mod comments;
pub mod content;
mod render;

pub use comments::CommentService;
pub use content::ContentService;

use domains::DomainError;

/// Converts a store failure into the generic outcome callers see, logging the
/// detail here since it never leaves the process.
pub(crate) fn store_fault(operation: &'static str) -> impl FnOnce(anyhow::Error) -> DomainError {
    move |err| {
        tracing::error!(operation, error = %format!("{err:#}"), "store failure");
        DomainError::Store(operation.to_string())
    }
}
