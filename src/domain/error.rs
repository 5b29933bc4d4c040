//! Domain error types for CaseForge.
//!
//! These errors represent failures of pipeline operations. Local failures
//! (validation, lookup) never reach the network; remote failures carry the
//! user-visible message extracted from the service response.

use thiserror::Error;

/// Errors raised by pipeline controller operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A local precondition failed; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The referenced issue is not present in the local store.
    #[error("Issue not found: {0}")]
    NotFound(String),

    /// The remote service failed or returned a malformed payload.
    #[error("{0}")]
    Remote(String),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}
