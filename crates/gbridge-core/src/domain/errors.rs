//! Domain error types
//!
//! Two families live here:
//! - [`DomainError`] for values rejected at construction time (ids, names)
//! - [`RemoteError`], the taxonomy every port reports remote failures in

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote item identifier
    #[error("Invalid item ID: {0}")]
    InvalidItemId(String),

    /// Invalid item or folder name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Failure reported by a remote collaborator (file store, document service)
///
/// Adapters map their transport-specific errors onto these three kinds so
/// that the sync engine and the CLI never need to know which API produced
/// them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network or API error surfaced by the collaborator
    #[error("Remote fault: {0}")]
    RemoteFault(String),

    /// The referenced id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request or the collaborator's answer was malformed
    #[error("Validation fault: {0}")]
    ValidationFault(String),
}

impl RemoteError {
    /// Short machine-friendly label of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteFault(_) => "remote_fault",
            Self::NotFound(_) => "not_found",
            Self::ValidationFault(_) => "validation_fault",
        }
    }
}

impl From<DomainError> for RemoteError {
    fn from(err: DomainError) -> Self {
        Self::ValidationFault(err.to_string())
    }
}
