//! Error types for the conflict resolver

use thiserror::Error;

/// Errors that prevent an overwrite decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// An item carries no modification time, so it cannot be compared
    #[error("missing modification time for '{name}' ({side})")]
    MissingTimestamp { name: String, side: &'static str },
}
