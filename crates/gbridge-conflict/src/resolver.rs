//! Overwrite decision
//!
//! When a file with the same name already exists in the destination folder
//! the sync engine asks the resolver whether to replace it. The rule is
//! "newer source wins": the destination is kept unless the source was
//! modified strictly later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use gbridge_core::domain::FileItem;

use crate::error::ConflictError;

/// What to do with an existing destination file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Delete the destination and copy the source over it
    Overwrite,
    /// Keep the destination as is
    Skip,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Decides between overwriting and skipping from modification times
///
/// Stateless; every call is independent of previous calls.
pub struct ConflictResolver;

impl ConflictResolver {
    /// `Skip` iff the destination is at least as recent as the source
    pub fn decide(source_modified: DateTime<Utc>, dest_modified: DateTime<Utc>) -> Decision {
        if dest_modified >= source_modified {
            Decision::Skip
        } else {
            Decision::Overwrite
        }
    }

    /// Decide for two items, rejecting items without a modification time
    pub fn decide_items(source: &FileItem, dest: &FileItem) -> Result<Decision, ConflictError> {
        let source_modified = source
            .modified_time
            .ok_or_else(|| ConflictError::MissingTimestamp {
                name: source.name.clone(),
                side: "source",
            })?;
        let dest_modified = dest
            .modified_time
            .ok_or_else(|| ConflictError::MissingTimestamp {
                name: dest.name.clone(),
                side: "destination",
            })?;

        let decision = Self::decide(source_modified, dest_modified);
        trace!(
            name = %source.name,
            %source_modified,
            %dest_modified,
            %decision,
            "Overwrite decision"
        );
        Ok(decision)
    }
}
