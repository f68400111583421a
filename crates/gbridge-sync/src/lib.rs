//! gbridge Sync - Recursive folder synchronization
//!
//! Provides:
//! - Depth-first copy of a remote folder tree into another parent folder
//! - Reuse of same-named destination folders
//! - Timestamp-based overwrite or skip of existing files
//! - One batched copy request per folder level
//!
//! ## Modules
//!
//! - [`engine`] - The [`FolderSyncEngine`] and its per-level algorithm

pub mod engine;

pub use engine::FolderSyncEngine;

use thiserror::Error;

use gbridge_core::domain::errors::RemoteError;

/// Faults that abort one folder level
///
/// These never escape [`FolderSyncEngine::sync_folder`]; they are rendered
/// into the level's log as an error entry.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed
    #[error("{operation}: {source}")]
    Remote {
        operation: String,
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    pub(crate) fn remote(operation: impl Into<String>) -> impl FnOnce(RemoteError) -> Self {
        let operation = operation.into();
        move |source| Self::Remote { operation, source }
    }
}
