//! Folder synchronization records
//!
//! A folder sync produces an ordered, append-only [`SyncLogEntry`] list and a
//! final [`SyncStatus`], packaged together as a [`SyncReport`]. Reports are
//! owned by one invocation and never persisted; nested invocations return
//! their own reports which the caller concatenates.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::envelope::Envelope;
use super::newtypes::ItemId;

/// One pending copy of a source file into a destination folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPlan {
    /// File to copy
    pub source_id: ItemId,
    /// Folder receiving the copy
    pub destination_folder_id: ItemId,
    /// Name given to the copy
    pub target_name: String,
}

impl CopyPlan {
    pub fn new(source_id: ItemId, destination_folder_id: ItemId, target_name: impl Into<String>) -> Self {
        Self {
            source_id,
            destination_folder_id,
            target_name: target_name.into(),
        }
    }
}

/// Kind of action recorded in the sync log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    CreatedFolder,
    ReusedFolder,
    Copied,
    Skipped,
    Overwritten,
    Error,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CreatedFolder => "created_folder",
            Self::ReusedFolder => "reused_folder",
            Self::Copied => "copied",
            Self::Skipped => "skipped",
            Self::Overwritten => "overwritten",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// A single human-readable sync log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub action: SyncAction,
    pub message: String,
}

impl SyncLogEntry {
    pub fn created_folder(name: &str, id: &ItemId) -> Self {
        Self {
            action: SyncAction::CreatedFolder,
            message: format!("Created new folder '{name}' with ID: {id}"),
        }
    }

    pub fn reused_folder(name: &str, id: &ItemId) -> Self {
        Self {
            action: SyncAction::ReusedFolder,
            message: format!("Using existing folder '{name}' with ID: {id}"),
        }
    }

    pub fn copied(name: &str, folder_id: &ItemId) -> Self {
        Self {
            action: SyncAction::Copied,
            message: format!("Copied file '{name}' to folder ID {folder_id}"),
        }
    }

    pub fn skipped(name: &str) -> Self {
        Self {
            action: SyncAction::Skipped,
            message: format!("Skipping '{name}': destination is newer or same"),
        }
    }

    pub fn overwritten(name: &str) -> Self {
        Self {
            action: SyncAction::Overwritten,
            message: format!("Overwriting '{name}': source is newer"),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            action: SyncAction::Error,
            message: format!("Error: {message}"),
        }
    }
}

impl std::fmt::Display for SyncLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of one folder sync level (and, after aggregation, of the tree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Error,
}

/// Result of one recursive folder sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub source_folder_id: ItemId,
    /// Destination folder; `None` when the level failed before resolving it
    pub new_folder_id: Option<ItemId>,
    pub log: Vec<SyncLogEntry>,
}

impl SyncReport {
    /// Number of log entries carrying the given action
    pub fn count(&self, action: SyncAction) -> usize {
        self.log.iter().filter(|e| e.action == action).count()
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }

    /// The log rendered one entry per line
    pub fn message(&self) -> String {
        self.log
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Wrap the report in the uniform result envelope
    pub fn into_envelope(self) -> Envelope {
        let meta = json!({
            "source_folder_id": self.source_folder_id,
            "new_folder_id": self.new_folder_id,
        });
        let message = self.message();
        let data = json!({ "records": [meta.clone()], "log": self.log });
        match self.status {
            SyncStatus::Success => Envelope::success(message, meta, data),
            SyncStatus::Error => Envelope::error(message, meta).with_data(data),
        }
    }
}
