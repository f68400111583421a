//! Remote file store items
//!
//! [`FileItem`] is the observed state of one node in the remote store. The
//! store owns the canonical copy; this crate only reads it and asks for
//! changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::ItemId;

/// MIME type the file store uses to mark folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of native documents
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Whether an item is a folder or a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Folder,
    File,
}

impl ItemKind {
    /// Derive the kind from a remote MIME type
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            Self::Folder
        } else {
            Self::File
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::File => write!(f, "file"),
        }
    }
}

/// One node of the remote hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Stable identifier, unique within the store
    pub id: ItemId,
    /// Display name; siblings may share it
    pub name: String,
    /// Folder or file
    pub kind: ItemKind,
    /// Raw MIME type as reported by the store
    pub mime_type: String,
    /// Last modification; absent when the listing did not request it
    pub modified_time: Option<DateTime<Utc>>,
    /// Parent folders (a store may allow several)
    pub parent_ids: Vec<ItemId>,
    /// Browser link, when the store provides one
    pub web_view_link: Option<String>,
}

impl FileItem {
    /// Returns true if this item is a folder
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}
