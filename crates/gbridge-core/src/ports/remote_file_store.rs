//! Remote file store port (driven/secondary port)
//!
//! A hierarchical store of folders and files addressed by opaque ids.
//! The primary implementation targets Google Drive, but the folder sync
//! engine only ever talks to this trait so it can be driven by an
//! in-memory store in tests.
//!
//! ## Design Notes
//!
//! - Errors are classified as [`RemoteError`] because the sync engine needs
//!   to tell a missing item from any other fault.
//! - Listings are paginated; [`IRemoteFileStore::list_all_children`] drains
//!   every page and is what callers normally want.
//! - Copies are submitted as a batch. Per-item outcomes arrive through a
//!   callback invoked once per plan, in any order, before the batch call
//!   returns.

use serde::{Deserialize, Serialize};

use crate::domain::errors::RemoteError;
use crate::domain::file_item::{FileItem, ItemKind};
use crate::domain::newtypes::ItemId;
use crate::domain::sync_log::CopyPlan;

/// Restricts a child listing
///
/// Trashed items are never listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildFilter {
    /// Exact name match
    pub name: Option<String>,
    /// Only folders or only files
    pub kind: Option<ItemKind>,
}

impl ChildFilter {
    /// Every non-trashed child
    pub fn all() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn of_kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns true if the item passes this filter
    pub fn matches(&self, item: &FileItem) -> bool {
        self.name.as_deref().map_or(true, |n| item.name == n)
            && self.kind.map_or(true, |k| item.kind == k)
    }
}

/// One page of a child listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPage {
    pub items: Vec<FileItem>,
    /// Continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Successful result of one copy in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedFile {
    pub id: ItemId,
    pub name: String,
}

/// Per-item completion callback of [`IRemoteFileStore::submit_copy_batch`]
///
/// Receives the index of the plan in the submitted slice and its outcome.
pub type CopyCallback<'a> = dyn FnMut(usize, Result<CopiedFile, RemoteError>) + Send + 'a;

/// Port trait for remote file store operations
///
/// Implementations must be `Send + Sync` so a store can be shared across
/// tasks behind an `Arc`.
#[async_trait::async_trait]
pub trait IRemoteFileStore: Send + Sync {
    /// Get metadata for a single item
    ///
    /// Returns [`RemoteError::NotFound`] if the id does not exist.
    async fn get_metadata(&self, id: &ItemId) -> Result<FileItem, RemoteError>;

    /// List one page of the children of a folder
    async fn list_children(
        &self,
        parent: &ItemId,
        filter: &ChildFilter,
        page_token: Option<&str>,
    ) -> Result<ChildPage, RemoteError>;

    /// Create a folder and return its id
    async fn create_folder(&self, name: &str, parent: &ItemId) -> Result<ItemId, RemoteError>;

    /// Delete an item permanently
    async fn delete_item(&self, id: &ItemId) -> Result<(), RemoteError>;

    /// Submit copies as a batch
    ///
    /// `on_complete` is called exactly once per plan before this returns.
    /// An `Err` return means the batch as a whole could not be submitted.
    async fn submit_copy_batch(
        &self,
        plans: &[CopyPlan],
        on_complete: &mut CopyCallback<'_>,
    ) -> Result<(), RemoteError>;

    /// List every child matching the filter, following continuation tokens
    async fn list_all_children(
        &self,
        parent: &ItemId,
        filter: &ChildFilter,
    ) -> Result<Vec<FileItem>, RemoteError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_children(parent, filter, page_token.as_deref())
                .await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(items)
    }
}
