//! Recursive folder synchronization engine
//!
//! The [`FolderSyncEngine`] copies the tree under a source folder into a
//! destination parent, one folder level at a time.
//!
//! ## Level Flow
//!
//! 1. **Resolve destination**: reuse the first same-named folder under the
//!    destination parent, or create one
//! 2. **Walk children** in listing order: folders recurse immediately
//!    (depth-first, pre-order); files are compared against a same-named
//!    destination item and either skipped, overwritten or queued
//! 3. **Copy**: every queued copy of the level goes out as one batch, and
//!    each per-item result is appended to the log
//!
//! ## Faults
//!
//! A failing remote call aborts the current level: an error entry is
//! logged, the level's status becomes `Error` and the pending batch is
//! dropped. Nothing is rolled back. A failed child level marks its parent
//! as failed too, but the parent keeps processing its remaining children.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use gbridge_conflict::{ConflictResolver, Decision};
use gbridge_core::domain::{
    CopyPlan, FileItem, ItemId, ItemKind, RemoteError, SyncLogEntry, SyncReport, SyncStatus,
};
use gbridge_core::ports::remote_file_store::{ChildFilter, CopiedFile, IRemoteFileStore};

use crate::SyncError;

/// State accumulated while processing one folder level
struct LevelState {
    log: Vec<SyncLogEntry>,
    new_folder_id: Option<ItemId>,
    child_failed: bool,
}

/// Copies a remote folder tree, reusing what already exists
///
/// ## Dependencies
///
/// - `store`: the remote file store both trees live in
pub struct FolderSyncEngine {
    store: Arc<dyn IRemoteFileStore>,
}

impl FolderSyncEngine {
    pub fn new(store: Arc<dyn IRemoteFileStore>) -> Self {
        Self { store }
    }

    /// Copy `source_folder_id` into `destination_parent_id`
    ///
    /// The copy is named `desired_name`, or after the source folder when
    /// `None`. Never fails: faults are reported through the returned
    /// report's status and log.
    #[tracing::instrument(skip(self), fields(source = %source_folder_id, parent = %destination_parent_id))]
    pub async fn sync_folder(
        &self,
        source_folder_id: &ItemId,
        destination_parent_id: &ItemId,
        desired_name: Option<&str>,
    ) -> SyncReport {
        let report = self
            .sync_level(source_folder_id, destination_parent_id, desired_name)
            .await;
        info!(
            status = ?report.status,
            entries = report.log.len(),
            new_folder_id = ?report.new_folder_id,
            "Folder sync finished"
        );
        report
    }

    /// One folder level, boxed so it can recurse
    fn sync_level<'a>(
        &'a self,
        source_folder_id: &'a ItemId,
        destination_parent_id: &'a ItemId,
        desired_name: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = SyncReport> + Send + 'a>> {
        Box::pin(async move {
            let mut state = LevelState {
                log: Vec::new(),
                new_folder_id: None,
                child_failed: false,
            };

            let outcome = self
                .run_level(source_folder_id, destination_parent_id, desired_name, &mut state)
                .await;

            let status = match outcome {
                Ok(()) if !state.child_failed => SyncStatus::Success,
                Ok(()) => SyncStatus::Error,
                Err(err) => {
                    warn!(source = %source_folder_id, error = %err, "Folder level aborted");
                    state.log.push(SyncLogEntry::error(&err));
                    SyncStatus::Error
                }
            };

            SyncReport {
                status,
                source_folder_id: source_folder_id.clone(),
                new_folder_id: state.new_folder_id,
                log: state.log,
            }
        })
    }

    async fn run_level(
        &self,
        source_folder_id: &ItemId,
        destination_parent_id: &ItemId,
        desired_name: Option<&str>,
        state: &mut LevelState,
    ) -> Result<(), SyncError> {
        let name = match desired_name {
            Some(name) => name.to_string(),
            None => {
                self.store
                    .get_metadata(source_folder_id)
                    .await
                    .map_err(SyncError::remote(format!(
                        "retrieving metadata of folder {source_folder_id}"
                    )))?
                    .name
            }
        };

        let folder_id = self
            .resolve_destination(&name, destination_parent_id, state)
            .await?;

        let children = self
            .store
            .list_all_children(source_folder_id, &ChildFilter::all())
            .await
            .map_err(SyncError::remote(format!(
                "listing children of folder {source_folder_id}"
            )))?;
        debug!(folder = %name, children = children.len(), "Listed source folder");

        let mut plans = Vec::new();
        for child in &children {
            match child.kind {
                ItemKind::Folder => {
                    let child_report = self
                        .sync_level(&child.id, &folder_id, Some(child.name.as_str()))
                        .await;
                    if !child_report.is_success() {
                        state.child_failed = true;
                    }
                    state.log.extend(child_report.log);
                }
                ItemKind::File => {
                    if let Some(plan) = self.plan_file(child, &folder_id, state).await? {
                        plans.push(plan);
                    }
                }
            }
        }

        if !plans.is_empty() {
            self.copy_batch(&plans, &folder_id, state).await?;
        }

        Ok(())
    }

    /// Reuse the first same-named destination folder or create one
    async fn resolve_destination(
        &self,
        name: &str,
        destination_parent_id: &ItemId,
        state: &mut LevelState,
    ) -> Result<ItemId, SyncError> {
        let filter = ChildFilter::all().named(name).of_kind(ItemKind::Folder);
        let existing = self
            .store
            .list_all_children(destination_parent_id, &filter)
            .await
            .map_err(SyncError::remote(format!(
                "looking up folder '{name}' in {destination_parent_id}"
            )))?;

        let folder_id = match existing.into_iter().next() {
            Some(folder) => {
                debug!(folder = %name, id = %folder.id, "Reusing destination folder");
                state.log.push(SyncLogEntry::reused_folder(name, &folder.id));
                folder.id
            }
            None => {
                let id = self
                    .store
                    .create_folder(name, destination_parent_id)
                    .await
                    .map_err(SyncError::remote(format!("creating folder '{name}'")))?;
                info!(folder = %name, %id, "Created destination folder");
                state.log.push(SyncLogEntry::created_folder(name, &id));
                id
            }
        };

        state.new_folder_id = Some(folder_id.clone());
        Ok(folder_id)
    }

    /// Decide what to do with one source file
    ///
    /// Returns the copy to queue, if any. An existing destination file that
    /// loses to a newer source is deleted before this returns.
    async fn plan_file(
        &self,
        source: &FileItem,
        folder_id: &ItemId,
        state: &mut LevelState,
    ) -> Result<Option<CopyPlan>, SyncError> {
        let filter = ChildFilter::all().named(source.name.as_str());
        let existing = self
            .store
            .list_all_children(folder_id, &filter)
            .await
            .map_err(SyncError::remote(format!(
                "looking up '{}' in {folder_id}",
                source.name
            )))?;

        let Some(dest) = existing.into_iter().next() else {
            return Ok(Some(CopyPlan::new(
                source.id.clone(),
                folder_id.clone(),
                source.name.as_str(),
            )));
        };

        let source_meta = self
            .store
            .get_metadata(&source.id)
            .await
            .map_err(SyncError::remote(format!(
                "retrieving metadata of '{}'",
                source.name
            )))?;

        let decision = match ConflictResolver::decide_items(&source_meta, &dest) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(file = %source.name, error = %err, "Cannot compare file versions");
                state.log.push(SyncLogEntry::error(err));
                return Ok(None);
            }
        };

        match decision {
            Decision::Skip => {
                debug!(file = %source.name, "Destination is up to date");
                state.log.push(SyncLogEntry::skipped(&source.name));
                Ok(None)
            }
            Decision::Overwrite => {
                self.store
                    .delete_item(&dest.id)
                    .await
                    .map_err(SyncError::remote(format!(
                        "deleting outdated '{}'",
                        dest.name
                    )))?;
                state.log.push(SyncLogEntry::overwritten(&source.name));
                Ok(Some(CopyPlan::new(
                    source.id.clone(),
                    folder_id.clone(),
                    source.name.as_str(),
                )))
            }
        }
    }

    /// Submit the level's copies and log every per-item result
    async fn copy_batch(
        &self,
        plans: &[CopyPlan],
        folder_id: &ItemId,
        state: &mut LevelState,
    ) -> Result<(), SyncError> {
        let mut results: Vec<(usize, Result<CopiedFile, RemoteError>)> =
            Vec::with_capacity(plans.len());
        let mut on_complete = |index: usize, result: Result<CopiedFile, RemoteError>| {
            results.push((index, result));
        };

        // Chunked stores may report some items before a later chunk fails
        let submitted = self
            .store
            .submit_copy_batch(plans, &mut on_complete)
            .await
            .map_err(SyncError::remote(format!(
                "submitting {} copies to {folder_id}",
                plans.len()
            )));

        let mut seen = vec![false; plans.len()];
        for (index, result) in results {
            let Some(plan) = plans.get(index) else {
                warn!(index, "Copy result for unknown plan");
                continue;
            };
            seen[index] = true;
            match result {
                Ok(copied) => {
                    debug!(file = %copied.name, id = %copied.id, "Copied file");
                    state
                        .log
                        .push(SyncLogEntry::copied(&copied.name, &plan.destination_folder_id));
                }
                Err(err) => {
                    warn!(file = %plan.target_name, error = %err, "Copy failed");
                    state.log.push(SyncLogEntry::error(format!(
                        "copying '{}': {err}",
                        plan.target_name
                    )));
                }
            }
        }

        for (plan, _) in plans.iter().zip(seen).filter(|(_, seen)| !seen) {
            state.log.push(SyncLogEntry::error(format!(
                "no result reported for copy of '{}'",
                plan.target_name
            )));
        }

        submitted
    }
}
