//! Drive commands - list, create and copy folders
//!
//! `copy-folder` runs the recursive folder sync: the source tree is copied
//! under the destination parent, reusing folders that already exist and
//! only replacing files whose source is newer.

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use tracing::info;

use gbridge_core::domain::{Envelope, ItemId};
use gbridge_core::ports::remote_file_store::IRemoteFileStore;
use gbridge_google::drive::{DriveFileStore, ExploreOptions};
use gbridge_sync::FolderSyncEngine;

use super::{parse_item_id, CliContext};
use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum DriveCommand {
    /// List the contents of a folder
    Ls {
        /// Folder id (defaults to My Drive)
        folder: Option<String>,
        /// Only items whose name contains this text
        #[arg(long)]
        query: Option<String>,
        /// Only items of this MIME type (repeatable)
        #[arg(long = "mime")]
        mime_types: Vec<String>,
        /// Only folders
        #[arg(long)]
        folders_only: bool,
        /// Shared drive id to search in
        #[arg(long)]
        shared_drive: Option<String>,
    },
    /// Create a folder
    Mkdir {
        name: String,
        /// Parent folder id (defaults to My Drive)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Copy a folder tree, skipping files that are already up to date
    CopyFolder {
        /// Folder to copy
        source: String,
        /// Folder receiving the copy
        dest_parent: String,
        /// Name of the copy (defaults to the source name)
        #[arg(long)]
        name: Option<String>,
    },
}

fn folder_or_root(folder: Option<&str>) -> Result<ItemId> {
    folder.map_or_else(|| Ok(ItemId::root()), parse_item_id)
}

impl DriveCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let client = ctx.client().await?;
        let store = Arc::new(DriveFileStore::new(client, &ctx.config.api));

        match self {
            DriveCommand::Ls {
                folder,
                query,
                mime_types,
                folders_only,
                shared_drive,
            } => {
                let options = ExploreOptions {
                    name_contains: query.clone(),
                    mime_types: mime_types.clone(),
                    folders_only: *folders_only,
                    shared_drive_id: shared_drive.clone(),
                };
                self.execute_ls(ctx, &store, &folder_or_root(folder.as_deref())?, &options)
                    .await
            }
            DriveCommand::Mkdir { name, parent } => {
                let parent = folder_or_root(parent.as_deref())?;
                let fmt = ctx.formatter();
                let meta = json!({ "name": name, "parent_id": parent });
                let envelope = match store.create_folder(name, &parent).await {
                    Ok(id) => Envelope::success_record(
                        format!("Created folder '{name}' with ID: {id}"),
                        json!({ "name": name, "parent_id": parent, "folder_id": id }),
                    ),
                    Err(e) => Envelope::from_error(e, meta),
                };
                fmt.envelope(&envelope);
                Ok(())
            }
            DriveCommand::CopyFolder {
                source,
                dest_parent,
                name,
            } => {
                let source = parse_item_id(source)?;
                let dest_parent = parse_item_id(dest_parent)?;
                info!(%source, %dest_parent, "Starting folder copy");

                let engine = FolderSyncEngine::new(store);
                let report = engine
                    .sync_folder(&source, &dest_parent, name.as_deref())
                    .await;
                ctx.formatter().envelope(&report.into_envelope());
                Ok(())
            }
        }
    }

    async fn execute_ls(
        &self,
        ctx: &CliContext,
        store: &DriveFileStore,
        folder: &ItemId,
        options: &ExploreOptions,
    ) -> Result<()> {
        let fmt = ctx.formatter();
        let meta = json!({ "folder_id": folder });
        let items = match store.explore_folder(folder, options).await {
            Ok(items) => items,
            Err(e) => {
                fmt.envelope(&Envelope::from_error(e, meta));
                return Ok(());
            }
        };

        if ctx.format == OutputFormat::Json {
            let envelope = Envelope::success(
                format!("Found {} items in folder {folder}", items.len()),
                meta,
                json!({ "records": items }),
            );
            fmt.envelope(&envelope);
            return Ok(());
        }

        fmt.success(&format!("{} items in {folder}", items.len()));
        for item in &items {
            let modified = item
                .modified_time
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            fmt.info(&format!(
                "{:<6} {:<16} {:<34} {}",
                item.kind.to_string(),
                modified,
                item.id.as_str(),
                item.name
            ));
        }
        Ok(())
    }
}
