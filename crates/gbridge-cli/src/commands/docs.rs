//! Docs commands - create documents and move markdown in and out

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::json;
use tokio::io::AsyncReadExt;

use gbridge_core::domain::Envelope;
use gbridge_google::docs::DocsClient;
use gbridge_google::drive::DriveFileStore;
use gbridge_markdown::MarkdownService;

use super::{parse_item_id, CliContext};
use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// Create an empty document
    Create {
        title: String,
        /// Folder id to create the document in
        #[arg(long)]
        parent: Option<String>,
    },
    /// Append markdown to a document
    Write {
        doc_id: String,
        /// Markdown file to read (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a document as markdown
    Read { doc_id: String },
}

async fn read_markdown_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read markdown from stdin")?;
            Ok(text)
        }
    }
}

impl DocsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let client = ctx.client().await?;

        match self {
            DocsCommand::Create { title, parent } => {
                let parent = parent.as_deref().map(parse_item_id).transpose()?;
                let store = DriveFileStore::new(client, &ctx.config.api);
                let envelope = match store.create_document(title, parent.as_ref()).await {
                    Ok(doc) => Envelope::success_record(
                        format!("Created document '{title}' with ID: {}", doc.id),
                        json!({
                            "doc_id": doc.id,
                            "title": title,
                            "web_view_link": doc.web_view_link,
                        }),
                    ),
                    Err(e) => Envelope::from_error(e, json!({ "title": title })),
                };
                fmt.envelope(&envelope);
            }
            DocsCommand::Write { doc_id, file } => {
                let doc_id = parse_item_id(doc_id)?;
                let markdown = read_markdown_input(file.as_ref()).await?;
                let service = MarkdownService::new(Arc::new(DocsClient::new(
                    client,
                    ctx.config.api.docs_base_url.clone(),
                )));
                fmt.envelope(&service.write_markdown(&doc_id, &markdown).await);
            }
            DocsCommand::Read { doc_id } => {
                let doc_id = parse_item_id(doc_id)?;
                let service = MarkdownService::new(Arc::new(DocsClient::new(
                    client,
                    ctx.config.api.docs_base_url.clone(),
                )));
                let envelope = service.read_markdown(&doc_id).await;
                match (ctx.format, envelope.response.data.as_str()) {
                    (OutputFormat::Human, Some(markdown)) if envelope.is_success() => {
                        println!("{markdown}");
                    }
                    _ => fmt.envelope(&envelope),
                }
            }
        }
        Ok(())
    }
}
