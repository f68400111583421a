//! Markdown write and read against a document service
//!
//! Both operations report through the uniform [`Envelope`]; remote faults
//! become error envelopes instead of errors.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use gbridge_core::domain::{Envelope, ItemId};
use gbridge_core::ports::document_service::IDocumentService;

use crate::forward::to_rich_text;
use crate::reverse::from_rich_text;

pub struct MarkdownService {
    docs: Arc<dyn IDocumentService>,
}

impl MarkdownService {
    pub fn new(docs: Arc<dyn IDocumentService>) -> Self {
        Self { docs }
    }

    /// Insert `markdown` at the start of a document's body
    #[tracing::instrument(skip(self, markdown), fields(doc_id = %document_id, bytes = markdown.len()))]
    pub async fn write_markdown(&self, document_id: &ItemId, markdown: &str) -> Envelope {
        let meta = json!({ "doc_id": document_id });
        let ops = to_rich_text(markdown);
        if ops.is_empty() {
            return Envelope::skipped(
                format!("No markdown content to write into Doc ID: {document_id}"),
                meta,
            );
        }

        match self.docs.batch_update(document_id, &ops).await {
            Ok(()) => {
                info!(requests = ops.len(), "Markdown written");
                Envelope::success_record(
                    format!("Markdown content written into Doc ID: {document_id}"),
                    meta,
                )
            }
            Err(err) => {
                warn!(error = %err, "Markdown write failed");
                Envelope::from_error(err, meta)
            }
        }
    }

    /// Render the current content of a document as markdown
    #[tracing::instrument(skip(self), fields(doc_id = %document_id))]
    pub async fn read_markdown(&self, document_id: &ItemId) -> Envelope {
        let meta = json!({ "doc_id": document_id });
        match self.docs.get_document(document_id).await {
            Ok(document) => {
                let markdown = from_rich_text(&document);
                Envelope::success(
                    format!("Document with id {document_id} markdown returned."),
                    meta,
                    Value::String(markdown),
                )
            }
            Err(err) => {
                warn!(error = %err, "Markdown read failed");
                Envelope::from_error(err, meta).with_data(Value::String(String::new()))
            }
        }
    }
}
