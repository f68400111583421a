//! Google Docs v1 document service

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use gbridge_core::domain::richtext::{Document, RichTextOp};
use gbridge_core::domain::{ItemId, RemoteError};
use gbridge_core::ports::document_service::IDocumentService;

use crate::client::GoogleClient;

#[derive(Serialize)]
struct BatchUpdateRequest<'a> {
    requests: &'a [RichTextOp],
}

/// Docs adapter for the document service port
pub struct DocsClient {
    client: Arc<GoogleClient>,
    base_url: String,
}

impl DocsClient {
    pub fn new(client: Arc<GoogleClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, id: &ItemId) -> String {
        format!("{}/documents/{}", self.base_url, id)
    }
}

#[async_trait::async_trait]
impl IDocumentService for DocsClient {
    #[tracing::instrument(skip(self, ops), fields(doc_id = %document_id, requests = ops.len()))]
    async fn batch_update(&self, document_id: &ItemId, ops: &[RichTextOp]) -> Result<(), RemoteError> {
        let url = format!("{}:batchUpdate", self.document_url(document_id));
        let _: Value = self
            .client
            .post_json(&url, &BatchUpdateRequest { requests: ops })
            .await?;
        debug!("Batch update applied");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(doc_id = %document_id))]
    async fn get_document(&self, document_id: &ItemId) -> Result<Document, RemoteError> {
        Ok(self.client.get_json(&self.document_url(document_id)).await?)
    }
}
