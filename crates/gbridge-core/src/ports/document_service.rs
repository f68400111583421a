//! Document service port (driven/secondary port)
//!
//! Applies ordered edit requests to a rich text document and fetches a
//! document's content. The markdown codec produces and consumes the types
//! exchanged here and never sees the transport.

use crate::domain::errors::RemoteError;
use crate::domain::newtypes::ItemId;
use crate::domain::richtext::{Document, RichTextOp};

#[async_trait::async_trait]
pub trait IDocumentService: Send + Sync {
    /// Apply `ops` atomically and in order
    async fn batch_update(&self, document_id: &ItemId, ops: &[RichTextOp]) -> Result<(), RemoteError>;

    /// Fetch the current content of a document
    async fn get_document(&self, document_id: &ItemId) -> Result<Document, RemoteError>;
}
