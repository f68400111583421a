//! Domain entities and business logic
//!
//! This module contains the core domain types for gbridge:
//! - Newtypes for validated remote identifiers
//! - Remote file store items
//! - Folder sync plans, log entries and reports
//! - Rich text edit requests and the fetched document model
//! - The uniform result envelope
//! - Domain-specific error types

pub mod envelope;
pub mod errors;
pub mod file_item;
pub mod newtypes;
pub mod richtext;
pub mod sync_log;

// Re-export commonly used types
pub use envelope::{Envelope, EnvelopeResponse, EnvelopeStatus};
pub use errors::{DomainError, RemoteError};
pub use file_item::{FileItem, ItemKind, DOCUMENT_MIME_TYPE, FOLDER_MIME_TYPE};
pub use newtypes::ItemId;
pub use richtext::{Document, Paragraph, Range, RichTextOp, TextRun, TextStyle};
pub use sync_log::{CopyPlan, SyncAction, SyncLogEntry, SyncReport, SyncStatus};
