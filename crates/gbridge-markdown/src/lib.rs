//! gbridge Markdown - Markdown and rich text document conversion
//!
//! Provides:
//! - A fixed-precedence, per-line markdown classifier
//! - Forward conversion of markdown into ordered document edit requests
//! - Reverse conversion of a fetched document into markdown
//! - A service writing and reading markdown through a document port
//!
//! Only single-attribute lines survive a round trip. A line carrying both a
//! link and bold markers is treated as a link line and loses the bold.
//!
//! ## Modules
//!
//! - [`classify`] - Line classification
//! - [`forward`] - Markdown to [`RichTextOp`](gbridge_core::domain::RichTextOp) requests
//! - [`reverse`] - [`Document`](gbridge_core::domain::Document) to markdown
//! - [`service`] - Envelope-returning write and read operations

pub mod classify;
pub mod forward;
pub mod reverse;
pub mod service;

pub use classify::{classify, LineKind, MarkdownLine};
pub use forward::to_rich_text;
pub use reverse::from_rich_text;
pub use service::MarkdownService;

#[cfg(test)]
pub(crate) mod test_support;
