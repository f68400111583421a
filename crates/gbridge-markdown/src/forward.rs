//! Markdown to document edit requests
//!
//! Each line becomes one `insertText` request followed by at most two
//! `updateTextStyle` requests over the text it inserted. The insertion
//! cursor starts at the first body index and advances by the length of
//! every inserted string, so after line *i* it sits exactly at the end of
//! that line's text.

use tracing::debug;

use gbridge_core::domain::richtext::{Range, RichTextOp};

use crate::classify::{classify, link_style};

/// First writable index of a document body
pub const DOCUMENT_START_INDEX: u32 = 1;

/// Length in the document's index unit (UTF-16 code units)
pub fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// Convert markdown into ordered edit requests
///
/// A trailing line break does not produce an extra empty paragraph; blank
/// lines in the middle of the text do.
pub fn to_rich_text(text: &str) -> Vec<RichTextOp> {
    let mut ops = Vec::new();
    let mut cursor = DOCUMENT_START_INDEX;

    for raw in text.lines() {
        let line = classify(raw);
        let mut content = line.content.clone();
        content.push('\n');

        let start = cursor;
        let len = utf16_len(&content);
        let range = Range::new(start, start + len);

        ops.push(RichTextOp::insert_text(start, content));
        if let Some(style) = line.style() {
            ops.push(RichTextOp::update_style(range.clone(), style));
        }
        if let Some(url) = line.link() {
            ops.push(RichTextOp::update_style(range, link_style(url)));
        }

        cursor = start + len;
    }

    debug!(requests = ops.len(), end_index = cursor, "Converted markdown");
    ops
}
