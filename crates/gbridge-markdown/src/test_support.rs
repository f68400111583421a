//! A minimal document model that applies edit requests, for round-trip tests
//!
//! Supports inserts that extend the body and style updates covering whole
//! paragraphs, which is all the forward converter emits.
//!
//! A bold paragraph at 24pt or 18pt is turned into a HEADING_1 or HEADING_2
//! paragraph with an unstyled run. This is a test convention so heading
//! lines survive a write/read cycle. The real editor does not do this:
//! `updateTextStyle` never changes a paragraph's `namedStyleType`.

use gbridge_core::domain::richtext::{
    Body, Document, Paragraph, ParagraphElement, ParagraphStyle, RichTextOp, StructuralElement,
    TextRun, TextStyle,
};

use crate::classify::{HEADING_1_SIZE_PT, HEADING_2_SIZE_PT};
use crate::forward::{utf16_len, DOCUMENT_START_INDEX};

struct Span {
    start: u32,
    end: u32,
    text: String,
    style: TextStyle,
}

fn merge(into: &mut TextStyle, from: &TextStyle) {
    if from.bold.is_some() {
        into.bold = from.bold;
    }
    if from.italic.is_some() {
        into.italic = from.italic;
    }
    if from.underline.is_some() {
        into.underline = from.underline;
    }
    if from.font_size.is_some() {
        into.font_size = from.font_size.clone();
    }
    if from.link.is_some() {
        into.link = from.link.clone();
    }
    if from.foreground_color.is_some() {
        into.foreground_color = from.foreground_color.clone();
    }
}

pub(crate) fn apply_ops(ops: &[RichTextOp]) -> Document {
    let mut spans: Vec<Span> = Vec::new();
    let mut end = DOCUMENT_START_INDEX;

    for op in ops {
        match op {
            RichTextOp::InsertText(insert) => {
                assert_eq!(insert.location.index, end, "inserts must append");
                let len = utf16_len(&insert.text);
                spans.push(Span {
                    start: end,
                    end: end + len,
                    text: insert.text.clone(),
                    style: TextStyle::default(),
                });
                end += len;
            }
            RichTextOp::UpdateTextStyle(update) => {
                let span = spans
                    .iter_mut()
                    .find(|s| s.start == update.range.start_index && s.end == update.range.end_index)
                    .expect("style range must match an inserted paragraph");
                merge(&mut span.style, &update.text_style);
            }
        }
    }

    let content = spans
        .into_iter()
        .map(|span| {
            let size = span.style.font_size.as_ref().map(|d| d.magnitude);
            let heading = match (span.style.is_bold(), size) {
                (true, Some(s)) if s == HEADING_1_SIZE_PT => Some("HEADING_1"),
                (true, Some(s)) if s == HEADING_2_SIZE_PT => Some("HEADING_2"),
                _ => None,
            };
            let (named, style) = match heading {
                Some(name) => (name, TextStyle::default()),
                None => ("NORMAL_TEXT", span.style),
            };
            StructuralElement {
                paragraph: Some(Paragraph {
                    elements: vec![ParagraphElement {
                        text_run: Some(TextRun {
                            content: span.text,
                            text_style: style,
                        }),
                    }],
                    paragraph_style: Some(ParagraphStyle {
                        named_style_type: Some(named.to_string()),
                    }),
                    bullet: None,
                }),
            }
        })
        .collect();

    Document {
        document_id: None,
        title: None,
        body: Body { content },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbridge_core::domain::richtext::{Dimension, Range};

    fn heading_style(size: f64) -> TextStyle {
        TextStyle {
            bold: Some(true),
            font_size: Some(Dimension::points(size)),
            ..Default::default()
        }
    }

    fn heading_levels(doc: &Document) -> Vec<Option<u8>> {
        doc.paragraphs().map(Paragraph::heading_level).collect()
    }

    #[test]
    fn test_heading_sizes_become_heading_levels() {
        let doc = apply_ops(&[
            RichTextOp::insert_text(1, "Title\n"),
            RichTextOp::update_style(Range::new(1, 7), heading_style(HEADING_1_SIZE_PT)),
            RichTextOp::insert_text(7, "Sub\n"),
            RichTextOp::update_style(Range::new(7, 11), heading_style(HEADING_2_SIZE_PT)),
        ]);

        assert_eq!(heading_levels(&doc), vec![Some(1), Some(2)]);
        assert!(doc
            .paragraphs()
            .flat_map(Paragraph::text_runs)
            .all(|run| run.text_style.is_empty()));
    }

    #[test]
    fn test_other_sizes_keep_their_run_style() {
        let doc = apply_ops(&[
            RichTextOp::insert_text(1, "Big\n"),
            RichTextOp::update_style(Range::new(1, 5), heading_style(30.0)),
        ]);

        assert_eq!(heading_levels(&doc), vec![None]);
        let run = doc.paragraphs().flat_map(Paragraph::text_runs).next().unwrap();
        assert!(run.text_style.is_bold());
    }
}
