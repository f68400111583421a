//! Document to markdown
//!
//! Reads paragraphs in order. Level-1 and level-2 headings get `# ` and
//! `## `, bullets get `- `. Each text run is wrapped in `**` when bold, then
//! in `_` when italic, then turned into `[text](url)` when linked. Every
//! other style is dropped.

use gbridge_core::domain::richtext::{Document, Paragraph, TextRun};

/// Render a fetched document as markdown, one line per paragraph
pub fn from_rich_text(document: &Document) -> String {
    document
        .paragraphs()
        .map(render_paragraph)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_paragraph(paragraph: &Paragraph) -> String {
    let mut line = String::new();
    match paragraph.heading_level() {
        Some(1) => line.push_str("# "),
        Some(2) => line.push_str("## "),
        _ => {}
    }
    if paragraph.is_bullet() {
        line.push_str("- ");
    }
    for run in paragraph.text_runs() {
        line.push_str(&render_run(run));
    }
    line
}

fn render_run(run: &TextRun) -> String {
    let mut text = run.content.trim_end_matches('\n').to_string();
    // Markers around nothing would read back as literal text
    if text.is_empty() {
        return text;
    }
    let style = &run.text_style;
    if style.is_bold() {
        text = format!("**{text}**");
    }
    if style.is_italic() {
        text = format!("_{text}_");
    }
    if let Some(url) = style.link_url() {
        text = format!("[{text}]({url})");
    }
    text
}
