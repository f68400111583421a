//! Markdown line classification
//!
//! Every line gets exactly one kind, checked in this order:
//!
//! | Kind       | Test                      | Content                     |
//! |------------|---------------------------|-----------------------------|
//! | `Heading2` | starts with `"## "`       | rest of the line            |
//! | `Heading1` | starts with `"# "`        | rest of the line            |
//! | `Link`     | contains `[text](url)`    | `text` of the first link    |
//! | `Bold`     | contains `"**"`           | line with `**x**` unwrapped |
//! | `Italic`   | contains `"_"`            | line with `_x_` unwrapped   |
//! | `Plain`    | anything else             | the line                    |
//!
//! Classification never fails; unmatched markers degrade to the next case.

use once_cell::sync::Lazy;
use regex::Regex;

use gbridge_core::domain::richtext::{Dimension, Link, OptionalColor, TextStyle};

/// Font size of a level-1 heading, in points
pub const HEADING_1_SIZE_PT: f64 = 24.0;

/// Font size of a level-2 heading, in points
pub const HEADING_2_SIZE_PT: f64 = 18.0;

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.*?)_").unwrap());

/// Kind of a markdown line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Heading1,
    Heading2,
    Link { url: String },
    Bold,
    Italic,
    Plain,
}

/// A classified line with its markers stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLine {
    pub kind: LineKind,
    /// Visible text, without the trailing line break
    pub content: String,
}

impl MarkdownLine {
    /// Character style applied to the whole line, if any
    ///
    /// Links are styled separately; see [`link_style`].
    pub fn style(&self) -> Option<TextStyle> {
        let style = match self.kind {
            LineKind::Heading1 => TextStyle {
                bold: Some(true),
                font_size: Some(Dimension::points(HEADING_1_SIZE_PT)),
                ..Default::default()
            },
            LineKind::Heading2 => TextStyle {
                bold: Some(true),
                font_size: Some(Dimension::points(HEADING_2_SIZE_PT)),
                ..Default::default()
            },
            LineKind::Bold => TextStyle {
                bold: Some(true),
                ..Default::default()
            },
            LineKind::Italic => TextStyle {
                italic: Some(true),
                ..Default::default()
            },
            LineKind::Link { .. } | LineKind::Plain => return None,
        };
        Some(style)
    }

    pub fn link(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Link { url } => Some(url),
            _ => None,
        }
    }
}

/// Style of a hyperlink: the target, underlined, in blue
pub fn link_style(url: &str) -> TextStyle {
    TextStyle {
        link: Some(Link {
            url: Some(url.to_string()),
        }),
        underline: Some(true),
        foreground_color: Some(OptionalColor::rgb(0.0, 0.0, 1.0)),
        ..Default::default()
    }
}

/// Classify one line (without its line break)
pub fn classify(line: &str) -> MarkdownLine {
    if let Some(rest) = line.strip_prefix("## ") {
        return MarkdownLine {
            kind: LineKind::Heading2,
            content: rest.to_string(),
        };
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return MarkdownLine {
            kind: LineKind::Heading1,
            content: rest.to_string(),
        };
    }
    if let Some(caps) = LINK_RE.captures(line) {
        return MarkdownLine {
            kind: LineKind::Link {
                url: caps[2].to_string(),
            },
            content: caps[1].to_string(),
        };
    }
    if line.contains("**") {
        return MarkdownLine {
            kind: LineKind::Bold,
            content: BOLD_RE.replace_all(line, "$1").into_owned(),
        };
    }
    if line.contains('_') {
        return MarkdownLine {
            kind: LineKind::Italic,
            content: ITALIC_RE.replace_all(line, "$1").into_owned(),
        };
    }
    MarkdownLine {
        kind: LineKind::Plain,
        content: line.to_string(),
    }
}
