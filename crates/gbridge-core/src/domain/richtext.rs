//! Rich text document model
//!
//! Two sides of the remote document protocol:
//! - [`RichTextOp`] edit requests, serialized exactly as the document
//!   service's batch-update endpoint expects them
//! - [`Document`], the subset of a fetched document the markdown codec reads
//!   (paragraphs, heading level, bullets, text runs)
//!
//! All indexes are in the document's own coordinate space, which counts
//! UTF-16 code units and starts at 1.

use serde::{Deserialize, Serialize};

// ============================================================================
// Styles
// ============================================================================

/// A length with a unit, e.g. `18 PT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: String,
}

impl Dimension {
    pub fn points(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT".to_string(),
        }
    }
}

/// Hyperlink target of a text run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    #[serde(default)]
    pub red: f32,
    #[serde(default)]
    pub green: f32,
    #[serde(default)]
    pub blue: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<RgbColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalColor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl OptionalColor {
    pub fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            color: Some(Color {
                rgb_color: Some(RgbColor { red, green, blue }),
            }),
        }
    }
}

/// Character-level style
///
/// Unset fields are omitted on the wire; together with the `fields` mask of
/// an update request this means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<OptionalColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl TextStyle {
    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn link_url(&self) -> Option<&str> {
        self.link.as_ref().and_then(|l| l.url.as_deref())
    }

    /// True if no field is set
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Names of the fields that are set, in wire spelling
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.font_size.is_some() {
            fields.push("fontSize");
        }
        if self.link.is_some() {
            fields.push("link");
        }
        if self.underline.is_some() {
            fields.push("underline");
        }
        if self.foreground_color.is_some() {
            fields.push("foregroundColor");
        }
        fields
    }

    /// Comma-separated field mask covering every set field
    pub fn field_mask(&self) -> String {
        self.field_names().join(",")
    }
}

// ============================================================================
// Edit requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub index: u32,
}

/// Half-open `[start_index, end_index)` span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: u32,
    pub end_index: u32,
}

impl Range {
    pub fn new(start_index: u32, end_index: u32) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    pub fn len(&self) -> u32 {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

/// One document edit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RichTextOp {
    InsertText(InsertText),
    UpdateTextStyle(UpdateTextStyle),
}

impl RichTextOp {
    pub fn insert_text(index: u32, text: impl Into<String>) -> Self {
        Self::InsertText(InsertText {
            location: Location { index },
            text: text.into(),
        })
    }

    /// Style update whose field mask is derived from the style itself
    pub fn update_style(range: Range, style: TextStyle) -> Self {
        let fields = style.field_mask();
        Self::UpdateTextStyle(UpdateTextStyle {
            range,
            text_style: style,
            fields,
        })
    }
}

// ============================================================================
// Fetched document
// ============================================================================

/// A fetched document, reduced to what the markdown reader needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Body,
}

impl Document {
    /// Paragraph elements in document order; tables and section breaks are skipped
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.content.iter().filter_map(|e| e.paragraph.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_style: Option<ParagraphStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet: Option<serde_json::Value>,
}

impl Paragraph {
    /// Heading level for `HEADING_1`..`HEADING_6`, `None` otherwise
    pub fn heading_level(&self) -> Option<u8> {
        let named = self.paragraph_style.as_ref()?.named_style_type.as_deref()?;
        let level: u8 = named.strip_prefix("HEADING_")?.parse().ok()?;
        (1..=6).contains(&level).then_some(level)
    }

    pub fn is_bullet(&self) -> bool {
        self.bullet.is_some()
    }

    /// Text runs in order; inline objects and other elements are skipped
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|e| e.text_run.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub text_style: TextStyle,
}
