//! # Slide model
//!
//! A slide carries three fixed text fields (`title`, `subtitle`, `notes`),
//! any number of free-standing text boxes, and per-field formatting, style
//! and position records keyed by [`FieldKey`].
//!
//! The subtitle is the slide's body text; the remote store calls it
//! `content`.
//!
//! Records are partial on the wire. [`Slide::ensure_defaults`] fills in
//! every record the editor relies on and is idempotent.

use serde::{Deserialize, Serialize};
use slidedeck_common::{SlideId, TextBoxId};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LAYOUT: &str = "title-content";
pub const DEFAULT_TRANSITION: &str = "none";

/// Addressable text field on a slide
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FieldKey {
    Title,
    Subtitle,
    Notes,
    TextBox(TextBoxId),
}

impl FieldKey {
    /// Text shown in place of an empty field
    pub fn placeholder(&self) -> &'static str {
        match self {
            FieldKey::Title => "Click to add title",
            FieldKey::Subtitle => "Click to add subtitle",
            FieldKey::Notes => "Click to add speaker notes",
            FieldKey::TextBox(_) => "Click to add text",
        }
    }

    /// Fields every slide must carry formatting for
    pub fn required() -> [FieldKey; 2] {
        [FieldKey::Title, FieldKey::Subtitle]
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Title => f.write_str("title"),
            FieldKey::Subtitle => f.write_str("subtitle"),
            FieldKey::Notes => f.write_str("notes"),
            FieldKey::TextBox(id) => write!(f, "textBox:{}", id),
        }
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(FieldKey::Title),
            "subtitle" | "content" => Ok(FieldKey::Subtitle),
            "notes" => Ok(FieldKey::Notes),
            other => match other.strip_prefix("textBox:") {
                Some(id) if !id.is_empty() => Ok(FieldKey::TextBox(TextBoxId::new(id))),
                _ => Err(format!("unknown field key: {}", other)),
            },
        }
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for FieldKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Paragraph formatting for one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formatting {
    pub line_height: f32,
}

impl Formatting {
    pub fn default_for(key: &FieldKey) -> Self {
        let line_height = match key {
            FieldKey::Title => 1.2,
            FieldKey::Subtitle | FieldKey::TextBox(_) => 1.5,
            FieldKey::Notes => 1.4,
        };
        Self { line_height }
    }

    fn is_valid(&self) -> bool {
        self.line_height.is_finite() && self.line_height > 0.0
    }
}

/// Partial update for [`Formatting`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

impl FormattingPatch {
    /// Attribute whose value would make the record invalid
    pub fn invalid_attribute(&self) -> Option<&'static str> {
        match self.line_height {
            Some(height) if !(height.is_finite() && height > 0.0) => Some("lineHeight"),
            _ => None,
        }
    }

    pub fn apply_to(&self, base: &Formatting) -> Formatting {
        Formatting {
            line_height: self.line_height.unwrap_or(base.line_height),
        }
    }
}

/// Character styling for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyle {
    pub font_family: String,
    pub font_size: u32,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub letter_spacing: f32,
}

impl FieldStyle {
    pub fn default_for(key: &FieldKey) -> Self {
        let (font_size, bold) = match key {
            FieldKey::Title => (44, true),
            FieldKey::Subtitle => (24, false),
            FieldKey::Notes => (14, false),
            FieldKey::TextBox(_) => (18, false),
        };
        Self {
            font_family: "Inter".to_string(),
            font_size,
            color: "#1f2937".to_string(),
            bold,
            italic: false,
            letter_spacing: 0.0,
        }
    }
}

/// Partial update for [`FieldStyle`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
}

impl StylePatch {
    /// Attribute whose value would make the record invalid
    pub fn invalid_attribute(&self) -> Option<&'static str> {
        if self.font_size == Some(0) {
            return Some("fontSize");
        }
        match self.letter_spacing {
            Some(spacing) if !spacing.is_finite() => Some("letterSpacing"),
            _ => None,
        }
    }

    pub fn apply_to(&self, base: &FieldStyle) -> FieldStyle {
        FieldStyle {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| base.font_family.clone()),
            font_size: self.font_size.unwrap_or(base.font_size),
            color: self.color.clone().unwrap_or_else(|| base.color.clone()),
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            letter_spacing: self.letter_spacing.unwrap_or(base.letter_spacing),
        }
    }
}

/// Placement of a field on the slide canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z_index: i32,
}

impl Position {
    pub fn default_for(key: &FieldKey) -> Self {
        match key {
            FieldKey::Title => Self { x: 80.0, y: 120.0, z_index: 2 },
            FieldKey::Subtitle => Self { x: 80.0, y: 260.0, z_index: 1 },
            FieldKey::Notes => Self { x: 0.0, y: 0.0, z_index: 0 },
            FieldKey::TextBox(_) => Self { x: 160.0, y: 360.0, z_index: 3 },
        }
    }
}

/// Partial update for [`Position`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
}

impl PositionPatch {
    /// Attribute whose value would make the record invalid
    pub fn invalid_attribute(&self) -> Option<&'static str> {
        if self.x.is_some_and(|x| !x.is_finite()) {
            return Some("x");
        }
        if self.y.is_some_and(|y| !y.is_finite()) {
            return Some("y");
        }
        None
    }

    pub fn apply_to(&self, base: &Position) -> Position {
        Position {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            z_index: self.z_index.unwrap_or(base.z_index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Cover,
    #[default]
    Content,
    Ending,
}

impl SlideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Cover => "cover",
            SlideType::Content => "content",
            SlideType::Ending => "ending",
        }
    }

    /// Lenient parse used for remote records
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Some(SlideType::Cover),
            "content" => Some(SlideType::Content),
            "ending" => Some(SlideType::Ending),
            _ => None,
        }
    }
}

/// Free-standing text box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub id: TextBoxId,
    #[serde(default)]
    pub content: String,
}

pub type FieldFormatting = BTreeMap<FieldKey, Formatting>;

/// Fill in formatting for every required field and repair invalid records
///
/// Total and idempotent: `ensure_formatting(Some(&ensure_formatting(x)))`
/// equals `ensure_formatting(x)` for every `x`, absent included.
pub fn ensure_formatting(formatting: Option<&FieldFormatting>) -> FieldFormatting {
    let mut ensured: FieldFormatting = formatting
        .map(|f| {
            f.iter()
                .map(|(key, record)| {
                    let record = if record.is_valid() {
                        *record
                    } else {
                        Formatting::default_for(key)
                    };
                    (key.clone(), record)
                })
                .collect()
        })
        .unwrap_or_default();

    for key in FieldKey::required() {
        ensured
            .entry(key.clone())
            .or_insert_with(|| Formatting::default_for(&key));
    }

    ensured
}

/// One slide of a presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub text_boxes: Vec<TextBox>,
    #[serde(default)]
    pub formatting: FieldFormatting,
    #[serde(default)]
    pub styles: BTreeMap<FieldKey, FieldStyle>,
    #[serde(default)]
    pub positions: BTreeMap<FieldKey, Position>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub slide_type: SlideType,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default = "default_transition")]
    pub transition: String,
    #[serde(default)]
    pub background: Option<String>,
}

fn default_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

fn default_transition() -> String {
    DEFAULT_TRANSITION.to_string()
}

impl Slide {
    /// Blank content slide with every default record in place
    pub fn new(id: SlideId, order: u32) -> Self {
        Self {
            id,
            order,
            title: String::new(),
            subtitle: String::new(),
            notes: String::new(),
            text_boxes: Vec::new(),
            formatting: FieldFormatting::new(),
            styles: BTreeMap::new(),
            positions: BTreeMap::new(),
            theme: None,
            slide_type: SlideType::Content,
            layout: default_layout(),
            transition: default_transition(),
            background: None,
        }
        .ensure_defaults()
    }

    pub fn with_theme(mut self, theme: Option<String>) -> Self {
        self.theme = theme;
        self
    }

    /// Synthesize formatting, style and position for the required fields
    /// and for every text box
    pub fn ensure_defaults(mut self) -> Self {
        self.formatting = ensure_formatting(Some(&self.formatting));

        let mut keys: Vec<FieldKey> = FieldKey::required().into();
        keys.extend(
            self.text_boxes
                .iter()
                .map(|tb| FieldKey::TextBox(tb.id.clone())),
        );

        for key in keys {
            self.formatting
                .entry(key.clone())
                .or_insert_with(|| Formatting::default_for(&key));
            self.styles
                .entry(key.clone())
                .or_insert_with(|| FieldStyle::default_for(&key));
            self.positions
                .entry(key.clone())
                .or_insert_with(|| Position::default_for(&key));
        }

        self
    }

    /// Current value of a field, `None` for an unknown text box
    pub fn field(&self, key: &FieldKey) -> Option<&str> {
        match key {
            FieldKey::Title => Some(&self.title),
            FieldKey::Subtitle => Some(&self.subtitle),
            FieldKey::Notes => Some(&self.notes),
            FieldKey::TextBox(id) => self
                .text_boxes
                .iter()
                .find(|tb| &tb.id == id)
                .map(|tb| tb.content.as_str()),
        }
    }

    pub(crate) fn field_mut(&mut self, key: &FieldKey) -> Option<&mut String> {
        match key {
            FieldKey::Title => Some(&mut self.title),
            FieldKey::Subtitle => Some(&mut self.subtitle),
            FieldKey::Notes => Some(&mut self.notes),
            FieldKey::TextBox(id) => self
                .text_boxes
                .iter_mut()
                .find(|tb| &tb.id == id)
                .map(|tb| &mut tb.content),
        }
    }

    pub fn has_field(&self, key: &FieldKey) -> bool {
        self.field(key).is_some()
    }

    /// Formatting for a field, defaulted when absent
    pub fn formatting_for(&self, key: &FieldKey) -> Formatting {
        self.formatting
            .get(key)
            .copied()
            .unwrap_or_else(|| Formatting::default_for(key))
    }

    /// Style for a field, defaulted when absent
    pub fn style_for(&self, key: &FieldKey) -> FieldStyle {
        self.styles
            .get(key)
            .cloned()
            .unwrap_or_else(|| FieldStyle::default_for(key))
    }

    /// Position for a field, defaulted when absent
    pub fn position_for(&self, key: &FieldKey) -> Position {
        self.positions
            .get(key)
            .copied()
            .unwrap_or_else(|| Position::default_for(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_string_roundtrip() {
        let keys = [
            FieldKey::Title,
            FieldKey::Subtitle,
            FieldKey::Notes,
            FieldKey::TextBox(TextBoxId::new("tb-1")),
        ];
        for key in keys {
            let parsed: FieldKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
        assert_eq!("content".parse::<FieldKey>(), Ok(FieldKey::Subtitle));
        assert!("textBox:".parse::<FieldKey>().is_err());
        assert!("footer".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_field_key_as_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(FieldKey::TextBox(TextBoxId::new("a")), Formatting { line_height: 2.0 });
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"textBox:a":{"lineHeight":2.0}}"#);
        let back: BTreeMap<FieldKey, Formatting> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_ensure_formatting_absent() {
        let ensured = ensure_formatting(None);
        assert_eq!(ensured.len(), 2);
        assert_eq!(ensured[&FieldKey::Title], Formatting::default_for(&FieldKey::Title));
        assert_eq!(
            ensured[&FieldKey::Subtitle],
            Formatting::default_for(&FieldKey::Subtitle)
        );
    }

    #[test]
    fn test_ensure_formatting_is_idempotent() {
        let mut partial = FieldFormatting::new();
        partial.insert(FieldKey::Title, Formatting { line_height: 1.8 });
        partial.insert(FieldKey::Notes, Formatting { line_height: f32::NAN });

        for input in [None, Some(&partial)] {
            let once = ensure_formatting(input);
            let twice = ensure_formatting(Some(&once));
            assert_eq!(once, twice);
        }

        let ensured = ensure_formatting(Some(&partial));
        assert_eq!(ensured[&FieldKey::Title].line_height, 1.8);
        assert_eq!(ensured[&FieldKey::Notes], Formatting::default_for(&FieldKey::Notes));
    }

    #[test]
    fn test_ensure_formatting_keeps_valid_record_unchanged() {
        let valid = ensure_formatting(None);
        assert_eq!(ensure_formatting(Some(&valid)), valid);
    }

    #[test]
    fn test_slide_ensure_defaults_idempotent() {
        let mut slide = Slide::new(SlideId::new("s1"), 1);
        slide.text_boxes.push(TextBox {
            id: TextBoxId::new("tb"),
            content: String::new(),
        });
        let once = slide.ensure_defaults();
        let twice = once.clone().ensure_defaults();
        assert_eq!(once, twice);
        assert!(once.styles.contains_key(&FieldKey::TextBox(TextBoxId::new("tb"))));
    }

    #[test]
    fn test_patches_shallow_merge() {
        let base = FieldStyle::default_for(&FieldKey::Subtitle);
        let patch = StylePatch {
            bold: Some(true),
            color: Some("#ff0000".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&base);
        assert!(merged.bold);
        assert_eq!(merged.color, "#ff0000");
        assert_eq!(merged.font_size, base.font_size);
        assert_eq!(merged.font_family, base.font_family);

        let pos = PositionPatch { y: Some(10.0), ..Default::default() }
            .apply_to(&Position::default_for(&FieldKey::Title));
        assert_eq!(pos.y, 10.0);
        assert_eq!(pos.x, 80.0);
    }

    #[test]
    fn test_patches_flag_unusable_numbers() {
        let nan_height = FormattingPatch { line_height: Some(f32::NAN) };
        assert_eq!(nan_height.invalid_attribute(), Some("lineHeight"));
        let flat = FormattingPatch { line_height: Some(0.0) };
        assert_eq!(flat.invalid_attribute(), Some("lineHeight"));
        assert_eq!(FormattingPatch { line_height: Some(1.6) }.invalid_attribute(), None);

        let spacing = StylePatch {
            letter_spacing: Some(f32::INFINITY),
            ..Default::default()
        };
        assert_eq!(spacing.invalid_attribute(), Some("letterSpacing"));
        let tiny = StylePatch {
            font_size: Some(0),
            ..Default::default()
        };
        assert_eq!(tiny.invalid_attribute(), Some("fontSize"));

        let off_canvas = PositionPatch { y: Some(f32::NEG_INFINITY), ..Default::default() };
        assert_eq!(off_canvas.invalid_attribute(), Some("y"));
        assert_eq!(PositionPatch::default().invalid_attribute(), None);
    }

    #[test]
    fn test_slide_deserializes_from_minimal_json() {
        let slide: Slide = serde_json::from_str(r#"{"id":"slide-9"}"#).unwrap();
        assert_eq!(slide.layout, DEFAULT_LAYOUT);
        assert_eq!(slide.slide_type, SlideType::Content);
        let slide = slide.ensure_defaults();
        assert!(slide.formatting.contains_key(&FieldKey::Title));
    }

    #[test]
    fn test_slide_type_lenient_parse() {
        assert_eq!(SlideType::parse(" Cover "), Some(SlideType::Cover));
        assert_eq!(SlideType::parse("ending"), Some(SlideType::Ending));
        assert_eq!(SlideType::parse("bogus"), None);
    }
}
