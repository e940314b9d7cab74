//! # Remote records
//!
//! Typed views of the documents kept in the remote store, and the lenient
//! decoding that produces them. Remote data is never trusted to match the
//! local schema: every field is read on its own and anything of an
//! unexpected type falls back to a default.
//!
//! Slide `content` (the subtitle) and `notes` are ciphertext on the wire.
//! So are comment messages and the same two fields inside version
//! snapshots.

use crate::remote::Fields;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slidedeck_codec::FieldCipher;
use slidedeck_common::{CommentId, Identity, SlideId, TextBoxId, VersionId};
use slidedeck_editor::{
    FieldFormatting, FieldKey, FieldStyle, Formatting, Position, Slide, SlideType, TextBox,
};
use std::collections::BTreeMap;

/// Field-by-field readers with documented defaults
pub mod coerce {
    use super::*;

    /// Strings as-is, numbers and booleans stringified, anything else `""`
    pub fn string(fields: &Fields, key: &str) -> String {
        match fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Non-empty strings only
    pub fn opt_string(fields: &Fields, key: &str) -> Option<String> {
        match fields.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Non-negative integers, numeric strings, else `default`
    pub fn u32_or(fields: &Fields, key: &str, default: u32) -> u32 {
        match fields.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
                        .map(|f| f as u32)
                })
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Arrays of strings; non-string elements are dropped
    pub fn string_list(fields: &Fields, key: &str) -> Vec<String> {
        match fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// RFC 3339 strings, epoch milliseconds, or `{ "seconds": n }`
    pub fn timestamp(fields: &Fields, key: &str) -> Option<DateTime<Utc>> {
        match fields.get(key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            Value::Object(map) => map
                .get("seconds")
                .and_then(Value::as_i64)
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            _ => None,
        }
    }

    /// Nested object, empty when absent or mistyped
    pub fn object<'a>(fields: &'a Fields, key: &str) -> Option<&'a Fields> {
        fields.get(key).and_then(Value::as_object)
    }

    /// Overlay a partial JSON object onto `base`
    ///
    /// Returns `base` unchanged when the result no longer deserializes.
    pub fn overlay<T: Serialize + DeserializeOwned>(base: T, patch: &Value) -> T {
        let (Ok(Value::Object(mut merged)), Some(patch)) = (serde_json::to_value(&base), patch.as_object())
        else {
            return base;
        };
        merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        serde_json::from_value(Value::Object(merged)).unwrap_or(base)
    }

    /// Per-field records keyed by field name; unknown keys are skipped
    pub fn field_map<T: Serialize + DeserializeOwned>(
        fields: &Fields,
        key: &str,
        default_for: impl Fn(&FieldKey) -> T,
    ) -> BTreeMap<FieldKey, T> {
        let Some(map) = object(fields, key) else {
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(name, value)| {
                let field: FieldKey = name.parse().ok()?;
                let record = overlay(default_for(&field), value);
                Some((field, record))
            })
            .collect()
    }
}

/// Fixed-width RFC 3339 (microseconds, `Z`) so timestamps sort as strings
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn field_map_value<T: Serialize>(map: &BTreeMap<FieldKey, T>) -> Value {
    Value::Object(
        map.iter()
            .filter_map(|(key, record)| Some((key.to_string(), serde_json::to_value(record).ok()?)))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationStatus {
    #[default]
    Draft,
    Final,
}

impl PresentationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationStatus::Draft => "draft",
            PresentationStatus::Final => "final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(PresentationStatus::Draft),
            "final" => Some(PresentationStatus::Final),
            _ => None,
        }
    }
}

/// `presentations/{id}`
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationRecord {
    pub title: String,
    pub status: PresentationStatus,
    pub owner_id: String,
    pub collaborator_ids: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PresentationRecord {
    pub fn new(title: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: PresentationStatus::Draft,
            owner_id: owner_id.into(),
            collaborator_ids: Vec::new(),
            updated_at: None,
        }
    }

    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            title: coerce::string(fields, "title"),
            status: coerce::opt_string(fields, "status")
                .and_then(|s| PresentationStatus::parse(&s))
                .unwrap_or_default(),
            owner_id: coerce::string(fields, "ownerId"),
            collaborator_ids: coerce::string_list(fields, "collaboratorIds"),
            updated_at: coerce::timestamp(fields, "updatedAt"),
        }
    }

    /// Fields written on every save
    ///
    /// Owner and collaborators are left out so a save never overwrites
    /// membership.
    pub fn save_fields(&self, now: DateTime<Utc>) -> Fields {
        to_fields(json!({
            "title": self.title,
            "status": self.status.as_str(),
            "updatedAt": format_timestamp(now),
        }))
    }

    /// Every field, used when the presentation is first created
    pub fn to_fields(&self) -> Fields {
        to_fields(json!({
            "title": self.title,
            "status": self.status.as_str(),
            "ownerId": self.owner_id,
            "collaboratorIds": self.collaborator_ids,
            "updatedAt": self.updated_at.map(format_timestamp),
        }))
    }
}

/// `presentations/{id}/slides/{slideId}` as stored
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    pub order: u32,
    pub title: String,
    /// Encrypted subtitle
    pub content: String,
    /// Encrypted notes
    pub notes: String,
    pub theme: Option<String>,
    pub slide_type: SlideType,
    pub formatting: FieldFormatting,
    pub styles: BTreeMap<FieldKey, FieldStyle>,
    pub positions: BTreeMap<FieldKey, Position>,
    pub text_boxes: Vec<TextBox>,
    pub layout: Option<String>,
    pub transition: Option<String>,
    pub background: Option<String>,
}

impl SlideRecord {
    /// Encrypt a live slide for storage
    pub fn from_slide(slide: &Slide, cipher: &FieldCipher) -> Self {
        Self {
            order: slide.order,
            title: slide.title.clone(),
            content: cipher.encrypt(&slide.subtitle),
            notes: cipher.encrypt(&slide.notes),
            theme: slide.theme.clone(),
            slide_type: slide.slide_type,
            formatting: slide.formatting.clone(),
            styles: slide.styles.clone(),
            positions: slide.positions.clone(),
            text_boxes: slide.text_boxes.clone(),
            layout: Some(slide.layout.clone()),
            transition: Some(slide.transition.clone()),
            background: slide.background.clone(),
        }
    }

    /// Decrypt into a live slide; undecryptable fields come through raw
    pub fn into_slide(self, id: SlideId, cipher: &FieldCipher) -> Slide {
        let mut slide = Slide::new(id, self.order);
        slide.title = self.title;
        slide.subtitle = cipher.decrypt(&self.content);
        slide.notes = cipher.decrypt(&self.notes);
        slide.theme = self.theme;
        slide.slide_type = self.slide_type;
        slide.formatting = self.formatting;
        slide.styles = self.styles;
        slide.positions = self.positions;
        slide.text_boxes = self.text_boxes;
        if let Some(layout) = self.layout {
            slide.layout = layout;
        }
        if let Some(transition) = self.transition {
            slide.transition = transition;
        }
        slide.background = self.background;
        slide.ensure_defaults()
    }

    pub fn from_fields(fields: &Fields) -> Self {
        let text_boxes = match fields.get("textBoxes") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|tb| {
                    let id = coerce::opt_string(tb, "id")?;
                    Some(TextBox {
                        id: TextBoxId::new(id),
                        content: coerce::string(tb, "content"),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        let formatting = coerce::object(fields, "formatting")
            .map(|map| {
                map.iter()
                    .filter_map(|(name, value)| {
                        let key: FieldKey = name.parse().ok()?;
                        let line_height = value.get("lineHeight").and_then(Value::as_f64)?;
                        Some((key, Formatting { line_height: line_height as f32 }))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            order: coerce::u32_or(fields, "order", 0),
            title: coerce::string(fields, "title"),
            content: coerce::string(fields, "content"),
            notes: coerce::string(fields, "notes"),
            theme: coerce::opt_string(fields, "theme"),
            slide_type: coerce::opt_string(fields, "slideType")
                .and_then(|s| SlideType::parse(&s))
                .unwrap_or_default(),
            formatting,
            styles: coerce::field_map(fields, "styles", FieldStyle::default_for),
            positions: coerce::field_map(fields, "positions", Position::default_for),
            text_boxes,
            layout: coerce::opt_string(fields, "layout"),
            transition: coerce::opt_string(fields, "transition"),
            background: coerce::opt_string(fields, "background"),
        }
    }

    pub fn to_fields(&self) -> Fields {
        to_fields(json!({
            "order": self.order,
            "title": self.title,
            "content": self.content,
            "notes": self.notes,
            "theme": self.theme,
            "slideType": self.slide_type.as_str(),
            "formatting": field_map_value(&self.formatting),
            "styles": field_map_value(&self.styles),
            "positions": field_map_value(&self.positions),
            "textBoxes": self.text_boxes,
            "layout": self.layout,
            "transition": self.transition,
            "background": self.background,
        }))
    }
}

/// One slide inside a version snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSlide {
    pub id: SlideId,
    pub order: u32,
    pub title: String,
    /// Encrypted subtitle
    pub content: String,
    /// Encrypted notes
    pub notes: String,
    pub theme: Option<String>,
    pub slide_type: SlideType,
}

impl SnapshotSlide {
    pub fn capture(slide: &Slide, cipher: &FieldCipher) -> Self {
        Self {
            id: slide.id.clone(),
            order: slide.order,
            title: slide.title.clone(),
            content: cipher.encrypt(&slide.subtitle),
            notes: cipher.encrypt(&slide.notes),
            theme: slide.theme.clone(),
            slide_type: slide.slide_type,
        }
    }

    /// Entries without an id cannot be restored and are skipped
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            id: SlideId::new(coerce::opt_string(fields, "id")?),
            order: coerce::u32_or(fields, "order", 0),
            title: coerce::string(fields, "title"),
            content: coerce::string(fields, "content"),
            notes: coerce::string(fields, "notes"),
            theme: coerce::opt_string(fields, "theme"),
            slide_type: coerce::opt_string(fields, "slideType")
                .and_then(|s| SlideType::parse(&s))
                .unwrap_or_default(),
        })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "order": self.order,
            "title": self.title,
            "content": self.content,
            "notes": self.notes,
            "theme": self.theme,
            "slideType": self.slide_type.as_str(),
        })
    }

    /// Live slide fields written by a restore; ciphertext is carried verbatim
    pub fn restore_fields(&self) -> Fields {
        to_fields(json!({
            "order": self.order,
            "title": self.title,
            "content": self.content,
            "notes": self.notes,
            "theme": self.theme,
            "slideType": self.slide_type.as_str(),
        }))
    }
}

/// `presentations/{id}/versions/{versionId}`
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub id: VersionId,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_by_name: String,
    pub summary: String,
    pub slides: Vec<SnapshotSlide>,
}

impl VersionRecord {
    pub fn from_fields(id: VersionId, fields: &Fields) -> Self {
        let slides = match fields.get("slides") {
            Some(Value::Array(items)) => items.iter().filter_map(SnapshotSlide::from_value).collect(),
            _ => Vec::new(),
        };
        Self {
            id,
            created_at: coerce::timestamp(fields, "createdAt"),
            created_by: coerce::string(fields, "createdBy"),
            created_by_name: coerce::string(fields, "createdByName"),
            summary: coerce::string(fields, "summary"),
            slides,
        }
    }

    pub fn to_fields(&self) -> Fields {
        to_fields(json!({
            "createdAt": self.created_at.map(format_timestamp),
            "createdBy": self.created_by,
            "createdByName": self.created_by_name,
            "summary": self.summary,
            "slides": self.slides.iter().map(SnapshotSlide::to_value).collect::<Vec<_>>(),
        }))
    }
}

/// A decrypted comment, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub author: String,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn from_fields(id: CommentId, fields: &Fields, cipher: &FieldCipher) -> Self {
        let author = coerce::opt_string(fields, "author").unwrap_or_else(|| "Anonymous".to_string());
        Self {
            id,
            author,
            message: cipher.decrypt(&coerce::string(fields, "message")),
            created_at: coerce::timestamp(fields, "createdAt"),
        }
    }

    /// Fields for a new comment; the message is encrypted
    pub fn new_fields(author: &Identity, message: &str, cipher: &FieldCipher, now: DateTime<Utc>) -> Fields {
        to_fields(json!({
            "author": author.label(),
            "authorId": author.user_id,
            "message": cipher.encrypt(message),
            "createdAt": format_timestamp(now),
        }))
    }

    /// `YYYY-MM-DD HH:MM` in UTC, empty when the timestamp is unknown
    pub fn display_time(&self) -> String {
        self.created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}
