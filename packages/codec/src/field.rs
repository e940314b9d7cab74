//! # Surface ↔ field conversion
//!
//! Editable surfaces hand us raw markup. A surface the user has cleared
//! rarely produces an empty string: browsers leave `<br>`, `<div><br></div>`
//! or `&nbsp;` behind. `normalize` folds all of those into the field's
//! placeholder so the model never stores structurally-empty markup.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));

static MEDIA_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*(img|video|svg|iframe)\b").expect("media pattern"));

static ENTITY_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(nbsp|#160|#xa0|zwnj|#8203);").expect("entity pattern"));

/// Normalized content of one text field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValue(String);

impl FieldValue {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Deref for FieldValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Convert raw surface markup into a field value
///
/// Structurally-empty markup becomes `placeholder`; anything with visible
/// text or embedded media is kept verbatim.
pub fn normalize(surface: &str, placeholder: &str) -> FieldValue {
    if is_structurally_empty(surface) {
        FieldValue::new(placeholder)
    } else {
        FieldValue::new(surface)
    }
}

/// Convert a field value back into surface markup
pub fn denormalize(value: &FieldValue) -> String {
    value.as_str().to_string()
}

/// True when the markup renders no text and no media
pub fn is_structurally_empty(markup: &str) -> bool {
    if MEDIA_TAG.is_match(markup) {
        return false;
    }
    plain_text(markup).trim().is_empty()
}

/// Visible text of a markup fragment, with tags dropped and common
/// entities decoded
pub fn plain_text(markup: &str) -> String {
    let without_tags = TAG.replace_all(markup, "");
    let spaced = ENTITY_SPACE.replace_all(&without_tags, " ");
    spaced
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .replace('\u{a0}', " ")
        .replace('\u{200b}', "")
}
