//! Read-only projection consumed by the writing assistant, and the patch
//! shape it sends back.

use serde::{Deserialize, Serialize};
use slidedeck_common::SlideId;

/// What the assistant sees of one slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideProjection {
    pub id: SlideId,
    pub title: String,
    pub content: String,
    pub notes: String,
    pub language: String,
}

/// Suggested replacement for a slide's body and/or notes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssistantPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.notes.is_none()
    }
}
