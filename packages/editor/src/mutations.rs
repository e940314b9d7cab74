//! # Slide Mutations
//!
//! Semantic operations on a [`SlideDocument`].
//!
//! ## Mutation Semantics
//!
//! ### UpdateField
//! - Atomic replacement of the field's markup (not a character diff)
//! - Last write wins
//!
//! ### UpdateStyle / UpdatePosition / UpdateFormatting
//! - Shallow merge of the patch onto the existing record, defaulted first
//!
//! ### AddSlide
//! - Appends, inherits the selected slide's theme, takes the next order
//! - Selects the new slide
//!
//! ### DeleteSlide
//! - Refused when it would remove the last slide
//! - A deleted selection moves to the previous slide, else the next
//!
//! ### MoveSlide
//! - Swaps with the neighbour; a no-op at either boundary
//!
//! Structural mutations leave `order` dense (1..=N).

use crate::document::SlideDocument;
use crate::slide::{
    FieldKey, FieldStyle, Formatting, FormattingPatch, Position, PositionPatch, Slide, SlideType,
    StylePatch, TextBox,
};
use serde::{Deserialize, Serialize};
use slidedeck_common::{SlideId, TextBoxId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Replace the markup of a text field
    UpdateField {
        slide_id: SlideId,
        field: FieldKey,
        value: String,
    },

    /// Merge a partial style onto a field
    UpdateStyle {
        slide_id: SlideId,
        field: FieldKey,
        patch: StylePatch,
    },

    /// Merge a partial position onto a field
    UpdatePosition {
        slide_id: SlideId,
        field: FieldKey,
        patch: PositionPatch,
    },

    /// Merge partial formatting onto a field
    UpdateFormatting {
        slide_id: SlideId,
        field: FieldKey,
        patch: FormattingPatch,
    },

    /// Append a blank slide with a pre-minted id
    AddSlide { slide_id: SlideId },

    /// Remove a slide
    DeleteSlide { slide_id: SlideId },

    /// Swap a slide with its neighbour
    MoveSlide {
        slide_id: SlideId,
        direction: MoveDirection,
    },

    /// Add a free-standing text box
    AddTextBox {
        slide_id: SlideId,
        text_box_id: TextBoxId,
        content: String,
    },

    /// Remove a text box and its records
    RemoveTextBox {
        slide_id: SlideId,
        text_box_id: TextBoxId,
    },

    SetTheme {
        slide_id: SlideId,
        theme: Option<String>,
    },

    SetSlideType {
        slide_id: SlideId,
        slide_type: SlideType,
    },

    SetLayout { slide_id: SlideId, layout: String },

    SetTransition {
        slide_id: SlideId,
        transition: String,
    },

    SetBackground {
        slide_id: SlideId,
        background: Option<String>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Slide not found: {0}")]
    SlideNotFound(SlideId),

    #[error("Text box not found: {0}")]
    TextBoxNotFound(TextBoxId),

    #[error("Slide already exists: {0}")]
    DuplicateSlide(SlideId),

    #[error("Text box already exists: {0}")]
    DuplicateTextBox(TextBoxId),

    #[error("Cannot delete the last remaining slide")]
    LastSlide,

    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
}

/// Outcome of applying a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The document changed
    Changed,
    /// The mutation was valid but had no effect
    Unchanged,
}

impl Applied {
    pub fn changed(self) -> bool {
        self == Applied::Changed
    }

    fn from_bool(changed: bool) -> Self {
        if changed {
            Applied::Changed
        } else {
            Applied::Unchanged
        }
    }
}

impl Mutation {
    /// The slide this mutation targets
    pub fn slide_id(&self) -> &SlideId {
        match self {
            Mutation::UpdateField { slide_id, .. }
            | Mutation::UpdateStyle { slide_id, .. }
            | Mutation::UpdatePosition { slide_id, .. }
            | Mutation::UpdateFormatting { slide_id, .. }
            | Mutation::AddSlide { slide_id }
            | Mutation::DeleteSlide { slide_id }
            | Mutation::MoveSlide { slide_id, .. }
            | Mutation::AddTextBox { slide_id, .. }
            | Mutation::RemoveTextBox { slide_id, .. }
            | Mutation::SetTheme { slide_id, .. }
            | Mutation::SetSlideType { slide_id, .. }
            | Mutation::SetLayout { slide_id, .. }
            | Mutation::SetTransition { slide_id, .. }
            | Mutation::SetBackground { slide_id, .. } => slide_id,
        }
    }

    /// Mutations that add, remove or reorder slides
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::AddSlide { .. } | Mutation::DeleteSlide { .. } | Mutation::MoveSlide { .. }
        )
    }

    /// Short human-readable label, used for undo/redo menus
    pub fn describe(&self) -> String {
        match self {
            Mutation::UpdateField { field, .. } => format!("Edit {}", field),
            Mutation::UpdateStyle { field, .. } => format!("Style {}", field),
            Mutation::UpdatePosition { field, .. } => format!("Move {}", field),
            Mutation::UpdateFormatting { field, .. } => format!("Format {}", field),
            Mutation::AddSlide { .. } => "Add slide".to_string(),
            Mutation::DeleteSlide { .. } => "Delete slide".to_string(),
            Mutation::MoveSlide { .. } => "Reorder slides".to_string(),
            Mutation::AddTextBox { .. } => "Add text box".to_string(),
            Mutation::RemoveTextBox { .. } => "Remove text box".to_string(),
            Mutation::SetTheme { .. } => "Change theme".to_string(),
            Mutation::SetSlideType { .. } => "Change slide type".to_string(),
            Mutation::SetLayout { .. } => "Change layout".to_string(),
            Mutation::SetTransition { .. } => "Change transition".to_string(),
            Mutation::SetBackground { .. } => "Change background".to_string(),
        }
    }

    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut SlideDocument) -> Result<Applied, MutationError> {
        match self {
            Mutation::UpdateField {
                slide_id,
                field,
                value,
            } => Self::apply_update_field(doc, slide_id, field, value),

            Mutation::UpdateStyle {
                slide_id,
                field,
                patch,
            } => Self::apply_update_style(doc, slide_id, field, patch),

            Mutation::UpdatePosition {
                slide_id,
                field,
                patch,
            } => Self::apply_update_position(doc, slide_id, field, patch),

            Mutation::UpdateFormatting {
                slide_id,
                field,
                patch,
            } => Self::apply_update_formatting(doc, slide_id, field, patch),

            Mutation::AddSlide { slide_id } => Self::apply_add_slide(doc, slide_id),

            Mutation::DeleteSlide { slide_id } => Self::apply_delete_slide(doc, slide_id),

            Mutation::MoveSlide {
                slide_id,
                direction,
            } => Self::apply_move_slide(doc, slide_id, *direction),

            Mutation::AddTextBox {
                slide_id,
                text_box_id,
                content,
            } => Self::apply_add_text_box(doc, slide_id, text_box_id, content),

            Mutation::RemoveTextBox {
                slide_id,
                text_box_id,
            } => Self::apply_remove_text_box(doc, slide_id, text_box_id),

            Mutation::SetTheme { slide_id, theme } => {
                Self::set_attribute(doc, slide_id, |s| replace(&mut s.theme, theme.clone()))
            }

            Mutation::SetSlideType {
                slide_id,
                slide_type,
            } => Self::set_attribute(doc, slide_id, |s| replace(&mut s.slide_type, *slide_type)),

            Mutation::SetLayout { slide_id, layout } => {
                Self::set_attribute(doc, slide_id, |s| replace(&mut s.layout, layout.clone()))
            }

            Mutation::SetTransition {
                slide_id,
                transition,
            } => Self::set_attribute(doc, slide_id, |s| {
                replace(&mut s.transition, transition.clone())
            }),

            Mutation::SetBackground {
                slide_id,
                background,
            } => Self::set_attribute(doc, slide_id, |s| {
                replace(&mut s.background, background.clone())
            }),
        }
    }

    fn find<'a>(doc: &'a mut SlideDocument, slide_id: &SlideId) -> Result<&'a mut Slide, MutationError> {
        doc.slide_mut(slide_id)
            .ok_or_else(|| MutationError::SlideNotFound(slide_id.clone()))
    }

    fn require_field(slide: &Slide, field: &FieldKey) -> Result<(), MutationError> {
        match field {
            FieldKey::TextBox(id) if !slide.has_field(field) => {
                Err(MutationError::TextBoxNotFound(id.clone()))
            }
            _ => Ok(()),
        }
    }

    fn apply_update_field(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        field: &FieldKey,
        value: &str,
    ) -> Result<Applied, MutationError> {
        let slide = Self::find(doc, slide_id)?;
        let current = slide.field_mut(field).ok_or_else(|| match field {
            FieldKey::TextBox(id) => MutationError::TextBoxNotFound(id.clone()),
            _ => MutationError::SlideNotFound(slide_id.clone()),
        })?;

        if current.as_str() == value {
            return Ok(Applied::Unchanged);
        }
        *current = value.to_string();
        Ok(Applied::Changed)
    }

    fn apply_update_style(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        field: &FieldKey,
        patch: &StylePatch,
    ) -> Result<Applied, MutationError> {
        if let Some(attribute) = patch.invalid_attribute() {
            return Err(MutationError::InvalidValue(attribute));
        }
        let slide = Self::find(doc, slide_id)?;
        Self::require_field(slide, field)?;

        let merged: FieldStyle = patch.apply_to(&slide.style_for(field));
        Ok(Applied::from_bool(insert_if_changed(
            &mut slide.styles,
            field,
            merged,
        )))
    }

    fn apply_update_position(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        field: &FieldKey,
        patch: &PositionPatch,
    ) -> Result<Applied, MutationError> {
        if let Some(attribute) = patch.invalid_attribute() {
            return Err(MutationError::InvalidValue(attribute));
        }
        let slide = Self::find(doc, slide_id)?;
        Self::require_field(slide, field)?;

        let merged: Position = patch.apply_to(&slide.position_for(field));
        Ok(Applied::from_bool(insert_if_changed(
            &mut slide.positions,
            field,
            merged,
        )))
    }

    fn apply_update_formatting(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        field: &FieldKey,
        patch: &FormattingPatch,
    ) -> Result<Applied, MutationError> {
        if let Some(attribute) = patch.invalid_attribute() {
            return Err(MutationError::InvalidValue(attribute));
        }
        let slide = Self::find(doc, slide_id)?;
        Self::require_field(slide, field)?;

        let merged: Formatting = patch.apply_to(&slide.formatting_for(field));
        Ok(Applied::from_bool(insert_if_changed(
            &mut slide.formatting,
            field,
            merged,
        )))
    }

    fn apply_add_slide(doc: &mut SlideDocument, slide_id: &SlideId) -> Result<Applied, MutationError> {
        if doc.contains(slide_id) {
            return Err(MutationError::DuplicateSlide(slide_id.clone()));
        }

        let theme = doc.selected_slide().theme.clone();
        let order = doc.next_order();
        doc.slides_mut()
            .push(Slide::new(slide_id.clone(), order).with_theme(theme));
        doc.renumber();
        doc.select(slide_id);
        Ok(Applied::Changed)
    }

    fn apply_delete_slide(doc: &mut SlideDocument, slide_id: &SlideId) -> Result<Applied, MutationError> {
        let index = doc
            .index_of(slide_id)
            .ok_or_else(|| MutationError::SlideNotFound(slide_id.clone()))?;

        if doc.len() <= 1 {
            return Err(MutationError::LastSlide);
        }

        let was_selected = doc.selected_id() == slide_id;
        doc.slides_mut().remove(index);

        if was_selected {
            // Previous slide, falling back to the one that took its place
            let next = if index > 0 { index - 1 } else { 0 };
            doc.select_index(next);
        }

        doc.renumber();
        Ok(Applied::Changed)
    }

    fn apply_move_slide(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        direction: MoveDirection,
    ) -> Result<Applied, MutationError> {
        let index = doc
            .index_of(slide_id)
            .ok_or_else(|| MutationError::SlideNotFound(slide_id.clone()))?;

        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < doc.len() => index + 1,
            _ => return Ok(Applied::Unchanged),
        };

        doc.slides_mut().swap(index, target);
        doc.renumber();
        Ok(Applied::Changed)
    }

    fn apply_add_text_box(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        text_box_id: &TextBoxId,
        content: &str,
    ) -> Result<Applied, MutationError> {
        let slide = Self::find(doc, slide_id)?;
        if slide.text_boxes.iter().any(|tb| &tb.id == text_box_id) {
            return Err(MutationError::DuplicateTextBox(text_box_id.clone()));
        }

        slide.text_boxes.push(TextBox {
            id: text_box_id.clone(),
            content: content.to_string(),
        });

        let key = FieldKey::TextBox(text_box_id.clone());
        slide
            .formatting
            .insert(key.clone(), Formatting::default_for(&key));
        slide.styles.insert(key.clone(), FieldStyle::default_for(&key));
        slide.positions.insert(key.clone(), Position::default_for(&key));
        Ok(Applied::Changed)
    }

    fn apply_remove_text_box(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        text_box_id: &TextBoxId,
    ) -> Result<Applied, MutationError> {
        let slide = Self::find(doc, slide_id)?;
        let index = slide
            .text_boxes
            .iter()
            .position(|tb| &tb.id == text_box_id)
            .ok_or_else(|| MutationError::TextBoxNotFound(text_box_id.clone()))?;

        slide.text_boxes.remove(index);

        let key = FieldKey::TextBox(text_box_id.clone());
        slide.formatting.remove(&key);
        slide.styles.remove(&key);
        slide.positions.remove(&key);
        Ok(Applied::Changed)
    }

    fn set_attribute(
        doc: &mut SlideDocument,
        slide_id: &SlideId,
        set: impl FnOnce(&mut Slide) -> bool,
    ) -> Result<Applied, MutationError> {
        let slide = Self::find(doc, slide_id)?;
        Ok(Applied::from_bool(set(slide)))
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn insert_if_changed<V: PartialEq>(
    map: &mut std::collections::BTreeMap<FieldKey, V>,
    key: &FieldKey,
    value: V,
) -> bool {
    if map.get(key) == Some(&value) {
        false
    } else {
        map.insert(key.clone(), value);
        true
    }
}
