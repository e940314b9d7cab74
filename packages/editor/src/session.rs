//! # Edit Session
//!
//! One user's editing session over a [`SlideDocument`]: the document, its
//! undo/redo history, and the transient UI context (focused field, open
//! picker) that never enters the history.
//!
//! Every store operation succeeds against in-memory state. Invalid requests
//! (unknown slide, deleting the last slide) are logged and ignored.

use crate::assistant::{AssistantPatch, SlideProjection};
use crate::audit::{AuditAction, AuditEvent, AuditSink, NoopAuditSink};
use crate::document::SlideDocument;
use crate::mutations::{Applied, MoveDirection, Mutation, MutationError};
use crate::slide::{FieldKey, FormattingPatch, PositionPatch, Slide, SlideType, StylePatch};
use crate::undo_stack::HistoryStack;
use slidedeck_codec::{denormalize, normalize, FieldValue};
use slidedeck_common::{Identity, PresentationId, SlideId, TextBoxId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Toolbar pickers; which one is open is transient state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picker {
    FontFamily,
    FontSize,
    Color,
    Theme,
    Layout,
    Transition,
}

/// Session-wide state passed explicitly instead of living in globals
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /// Signed-in caller, if any
    pub identity: Option<Identity>,

    /// Remote presentation being edited; `None` in fallback mode
    pub presentation_id: Option<PresentationId>,

    /// Language hint handed to the writing assistant
    pub language: String,

    /// Field on the selected slide that currently has focus
    pub focused_field: Option<FieldKey>,

    pub open_picker: Option<Picker>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            identity: None,
            presentation_id: None,
            language: "en".to_string(),
            focused_field: None,
            open_picker: None,
        }
    }
}

/// Single editing session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    document: SlideDocument,

    history: HistoryStack,

    context: SessionContext,

    audit: Arc<dyn AuditSink>,
}

impl EditSession {
    /// Create a session over `document`; its state is the first history entry
    pub fn new(id: impl Into<String>, document: SlideDocument) -> Self {
        let mut history = HistoryStack::new();
        history.reset(document.slides());
        Self {
            id: id.into(),
            document,
            history,
            context: SessionContext::default(),
            audit: Arc::new(NoopAuditSink),
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = HistoryStack::with_capacity(capacity);
        self.history.reset(self.document.slides());
        self
    }

    pub fn with_context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn document(&self) -> &SlideDocument {
        &self.document
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    /// Replace the document wholesale (initial load or forced reload)
    ///
    /// History from before the reload is discarded: its snapshots describe
    /// a document the store no longer holds. The loaded state becomes the
    /// new first entry, so the next edit can be undone back to it.
    pub fn hydrate(&mut self, slides: Vec<Slide>) {
        self.document.replace_slides(slides);
        self.history.reset(self.document.slides());
        self.context.focused_field = None;
        debug!(session = %self.id, slides = self.document.len(), "document hydrated");
    }

    /// Apply a mutation, recording it in history when it changes anything
    pub fn apply(&mut self, mutation: Mutation) -> Result<Applied, MutationError> {
        let applied = mutation.apply(&mut self.document)?;

        if applied.changed() {
            self.history.push(self.document.slides(), mutation.describe());
            self.emit_audit(&mutation);
        }

        Ok(applied)
    }

    /// Apply, logging and swallowing rejections
    fn apply_logged(&mut self, mutation: Mutation) -> bool {
        match self.apply(mutation) {
            Ok(applied) => applied.changed(),
            Err(e) => {
                warn!(session = %self.id, error = %e, "mutation ignored");
                false
            }
        }
    }

    fn emit_audit(&self, mutation: &Mutation) {
        let action = match mutation {
            Mutation::AddSlide { .. } => AuditAction::AddSlide,
            Mutation::DeleteSlide { .. } => AuditAction::DeleteSlide,
            _ => return,
        };

        self.record_audit(action, mutation.slide_id().as_str());
    }

    /// Emit an audit event attributed to this session's identity
    pub fn record_audit(&self, action: AuditAction, target: impl Into<String>) {
        self.audit.record(
            AuditEvent::new(action, self.context.identity.as_ref())
                .in_presentation(self.context.presentation_id.clone())
                .target(target),
        );
    }

    /// Select a slide; unknown ids are a no-op
    pub fn select_slide(&mut self, id: &SlideId) -> bool {
        if self.document.selected_id() == id {
            return true;
        }
        let selected = self.document.select(id);
        if selected {
            self.context.focused_field = None;
        }
        selected
    }

    pub fn update_field(&mut self, slide_id: &SlideId, field: FieldKey, value: impl Into<String>) -> bool {
        self.apply_logged(Mutation::UpdateField {
            slide_id: slide_id.clone(),
            field,
            value: value.into(),
        })
    }

    pub fn update_style(&mut self, slide_id: &SlideId, field: FieldKey, patch: StylePatch) -> bool {
        self.apply_logged(Mutation::UpdateStyle {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    pub fn update_position(&mut self, slide_id: &SlideId, field: FieldKey, patch: PositionPatch) -> bool {
        self.apply_logged(Mutation::UpdatePosition {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    pub fn update_formatting(&mut self, slide_id: &SlideId, field: FieldKey, patch: FormattingPatch) -> bool {
        self.apply_logged(Mutation::UpdateFormatting {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    /// Append a slide after the last one and select it
    pub fn add_slide(&mut self) -> SlideId {
        let slide_id = SlideId::generate();
        self.apply_logged(Mutation::AddSlide {
            slide_id: slide_id.clone(),
        });
        self.context.focused_field = None;
        slide_id
    }

    /// Delete a slide; refused (and logged) for the last remaining slide
    pub fn delete_slide(&mut self, slide_id: &SlideId) -> bool {
        let deleted = self.apply_logged(Mutation::DeleteSlide {
            slide_id: slide_id.clone(),
        });
        if deleted {
            self.context.focused_field = None;
        }
        deleted
    }

    /// Move the selected slide one position
    pub fn move_slide(&mut self, direction: MoveDirection) -> bool {
        let slide_id = self.document.selected_id().clone();
        self.apply_logged(Mutation::MoveSlide {
            slide_id,
            direction,
        })
    }

    /// Renumber `order` densely ahead of a persistence write
    ///
    /// A normalization, not an edit: nothing is pushed to history.
    pub fn reorder_commit(&mut self) -> bool {
        self.document.renumber()
    }

    /// Add an empty text box to a slide
    pub fn add_text_box(&mut self, slide_id: &SlideId) -> Option<TextBoxId> {
        let text_box_id = TextBoxId::generate();
        let added = self.apply_logged(Mutation::AddTextBox {
            slide_id: slide_id.clone(),
            text_box_id: text_box_id.clone(),
            content: String::new(),
        });
        added.then_some(text_box_id)
    }

    pub fn remove_text_box(&mut self, slide_id: &SlideId, text_box_id: &TextBoxId) -> bool {
        let removed = self.apply_logged(Mutation::RemoveTextBox {
            slide_id: slide_id.clone(),
            text_box_id: text_box_id.clone(),
        });
        if removed && self.context.focused_field == Some(FieldKey::TextBox(text_box_id.clone())) {
            self.context.focused_field = None;
        }
        removed
    }

    pub fn set_theme(&mut self, slide_id: &SlideId, theme: Option<String>) -> bool {
        self.apply_logged(Mutation::SetTheme {
            slide_id: slide_id.clone(),
            theme,
        })
    }

    pub fn set_slide_type(&mut self, slide_id: &SlideId, slide_type: SlideType) -> bool {
        self.apply_logged(Mutation::SetSlideType {
            slide_id: slide_id.clone(),
            slide_type,
        })
    }

    /// Step back in history
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(slides) => {
                self.document.replace_slides(slides);
                true
            }
            None => false,
        }
    }

    /// Step forward in history
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(slides) => {
                self.document.replace_slides(slides);
                true
            }
            None => false,
        }
    }

    // Editing-surface contract

    /// The surface for `field` on the selected slide reported new markup
    pub fn on_content_changed(&mut self, field: FieldKey, raw_markup: &str) -> bool {
        let value = normalize(raw_markup, field.placeholder());
        let slide_id = self.document.selected_id().clone();
        self.update_field(&slide_id, field, value.into_string())
    }

    pub fn on_field_focused(&mut self, field: FieldKey) {
        self.context.focused_field = Some(field);
        self.context.open_picker = None;
    }

    pub fn on_field_blurred(&mut self, field: &FieldKey) {
        if self.context.focused_field.as_ref() == Some(field) {
            self.context.focused_field = None;
        }
    }

    /// Markup to render into the surface for `field` on the selected slide
    pub fn surface_content(&self, field: &FieldKey) -> Option<String> {
        self.document
            .selected_slide()
            .field(field)
            .map(|value| denormalize(&FieldValue::from(value)))
    }

    pub fn open_picker(&mut self, picker: Picker) {
        self.context.open_picker = Some(picker);
    }

    pub fn close_picker(&mut self) {
        self.context.open_picker = None;
    }

    // Assistant boundary

    fn project(&self, slide: &Slide) -> SlideProjection {
        SlideProjection {
            id: slide.id.clone(),
            title: slide.title.clone(),
            content: slide.subtitle.clone(),
            notes: slide.notes.clone(),
            language: self.context.language.clone(),
        }
    }

    /// Projection of every slide, in document order
    pub fn projection(&self) -> Vec<SlideProjection> {
        self.document
            .slides()
            .iter()
            .map(|slide| self.project(slide))
            .collect()
    }

    pub fn selected_projection(&self) -> SlideProjection {
        self.project(self.document.selected_slide())
    }

    /// Apply an assistant suggestion through the ordinary field updates
    pub fn apply_assistant_patch(&mut self, slide_id: &SlideId, patch: AssistantPatch) -> bool {
        let mut changed = false;
        if let Some(content) = patch.content {
            changed |= self.update_field(slide_id, FieldKey::Subtitle, content);
        }
        if let Some(notes) = patch.notes {
            changed |= self.update_field(slide_id, FieldKey::Notes, notes);
        }
        changed
    }
}
