//! # Slidedeck Editor
//!
//! In-memory document engine for a slide deck.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ codec: surface markup ⇄ stored field value  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: document + mutations + history      │
//! │  - Ordered slides, selection                │
//! │  - Apply mutations with validation          │
//! │  - Bounded undo/redo of full snapshots      │
//! │  - Transient UI context (focus, pickers)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: persistence, versions, listener  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The document is the source of truth** for the editing surface
//! 2. **Every change is a [`Mutation`]**, applied atomically or rejected
//! 3. **History holds deep copies**, never views into the live document
//! 4. **Transient state stays out of history** (focus, open pickers)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use slidedeck_editor::{EditSession, FieldKey, SlideDocument};
//!
//! let mut session = EditSession::new("local", SlideDocument::new());
//! let slide = session.document().selected_id().clone();
//!
//! session.update_field(&slide, FieldKey::Title, "Q3 Plan");
//! session.add_slide();
//! session.undo();
//! ```

mod assistant;
mod audit;
mod document;
mod errors;
mod mutations;
mod session;
mod slide;
mod undo_stack;

pub use assistant::{AssistantPatch, SlideProjection};
pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, NoopAuditSink};
pub use document::{slides_from_json, slides_to_json, SlideDocument};
pub use errors::EditorError;
pub use mutations::{Applied, MoveDirection, Mutation, MutationError};
pub use session::{EditSession, Picker, SessionContext};
pub use slide::{
    ensure_formatting, FieldFormatting, FieldKey, FieldStyle, Formatting, FormattingPatch,
    Position, PositionPatch, Slide, SlideType, StylePatch, TextBox,
};
pub use undo_stack::{HistoryEntry, HistoryStack, DEFAULT_HISTORY_CAPACITY};
