//! # Presentation Session
//!
//! Everything one open presentation needs, composed:
//!
//! ```text
//! surface ─▶ EditSession ─▶ WriteQueue ─▶ PersistenceAdapter ─▶ remote/local
//!               │   ▲
//!               │   └── LiveListener (comments, versions, forced reloads)
//!               └─────▶ VersionManager ─▶ restore ─▶ reload
//! ```
//!
//! Mutations apply to the in-memory document synchronously and always
//! succeed or are ignored with a warning. In remote mode each change is then
//! queued for its slide (fire-and-forget). Fallback mode writes only on
//! [`save`](PresentationSession::save), as one whole-document replace.
//! Persistence and version failures end up on the [`StatusBoard`], never in
//! the document.
//!
//! Remote writes are held back until the document has been loaded from the
//! store at least once and the caller is signed in. Until then edits stay
//! local; a placeholder document never reaches the shared store.

use crate::audit::RemoteAuditSink;
use crate::config::SessionConfig;
use crate::error::{PersistenceError, VersionError};
use crate::listener::LiveListener;
use crate::persistence::{with_timeout, PersistenceAdapter, PersistenceMode};
use crate::records::{Comment, PresentationRecord, PresentationStatus, VersionRecord};
use crate::remote::{paths, RemoteStore};
use crate::status::StatusBoard;
use crate::versions::VersionManager;
use crate::write_queue::{SlideWrite, WriteQueue};
use chrono::Utc;
use slidedeck_common::{CommentId, Identity, PresentationId, SlideId, TextBoxId, VersionId};
use slidedeck_editor::{
    AssistantPatch, AuditAction, EditSession, FieldKey, FormattingPatch, HistoryStack, MoveDirection,
    Mutation, Picker, PositionPatch, SessionContext, SlideDocument, SlideProjection, SlideType,
    StylePatch,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

pub struct PresentationSession {
    edit: EditSession,
    adapter: Arc<PersistenceAdapter>,
    writes: Option<WriteQueue>,
    versions: Option<VersionManager>,
    listener: Option<LiveListener>,
    status: StatusBoard,
    metadata: Option<PresentationRecord>,

    /// Slide ids known to exist in the remote store
    persisted: HashSet<SlideId>,

    /// Set by the first successful load
    hydrated: bool,
}

impl PresentationSession {
    /// Open a presentation and hydrate it
    ///
    /// A failed load leaves a single blank slide and posts an error status.
    /// That blank slide is never written remotely; call
    /// [`reload`](Self::reload) once the store is reachable.
    pub async fn open(adapter: PersistenceAdapter, identity: Option<Identity>, config: &SessionConfig) -> Self {
        let handle = Handle::current();
        let adapter = Arc::new(adapter);
        let status = StatusBoard::new(config.status_ttl());

        let context = SessionContext {
            identity,
            presentation_id: adapter.presentation_id().cloned(),
            language: config.default_language.clone(),
            ..Default::default()
        };

        let session_id = format!("session-{}", uuid::Uuid::now_v7().simple());
        let mut edit = EditSession::new(session_id, SlideDocument::new())
            .with_history_capacity(config.history_capacity)
            .with_context(context);

        let remote = (
            adapter.remote_store(),
            adapter.presentation_id().cloned(),
            adapter.cipher().cloned(),
        );
        let (writes, versions, listener) = match remote {
            (Some(store), Some(presentation_id), Some(cipher)) => {
                edit = edit.with_audit_sink(Arc::new(RemoteAuditSink::new(Arc::clone(&store), handle.clone())));
                let writes = WriteQueue::new(Arc::clone(&adapter), status.clone(), handle);
                let versions = VersionManager::new(
                    Arc::clone(&store),
                    presentation_id.clone(),
                    cipher.clone(),
                    adapter.timeout(),
                );
                let listener = LiveListener::start(store, &presentation_id, cipher);
                (Some(writes), Some(versions), Some(listener))
            }
            _ => (None, None, None),
        };

        let mut session = Self {
            edit,
            adapter,
            writes,
            versions,
            listener,
            status,
            metadata: None,
            persisted: HashSet::new(),
            hydrated: false,
        };
        session.reload().await;
        session
    }

    pub fn document(&self) -> &SlideDocument {
        self.edit.document()
    }

    pub fn history(&self) -> &HistoryStack {
        self.edit.history()
    }

    pub fn context(&self) -> &SessionContext {
        self.edit.context()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn metadata(&self) -> Option<&PresentationRecord> {
        self.metadata.as_ref()
    }

    pub fn mode(&self) -> PersistenceMode {
        self.adapter.mode()
    }

    pub fn presentation_id(&self) -> Option<&PresentationId> {
        self.adapter.presentation_id()
    }

    /// Whether a load from the adapter has succeeded
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Replace the document with what the adapter holds
    ///
    /// On failure the live document is left exactly as it was.
    pub async fn reload(&mut self) -> bool {
        match self.adapter.load_document().await {
            Ok(loaded) => {
                if self.mode() == PersistenceMode::Remote {
                    self.persisted = loaded.slides.iter().map(|s| s.id.clone()).collect();
                }
                if loaded.presentation.is_some() {
                    self.metadata = loaded.presentation;
                }
                self.edit.hydrate(loaded.slides);
                self.hydrated = true;
                if let Some(listener) = &mut self.listener {
                    listener.disarm();
                }
                true
            }
            Err(e) => {
                error!(error = %e, "failed to load presentation");
                self.status.error("Failed to load presentation");
                false
            }
        }
    }

    // Editing

    /// Apply a mutation and queue its persistence
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        let structural = mutation.is_structural();
        let slide_id = mutation.slide_id().clone();

        match self.edit.apply(mutation) {
            Ok(applied) if applied.changed() => {
                if structural {
                    self.persist_all();
                } else {
                    self.persist_slide(&slide_id);
                }
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(slide_id = %slide_id, error = %e, "mutation ignored");
                false
            }
        }
    }

    pub fn select_slide(&mut self, slide_id: &SlideId) -> bool {
        self.edit.select_slide(slide_id)
    }

    pub fn update_field(&mut self, slide_id: &SlideId, field: FieldKey, value: impl Into<String>) -> bool {
        self.apply(Mutation::UpdateField {
            slide_id: slide_id.clone(),
            field,
            value: value.into(),
        })
    }

    pub fn update_style(&mut self, slide_id: &SlideId, field: FieldKey, patch: StylePatch) -> bool {
        self.apply(Mutation::UpdateStyle {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    pub fn update_position(&mut self, slide_id: &SlideId, field: FieldKey, patch: PositionPatch) -> bool {
        self.apply(Mutation::UpdatePosition {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    pub fn update_formatting(&mut self, slide_id: &SlideId, field: FieldKey, patch: FormattingPatch) -> bool {
        self.apply(Mutation::UpdateFormatting {
            slide_id: slide_id.clone(),
            field,
            patch,
        })
    }

    /// Append a slide, select it, and return its id
    pub fn add_slide(&mut self) -> SlideId {
        let slide_id = SlideId::generate();
        self.apply(Mutation::AddSlide {
            slide_id: slide_id.clone(),
        });
        slide_id
    }

    pub fn delete_slide(&mut self, slide_id: &SlideId) -> bool {
        self.apply(Mutation::DeleteSlide {
            slide_id: slide_id.clone(),
        })
    }

    /// Move the selected slide one position
    pub fn move_slide(&mut self, direction: MoveDirection) -> bool {
        let slide_id = self.edit.document().selected_id().clone();
        self.apply(Mutation::MoveSlide { slide_id, direction })
    }

    pub fn add_text_box(&mut self, slide_id: &SlideId) -> Option<TextBoxId> {
        let text_box_id = self.edit.add_text_box(slide_id)?;
        self.persist_slide(slide_id);
        Some(text_box_id)
    }

    pub fn remove_text_box(&mut self, slide_id: &SlideId, text_box_id: &TextBoxId) -> bool {
        let removed = self.edit.remove_text_box(slide_id, text_box_id);
        if removed {
            self.persist_slide(slide_id);
        }
        removed
    }

    pub fn set_theme(&mut self, slide_id: &SlideId, theme: Option<String>) -> bool {
        self.apply(Mutation::SetTheme {
            slide_id: slide_id.clone(),
            theme,
        })
    }

    pub fn set_slide_type(&mut self, slide_id: &SlideId, slide_type: SlideType) -> bool {
        self.apply(Mutation::SetSlideType {
            slide_id: slide_id.clone(),
            slide_type,
        })
    }

    pub fn set_layout(&mut self, slide_id: &SlideId, layout: impl Into<String>) -> bool {
        self.apply(Mutation::SetLayout {
            slide_id: slide_id.clone(),
            layout: layout.into(),
        })
    }

    pub fn set_transition(&mut self, slide_id: &SlideId, transition: impl Into<String>) -> bool {
        self.apply(Mutation::SetTransition {
            slide_id: slide_id.clone(),
            transition: transition.into(),
        })
    }

    pub fn set_background(&mut self, slide_id: &SlideId, background: Option<String>) -> bool {
        self.apply(Mutation::SetBackground {
            slide_id: slide_id.clone(),
            background,
        })
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.edit.undo();
        if undone {
            self.persist_all();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.edit.redo();
        if redone {
            self.persist_all();
        }
        redone
    }

    // Editing-surface contract

    pub fn on_content_changed(&mut self, field: FieldKey, raw_markup: &str) -> bool {
        let changed = self.edit.on_content_changed(field, raw_markup);
        if changed {
            let selected = self.edit.document().selected_id().clone();
            self.persist_slide(&selected);
        }
        changed
    }

    pub fn on_field_focused(&mut self, field: FieldKey) {
        self.edit.on_field_focused(field);
    }

    pub fn on_field_blurred(&mut self, field: &FieldKey) {
        self.edit.on_field_blurred(field);
    }

    pub fn surface_content(&self, field: &FieldKey) -> Option<String> {
        self.edit.surface_content(field)
    }

    pub fn open_picker(&mut self, picker: Picker) {
        self.edit.open_picker(picker);
    }

    pub fn close_picker(&mut self) {
        self.edit.close_picker();
    }

    // Assistant boundary

    pub fn projection(&self) -> Vec<SlideProjection> {
        self.edit.projection()
    }

    pub fn apply_assistant_patch(&mut self, slide_id: &SlideId, patch: AssistantPatch) -> bool {
        let changed = self.edit.apply_assistant_patch(slide_id, patch);
        if changed {
            self.persist_slide(slide_id);
        }
        changed
    }

    // Presentation metadata, written on the next save

    pub fn rename(&mut self, title: impl Into<String>) -> bool {
        match &mut self.metadata {
            Some(metadata) => {
                metadata.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, status: PresentationStatus) -> bool {
        match &mut self.metadata {
            Some(metadata) => {
                metadata.status = status;
                true
            }
            None => false,
        }
    }

    // Persistence

    /// Remote writes need a loaded document and a signed-in caller
    fn remote_writes_allowed(&self) -> bool {
        if self.writes.is_none() {
            return false;
        }
        if !self.hydrated {
            warn!("remote write held back: presentation not loaded");
            self.status.error("Presentation not loaded; changes are kept locally");
            return false;
        }
        if self.edit.context().identity.is_none() {
            warn!("remote write held back: no identity");
            self.status.error("You must be signed in to save");
            return false;
        }
        true
    }

    fn persist_slide(&mut self, slide_id: &SlideId) {
        if !self.remote_writes_allowed() {
            return;
        }
        let Some(writes) = &self.writes else {
            return;
        };
        if let Some(slide) = self.edit.document().slide(slide_id) {
            writes.enqueue(slide_id.clone(), SlideWrite::Upsert(slide.clone()));
            self.persisted.insert(slide_id.clone());
        }
    }

    /// Queue upserts for every slide and deletes for slides that vanished
    fn persist_all(&mut self) {
        if !self.remote_writes_allowed() {
            return;
        }
        let Some(writes) = &self.writes else {
            return;
        };
        let live: HashSet<SlideId> = self.edit.document().slides().iter().map(|s| s.id.clone()).collect();

        for gone in self.persisted.difference(&live) {
            writes.enqueue(gone.clone(), SlideWrite::Delete);
        }
        for slide in self.edit.document().slides() {
            writes.enqueue(slide.id.clone(), SlideWrite::Upsert(slide.clone()));
        }
        self.persisted = live;
    }

    /// Wait for queued slide writes
    pub async fn flush(&self) {
        if let Some(writes) = &self.writes {
            writes.flush().await;
        }
    }

    /// Renumber, then write the whole document
    pub async fn save(&mut self) -> bool {
        if self.mode() == PersistenceMode::Remote {
            if self.edit.context().identity.is_none() {
                warn!("save attempted without identity");
                self.status.error("You must be signed in to save");
                return false;
            }
            if !self.hydrated {
                warn!("save attempted before the presentation loaded");
                self.status.error("Presentation not loaded; reload before saving");
                return false;
            }
        }

        self.edit.reorder_commit();
        self.flush().await;

        let slides = self.edit.document().snapshot();
        match self.adapter.save_document(&slides, self.metadata.as_ref()).await {
            Ok(()) => {
                if self.mode() == PersistenceMode::Remote {
                    self.persisted.extend(slides.iter().map(|s| s.id.clone()));
                }
                self.status.success("Saved");
                true
            }
            Err(e) => {
                error!(error = %e, "save failed");
                self.status.error("Failed to save");
                false
            }
        }
    }

    // Versions

    pub async fn save_version(&mut self, summary: Option<&str>) -> Option<VersionRecord> {
        if self.versions.is_none() {
            self.status.error("Versions need a saved presentation");
            return None;
        }
        if !self.hydrated {
            self.status.error("Presentation not loaded; reload before saving a version");
            return None;
        }

        // Snapshot orders must match what the store holds
        if self.edit.reorder_commit() {
            self.persist_all();
            self.flush().await;
        }

        let identity = self.edit.context().identity.clone();
        let versions = self.versions.as_ref()?;
        let result = versions
            .save_version(identity.as_ref(), self.edit.document().slides(), summary)
            .await;

        match result {
            Ok(record) => {
                self.edit.record_audit(AuditAction::SaveVersion, record.id.as_str());
                self.status.success("Version saved");
                Some(record)
            }
            Err(VersionError::IdentityRequired) => {
                warn!("version snapshot attempted without identity");
                self.status.error(VersionError::IdentityRequired.to_string());
                None
            }
            Err(e) => {
                error!(error = %e, "failed to save version");
                self.status.error("Failed to save version");
                None
            }
        }
    }

    /// Restore a snapshot, then reload and select its first slide
    ///
    /// Unknown and empty snapshots are logged and abort with the live
    /// document untouched. History is cleared by the reload.
    pub async fn restore_version(&mut self, version_id: &VersionId) -> bool {
        let Some(versions) = &self.versions else {
            self.status.error("Versions need a saved presentation");
            return false;
        };

        if let Some(writes) = &self.writes {
            writes.flush().await;
        }
        let result = versions.restore_version(version_id).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(version = %version_id, error = %e, "restore aborted");
                self.status.error("Could not restore version");
                return false;
            }
        };

        self.edit.record_audit(AuditAction::RestoreVersion, version_id.as_str());
        for deleted in &outcome.deleted {
            self.persisted.remove(deleted);
        }

        if !self.reload().await {
            return false;
        }
        self.edit.select_slide(&outcome.first_slide);
        info!(version = %version_id, slides = outcome.restored, "restored");
        self.status.success("Version restored");
        true
    }

    /// Versions from the live feed, newest first
    pub fn versions(&self) -> Vec<VersionRecord> {
        self.listener.as_ref().map(LiveListener::versions).unwrap_or_default()
    }

    // Comments

    /// Comments from the live feed, newest first
    pub fn comments(&self) -> Vec<Comment> {
        self.listener.as_ref().map(LiveListener::comments).unwrap_or_default()
    }

    pub async fn post_comment(&self, text: &str) -> Option<CommentId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let Some(identity) = &self.edit.context().identity else {
            self.status.error("You must be signed in to comment");
            return None;
        };
        let (Some(store), Some(presentation_id), Some(cipher)) = (
            self.adapter.remote_store(),
            self.adapter.presentation_id(),
            self.adapter.cipher(),
        ) else {
            self.status.error("Comments need a saved presentation");
            return None;
        };

        let fields = Comment::new_fields(identity, text, cipher, Utc::now());
        let collection = paths::comments(presentation_id);
        match with_timeout(self.adapter.timeout(), store.add(&collection, fields)).await {
            Ok(id) => Some(CommentId::new(id)),
            Err(e) => {
                error!(error = %e, "failed to post comment");
                self.status.error("Failed to post comment");
                None
            }
        }
    }

    // Live slide feed

    /// Allow the next remote slide snapshot to replace the document
    pub fn request_remote_reload(&mut self) {
        if let Some(listener) = &mut self.listener {
            listener.arm_reload();
        }
    }

    /// Hydrate from the live feed if a reload was requested
    pub fn apply_remote_slides(&mut self) -> bool {
        let Some(slides) = self.listener.as_mut().and_then(LiveListener::take_slides) else {
            return false;
        };
        self.persisted = slides.iter().map(|s| s.id.clone()).collect();
        self.edit.hydrate(slides);
        self.hydrated = true;
        true
    }

    /// Create a remote presentation owned by `owner`
    pub async fn create_remote(
        store: &dyn RemoteStore,
        owner: &Identity,
        title: &str,
        config: &SessionConfig,
    ) -> Result<PresentationId, PersistenceError> {
        let record = PresentationRecord::new(title, owner.user_id.clone());
        PersistenceAdapter::create_presentation(store, &record, config.remote_timeout()).await
    }
}
