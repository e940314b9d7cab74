//! # Audit boundary
//!
//! Structural edits and version operations emit [`AuditEvent`]s. Recording
//! is fire-and-forget: a sink must never block the caller and must swallow
//! its own failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slidedeck_common::{Identity, PresentationId};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AddSlide,
    DeleteSlide,
    SaveVersion,
    RestoreVersion,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AddSlide => "ADD_SLIDE",
            AuditAction::DeleteSlide => "DELETE_SLIDE",
            AuditAction::SaveVersion => "SAVE_VERSION",
            AuditAction::RestoreVersion => "RESTORE_VERSION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: AuditAction,
    /// User id of the actor, when signed in
    pub actor: Option<String>,
    pub presentation_id: Option<PresentationId>,
    /// Ids of the slides or versions the action touched
    pub target_ids: Vec<String>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, actor: Option<&Identity>) -> Self {
        Self {
            action,
            actor: actor.map(|identity| identity.user_id.clone()),
            presentation_id: None,
            target_ids: Vec::new(),
            at: Utc::now(),
        }
    }

    pub fn in_presentation(mut self, presentation_id: Option<PresentationId>) -> Self {
        self.presentation_id = presentation_id;
        self
    }

    pub fn target(mut self, id: impl Into<String>) -> Self {
        self.target_ids.push(id.into());
        self
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Keeps events in memory (for testing)
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
