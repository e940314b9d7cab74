//! # Slidedeck Workspace
//!
//! Persistence, versioning and live sync around an
//! [`EditSession`](slidedeck_editor::EditSession).
//!
//! A [`PresentationSession`] runs in one of two modes:
//!
//! - **Remote**: slides live in a [`RemoteStore`] under
//!   `presentations/{id}/slides`, each change queued per slide; versions,
//!   comments and audit events are available
//! - **Fallback**: the whole deck is one blob in a
//!   [`KeyValueStorage`](slidedeck_common::KeyValueStorage), written on save
//!
//! Text fields are encrypted with the session's
//! [`FieldCipher`](slidedeck_codec::FieldCipher) before they leave memory.

mod audit;
mod config;
mod error;
mod listener;
mod persistence;
mod presentation;
mod records;
mod remote;
mod status;
mod versions;
mod write_queue;

pub use audit::RemoteAuditSink;
pub use config::{SessionConfig, DEFAULT_LOCAL_KEY_PREFIX};
pub use error::{PersistenceError, PersistenceResult, StoreError, VersionError, VersionResult};
pub use listener::LiveListener;
pub use persistence::{LoadedDocument, PersistenceAdapter, PersistenceMode};
pub use presentation::PresentationSession;
pub use records::{
    format_timestamp, Comment, PresentationRecord, PresentationStatus, SlideRecord, SnapshotSlide, VersionRecord,
};
pub use remote::{paths, split_path, Fields, InMemoryRemoteStore, OrderBy, RemoteDoc, RemoteStore, SortDirection, WriteBatch, WriteOp};
pub use status::{StatusBoard, StatusKind, StatusMessage};
pub use versions::{RestoreOutcome, VersionManager};
pub use write_queue::{SlideWrite, WriteQueue};
