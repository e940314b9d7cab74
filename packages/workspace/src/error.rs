//! Error types for persistence, versions and the remote store

use slidedeck_common::{CommonError, VersionId};
use slidedeck_editor::EditorError;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`RemoteStore`](crate::RemoteStore)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Remote store unavailable")]
    Unavailable,

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Remote store error: {0}")]
    Remote(#[from] StoreError),

    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Presentation not found: {0}")]
    PresentationNotFound(String),

    #[error("Local storage error: {0}")]
    Local(#[from] CommonError),

    #[error("Document error: {0}")]
    Document(#[from] EditorError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No remote presentation in fallback mode")]
    NoRemote,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("You must be signed in to save a version")]
    IdentityRequired,

    #[error("Version not found: {0}")]
    NotFound(VersionId),

    #[error("Version {0} contains no slides")]
    EmptySnapshot(VersionId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<StoreError> for VersionError {
    fn from(e: StoreError) -> Self {
        VersionError::Persistence(PersistenceError::Remote(e))
    }
}

pub type VersionResult<T> = Result<T, VersionError>;
