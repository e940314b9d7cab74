//! # Remote document store
//!
//! The read/write contract of the hosted document database: collections of
//! JSON documents addressed by slash-separated paths, merge upserts, atomic
//! batches, ordered listings and live change subscriptions.
//!
//! ```text
//! presentations/{presentationId}
//! presentations/{presentationId}/slides/{slideId}
//! presentations/{presentationId}/versions/{versionId}
//! presentations/{presentationId}/comments/{commentId}
//! auditLogs/{eventId}
//! ```
//!
//! [`InMemoryRemoteStore`] implements the contract for tests and offline
//! demos, with an offline switch and artificial latency for failure
//! injection.

use crate::error::StoreError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, trace};

/// Top-level fields of one remote document
pub type Fields = Map<String, Value>;

/// A document together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDoc {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Listing order; ties keep arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    SetMerge { path: String, fields: Fields },
    Delete { path: String },
}

/// Writes applied all-or-nothing by [`RemoteStore::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_merge(&mut self, path: impl Into<String>, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::SetMerge {
            path: path.into(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

/// Path builders for the collections this workspace uses
pub mod paths {
    use slidedeck_common::{PresentationId, SlideId, VersionId};

    pub const PRESENTATIONS: &str = "presentations";
    pub const AUDIT_LOGS: &str = "auditLogs";

    pub fn presentation(id: &PresentationId) -> String {
        format!("{}/{}", PRESENTATIONS, id)
    }

    pub fn slides(id: &PresentationId) -> String {
        format!("{}/slides", presentation(id))
    }

    pub fn slide(id: &PresentationId, slide: &SlideId) -> String {
        format!("{}/{}", slides(id), slide)
    }

    pub fn versions(id: &PresentationId) -> String {
        format!("{}/versions", presentation(id))
    }

    pub fn version(id: &PresentationId, version: &VersionId) -> String {
        format!("{}/{}", versions(id), version)
    }

    pub fn comments(id: &PresentationId) -> String {
        format!("{}/comments", presentation(id))
    }
}

/// Split a document path into `(collection, id)`
pub fn split_path(path: &str) -> Result<(&str, &str), StoreError> {
    match path.rsplit_once('/') {
        Some((collection, id)) if !collection.is_empty() && !id.is_empty() => Ok((collection, id)),
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}

/// Hosted document database
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one document
    async fn get(&self, path: &str) -> Result<Option<Fields>, StoreError>;

    /// Upsert, merging top-level fields into an existing document
    async fn set_merge(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// List a collection, in arrival order unless `order` is given
    async fn list(&self, collection: &str, order: Option<OrderBy>) -> Result<Vec<RemoteDoc>, StoreError>;

    /// Append a document under a store-generated id
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Apply every write in the batch, or none
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Ordered snapshot of the collection now and after every change
    fn subscribe(&self, collection: &str, order: Option<OrderBy>) -> BoxStream<'static, Vec<RemoteDoc>>;
}

#[derive(Debug, Default)]
struct Collections {
    docs: HashMap<String, Vec<RemoteDoc>>,
}

impl Collections {
    fn get(&self, collection: &str, id: &str) -> Option<&RemoteDoc> {
        self.docs.get(collection)?.iter().find(|d| d.id == id)
    }

    fn merge(&mut self, collection: &str, id: &str, fields: Fields) {
        let docs = self.docs.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields.extend(fields),
            None => docs.push(RemoteDoc {
                id: id.to_string(),
                fields,
            }),
        }
    }

    fn remove(&mut self, collection: &str, id: &str) -> bool {
        match self.docs.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() != before
            }
            None => false,
        }
    }

    fn list(&self, collection: &str, order: Option<&OrderBy>) -> Vec<RemoteDoc> {
        let mut docs = self.docs.get(collection).cloned().unwrap_or_default();
        if let Some(order) = order {
            // Stable sort: ties stay in arrival order either way
            docs.sort_by(|a, b| {
                let ordering = compare_values(a.fields.get(&order.field), b.fields.get(&order.field));
                match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        docs
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[derive(Debug)]
struct Shared {
    collections: Mutex<Collections>,
    revision: watch::Sender<u64>,
    offline: AtomicBool,
    latency: Duration,
    writes: AtomicUsize,
}

impl Shared {
    fn collections(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

/// In-process [`RemoteStore`]
///
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryRemoteStore {
    shared: Arc<Shared>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Every call sleeps for `latency` before touching data
    pub fn with_latency(latency: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                collections: Mutex::new(Collections::default()),
                revision,
                offline: AtomicBool::new(false),
                latency,
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, AtomicOrdering::SeqCst);
        debug!(offline, "remote store availability changed");
    }

    pub fn is_offline(&self) -> bool {
        self.shared.offline.load(AtomicOrdering::SeqCst)
    }

    /// Number of document writes applied so far
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(AtomicOrdering::SeqCst)
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.shared
            .collections()
            .docs
            .get(collection)
            .map_or(0, Vec::len)
    }

    async fn guard(&self) -> Result<(), StoreError> {
        if !self.shared.latency.is_zero() {
            tokio::time::sleep(self.shared.latency).await;
        }
        if self.is_offline() {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    fn record_writes(&self, n: usize) {
        self.shared.writes.fetch_add(n, AtomicOrdering::SeqCst);
        self.shared.notify();
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn get(&self, path: &str) -> Result<Option<Fields>, StoreError> {
        self.guard().await?;
        let (collection, id) = split_path(path)?;
        Ok(self
            .shared
            .collections()
            .get(collection, id)
            .map(|doc| doc.fields.clone()))
    }

    async fn set_merge(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        self.guard().await?;
        let (collection, id) = split_path(path)?;
        self.shared.collections().merge(collection, id, fields);
        trace!(path, "document merged");
        self.record_writes(1);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.guard().await?;
        let (collection, id) = split_path(path)?;
        if self.shared.collections().remove(collection, id) {
            trace!(path, "document deleted");
            self.record_writes(1);
        }
        Ok(())
    }

    async fn list(&self, collection: &str, order: Option<OrderBy>) -> Result<Vec<RemoteDoc>, StoreError> {
        self.guard().await?;
        Ok(self.shared.collections().list(collection, order.as_ref()))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.guard().await?;
        let id = uuid::Uuid::now_v7().simple().to_string();
        self.shared.collections().merge(collection, &id, fields);
        self.record_writes(1);
        Ok(id)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.guard().await?;

        // Validate every path before applying anything
        for op in batch.ops() {
            let path = match op {
                WriteOp::SetMerge { path, .. } | WriteOp::Delete { path } => path,
            };
            split_path(path)?;
        }

        let applied = batch.len();
        {
            let mut collections = self.shared.collections();
            for op in batch.ops {
                match op {
                    WriteOp::SetMerge { path, fields } => {
                        let (collection, id) = split_path(&path)?;
                        collections.merge(collection, id, fields);
                    }
                    WriteOp::Delete { path } => {
                        let (collection, id) = split_path(&path)?;
                        collections.remove(collection, id);
                    }
                }
            }
        }

        debug!(ops = applied, "batch committed");
        self.record_writes(applied);
        Ok(())
    }

    fn subscribe(&self, collection: &str, order: Option<OrderBy>) -> BoxStream<'static, Vec<RemoteDoc>> {
        let shared = Arc::clone(&self.shared);
        let collection = collection.to_string();
        WatchStream::new(self.shared.revision.subscribe())
            .map(move |_| shared.collections().list(&collection, order.as_ref()))
            .boxed()
    }
}
