//! # Persistence Adapter
//!
//! Reads and writes slide documents. The mode is fixed when the adapter is
//! built:
//!
//! - **Remote**: a presentation record plus one record per slide in the
//!   remote store. Slide bodies and notes are encrypted on the way out and
//!   decrypted (with raw-text fallback) on the way in. Writes are merge
//!   upserts keyed by slide id, so repeating a save changes nothing.
//! - **Fallback**: no remote identity. The whole slide sequence is one JSON
//!   blob in local storage, replaced wholesale on save.
//!
//! A failed load returns an error before anything is handed to the caller,
//! so the live document is never partially overwritten.

use crate::error::{PersistenceError, PersistenceResult, StoreError};
use crate::records::{format_timestamp, PresentationRecord, SlideRecord};
use crate::remote::{paths, OrderBy, RemoteStore, WriteBatch};
use chrono::Utc;
use slidedeck_codec::FieldCipher;
use slidedeck_common::{KeyValueStorage, PresentationId, SlideId};
use slidedeck_editor::{slides_from_json, slides_to_json, EditorError, Slide};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run a remote call, turning an elapsed deadline into an ordinary failure
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> PersistenceResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(PersistenceError::Timeout(timeout)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    Remote,
    Fallback,
}

/// Result of a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Presentation metadata; `None` in fallback mode
    pub presentation: Option<PresentationRecord>,

    /// Slides sorted by `order`, ties in arrival order
    pub slides: Vec<Slide>,
}

enum Backend {
    Remote {
        store: Arc<dyn RemoteStore>,
        presentation_id: PresentationId,
        cipher: FieldCipher,
    },
    Fallback {
        storage: Arc<dyn KeyValueStorage>,
        key: String,
    },
}

pub struct PersistenceAdapter {
    backend: Backend,
    timeout: Duration,
}

impl PersistenceAdapter {
    /// Adapter for a presentation held in the remote store
    pub fn remote(
        store: Arc<dyn RemoteStore>,
        presentation_id: PresentationId,
        cipher: FieldCipher,
        timeout: Duration,
    ) -> Self {
        Self {
            backend: Backend::Remote {
                store,
                presentation_id,
                cipher,
            },
            timeout,
        }
    }

    /// Adapter for a local-only deck stored under `key`
    ///
    /// Local blobs are plain JSON, so no cipher is involved.
    pub fn fallback(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            backend: Backend::Fallback {
                storage,
                key: key.into(),
            },
            timeout: Duration::MAX,
        }
    }

    /// Create a presentation record and return its id
    pub async fn create_presentation(
        store: &dyn RemoteStore,
        record: &PresentationRecord,
        timeout: Duration,
    ) -> PersistenceResult<PresentationId> {
        let id = PresentationId::generate();
        let mut fields = record.to_fields();
        fields.insert("updatedAt".into(), format_timestamp(Utc::now()).into());
        with_timeout(timeout, store.set_merge(&paths::presentation(&id), fields)).await?;
        info!(presentation = %id, "presentation created");
        Ok(id)
    }

    pub fn mode(&self) -> PersistenceMode {
        match self.backend {
            Backend::Remote { .. } => PersistenceMode::Remote,
            Backend::Fallback { .. } => PersistenceMode::Fallback,
        }
    }

    pub fn presentation_id(&self) -> Option<&PresentationId> {
        match &self.backend {
            Backend::Remote { presentation_id, .. } => Some(presentation_id),
            Backend::Fallback { .. } => None,
        }
    }

    pub fn remote_store(&self) -> Option<Arc<dyn RemoteStore>> {
        match &self.backend {
            Backend::Remote { store, .. } => Some(Arc::clone(store)),
            Backend::Fallback { .. } => None,
        }
    }

    /// Field cipher; `None` in fallback mode
    pub fn cipher(&self) -> Option<&FieldCipher> {
        match &self.backend {
            Backend::Remote { cipher, .. } => Some(cipher),
            Backend::Fallback { .. } => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the document
    pub async fn load_document(&self) -> PersistenceResult<LoadedDocument> {
        match &self.backend {
            Backend::Remote {
                store,
                presentation_id,
                cipher,
            } => {
                let presentation = with_timeout(self.timeout, store.get(&paths::presentation(presentation_id)))
                    .await?
                    .ok_or_else(|| PersistenceError::PresentationNotFound(presentation_id.to_string()))?;

                let docs = with_timeout(
                    self.timeout,
                    store.list(&paths::slides(presentation_id), Some(OrderBy::asc("order"))),
                )
                .await?;

                let mut slides: Vec<Slide> = docs
                    .into_iter()
                    .map(|doc| SlideRecord::from_fields(&doc.fields).into_slide(SlideId::new(doc.id), cipher))
                    .collect();
                slides.sort_by_key(|s| s.order);

                debug!(presentation = %presentation_id, slides = slides.len(), "document loaded");
                Ok(LoadedDocument {
                    presentation: Some(PresentationRecord::from_fields(&presentation)),
                    slides,
                })
            }

            Backend::Fallback { storage, key } => {
                let slides = match storage.get(key)? {
                    Some(json) => match slides_from_json(&json) {
                        Ok(slides) => slides,
                        Err(EditorError::EmptyDocument) => Vec::new(),
                        Err(e) => return Err(e.into()),
                    },
                    None => {
                        debug!(key = %key, "no local deck yet");
                        Vec::new()
                    }
                };
                Ok(LoadedDocument {
                    presentation: None,
                    slides,
                })
            }
        }
    }

    /// Write the whole document
    ///
    /// Remote: upserts the presentation record (when given) and every slide
    /// in one batch. Slides missing from `slides` are left alone; deletes go
    /// through [`delete_slide`](Self::delete_slide). Fallback: replaces the
    /// stored blob.
    pub async fn save_document(
        &self,
        slides: &[Slide],
        presentation: Option<&PresentationRecord>,
    ) -> PersistenceResult<()> {
        match &self.backend {
            Backend::Remote {
                store,
                presentation_id,
                cipher,
            } => {
                let mut batch = WriteBatch::new();
                if let Some(record) = presentation {
                    batch.set_merge(paths::presentation(presentation_id), record.save_fields(Utc::now()));
                }
                for slide in slides {
                    batch.set_merge(
                        paths::slide(presentation_id, &slide.id),
                        SlideRecord::from_slide(slide, cipher).to_fields(),
                    );
                }
                with_timeout(self.timeout, store.commit(batch)).await?;
                info!(presentation = %presentation_id, slides = slides.len(), "document saved");
                Ok(())
            }

            Backend::Fallback { storage, key } => {
                storage.set(key, &slides_to_json(slides)?)?;
                info!(key = %key, slides = slides.len(), "local deck saved");
                Ok(())
            }
        }
    }

    /// Upsert one slide
    pub async fn save_slide(&self, slide: &Slide) -> PersistenceResult<()> {
        let (store, presentation_id, cipher) = self.require_remote()?;
        let fields = SlideRecord::from_slide(slide, cipher).to_fields();
        with_timeout(self.timeout, store.set_merge(&paths::slide(presentation_id, &slide.id), fields)).await
    }

    /// Delete one slide record
    pub async fn delete_slide(&self, slide_id: &SlideId) -> PersistenceResult<()> {
        let (store, presentation_id, _) = self.require_remote()?;
        with_timeout(self.timeout, store.delete(&paths::slide(presentation_id, slide_id))).await
    }

    fn require_remote(&self) -> PersistenceResult<(&Arc<dyn RemoteStore>, &PresentationId, &FieldCipher)> {
        match &self.backend {
            Backend::Remote {
                store,
                presentation_id,
                cipher,
            } => Ok((store, presentation_id, cipher)),
            Backend::Fallback { .. } => {
                warn!("per-slide write requested in fallback mode");
                Err(PersistenceError::NoRemote)
            }
        }
    }
}
