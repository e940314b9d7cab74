//! # Version Snapshot Manager
//!
//! Durable, user-triggered snapshots of every slide, independent of the
//! undo/redo history.
//!
//! ## Restore protocol
//!
//! 1. Look up the snapshot; unknown or empty snapshots abort with nothing
//!    written
//! 2. Sort snapshot slides by `order`
//! 3. In one batch: upsert every snapshot slide (ciphertext carried
//!    verbatim) and delete every live slide the snapshot does not contain
//! 4. The caller reloads the document and selects the first restored slide

use crate::error::{VersionError, VersionResult};
use crate::persistence::with_timeout;
use crate::records::{SnapshotSlide, VersionRecord};
use crate::remote::{paths, OrderBy, RemoteStore, WriteBatch};
use chrono::Utc;
use slidedeck_codec::FieldCipher;
use slidedeck_common::{Identity, PresentationId, SlideId, VersionId};
use slidedeck_editor::Slide;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What a restore wrote
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub version_id: VersionId,
    /// Slide to select once the document is reloaded
    pub first_slide: SlideId,
    pub restored: usize,
    pub deleted: Vec<SlideId>,
}

pub struct VersionManager {
    store: Arc<dyn RemoteStore>,
    presentation_id: PresentationId,
    cipher: FieldCipher,
    timeout: Duration,
}

impl VersionManager {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        presentation_id: PresentationId,
        cipher: FieldCipher,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            presentation_id,
            cipher,
            timeout,
        }
    }

    /// Snapshot `slides`; live slides are not touched
    pub async fn save_version(
        &self,
        identity: Option<&Identity>,
        slides: &[Slide],
        summary: Option<&str>,
    ) -> VersionResult<VersionRecord> {
        let identity = identity.ok_or(VersionError::IdentityRequired)?;

        let mut snapshot: Vec<SnapshotSlide> = slides
            .iter()
            .map(|slide| SnapshotSlide::capture(slide, &self.cipher))
            .collect();
        snapshot.sort_by_key(|s| s.order);

        let record = VersionRecord {
            id: VersionId::generate(),
            created_at: Some(Utc::now()),
            created_by: identity.user_id.clone(),
            created_by_name: identity.label().to_string(),
            summary: summary.unwrap_or_default().to_string(),
            slides: snapshot,
        };

        let path = paths::version(&self.presentation_id, &record.id);
        with_timeout(self.timeout, self.store.set_merge(&path, record.to_fields())).await?;

        info!(version = %record.id, slides = record.slides.len(), "version saved");
        Ok(record)
    }

    /// Every version, newest first
    pub async fn list_versions(&self) -> VersionResult<Vec<VersionRecord>> {
        let docs = with_timeout(
            self.timeout,
            self.store
                .list(&paths::versions(&self.presentation_id), Some(OrderBy::desc("createdAt"))),
        )
        .await?;

        Ok(docs
            .into_iter()
            .map(|doc| VersionRecord::from_fields(VersionId::new(doc.id), &doc.fields))
            .collect())
    }

    pub async fn get_version(&self, id: &VersionId) -> VersionResult<VersionRecord> {
        let fields = with_timeout(
            self.timeout,
            self.store.get(&paths::version(&self.presentation_id, id)),
        )
        .await?
        .ok_or_else(|| VersionError::NotFound(id.clone()))?;

        Ok(VersionRecord::from_fields(id.clone(), &fields))
    }

    /// Reconcile the live slides with a snapshot
    pub async fn restore_version(&self, id: &VersionId) -> VersionResult<RestoreOutcome> {
        let mut version = self.get_version(id).await?;
        if version.slides.is_empty() {
            warn!(version = %id, "refusing to restore an empty snapshot");
            return Err(VersionError::EmptySnapshot(id.clone()));
        }
        version.slides.sort_by_key(|s| s.order);

        let live = with_timeout(self.timeout, self.store.list(&paths::slides(&self.presentation_id), None)).await?;

        let keep: HashSet<&str> = version.slides.iter().map(|s| s.id.as_str()).collect();
        let deleted: Vec<SlideId> = live
            .iter()
            .filter(|doc| !keep.contains(doc.id.as_str()))
            .map(|doc| SlideId::new(doc.id.clone()))
            .collect();

        let mut batch = WriteBatch::new();
        for slide in &version.slides {
            batch.set_merge(paths::slide(&self.presentation_id, &slide.id), slide.restore_fields());
        }
        for slide_id in &deleted {
            batch.delete(paths::slide(&self.presentation_id, slide_id));
        }
        with_timeout(self.timeout, self.store.commit(batch)).await?;

        info!(
            version = %id,
            restored = version.slides.len(),
            deleted = deleted.len(),
            "version restored"
        );

        Ok(RestoreOutcome {
            version_id: id.clone(),
            first_slide: version.slides[0].id.clone(),
            restored: version.slides.len(),
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistenceAdapter;
    use crate::records::PresentationRecord;
    use crate::remote::InMemoryRemoteStore;
    use slidedeck_editor::SlideType;

    fn slide(id: &str, order: u32, title: &str) -> Slide {
        let mut slide = Slide::new(SlideId::new(id), order);
        slide.title = title.to_string();
        slide.subtitle = format!("{} body", title);
        slide
    }

    async fn setup() -> (InMemoryRemoteStore, PersistenceAdapter, VersionManager) {
        let store = InMemoryRemoteStore::new();
        let timeout = Duration::from_secs(1);
        let id = PersistenceAdapter::create_presentation(&store, &PresentationRecord::new("Deck", "u1"), timeout)
            .await
            .unwrap();
        let cipher = FieldCipher::from_passphrase("k");
        let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
        let adapter = PersistenceAdapter::remote(Arc::clone(&shared), id.clone(), cipher.clone(), timeout);
        let versions = VersionManager::new(shared, id, cipher, timeout);
        (store, adapter, versions)
    }

    #[tokio::test]
    async fn test_save_requires_identity() {
        let (store, _, versions) = setup().await;
        let writes = store.write_count();
        let result = versions.save_version(None, &[slide("a", 1, "A")], Some("x")).await;
        assert!(matches!(result, Err(VersionError::IdentityRequired)));
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_restore_reconciles_slide_set() {
        let (_store, adapter, versions) = setup().await;
        let identity = Identity::new("u1");

        let mut a = slide("a", 1, "A");
        a.slide_type = SlideType::Cover;
        let b = slide("b", 2, "B");
        adapter.save_document(&[a.clone(), b.clone()], None).await.unwrap();

        let version = versions
            .save_version(Some(&identity), &[a.clone(), b.clone()], Some("milestone"))
            .await
            .unwrap();

        let mut a_edited = a.clone();
        a_edited.title = "A changed".into();
        a_edited.slide_type = SlideType::Ending;
        let c = slide("c", 3, "C");
        adapter.save_document(&[a_edited, b.clone(), c], None).await.unwrap();

        let outcome = versions.restore_version(&version.id).await.unwrap();
        assert_eq!(outcome.first_slide.as_str(), "a");
        assert_eq!(outcome.deleted, vec![SlideId::new("c")]);

        let loaded = adapter.load_document().await.unwrap();
        let ids: Vec<&str> = loaded.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(loaded.slides[0].title, "A");
        assert_eq!(loaded.slides[0].subtitle, "A body");
        assert_eq!(loaded.slides[0].slide_type, SlideType::Cover);
    }

    #[tokio::test]
    async fn test_restore_unknown_and_empty_abort() {
        let (store, _, versions) = setup().await;

        let missing = versions.restore_version(&VersionId::new("nope")).await;
        assert!(matches!(missing, Err(VersionError::NotFound(_))));

        let empty = versions
            .save_version(Some(&Identity::new("u1")), &[], None)
            .await
            .unwrap();
        let writes = store.write_count();
        let result = versions.restore_version(&empty.id).await;
        assert!(matches!(result, Err(VersionError::EmptySnapshot(_))));
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (_store, _, versions) = setup().await;
        let identity = Identity::new("u1");
        let first = versions.save_version(Some(&identity), &[slide("a", 1, "A")], Some("one")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = versions.save_version(Some(&identity), &[slide("a", 1, "A")], Some("two")).await.unwrap();

        let listed = versions.list_versions().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
