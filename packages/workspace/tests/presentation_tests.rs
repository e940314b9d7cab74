//! Presentation sessions against the in-memory remote store and local files

use slidedeck_codec::FieldCipher;
use slidedeck_common::{FileStorage, Identity, KeyValueStorage, MemoryStorage, PresentationId, SlideId, VersionId};
use slidedeck_editor::{FieldKey, MoveDirection};
use slidedeck_workspace::{
    paths, InMemoryRemoteStore, PersistenceAdapter, PersistenceMode, PresentationSession, PresentationStatus,
    RemoteStore, SessionConfig, StatusKind,
};
use std::sync::Arc;
use std::time::Duration;

fn cipher() -> FieldCipher {
    FieldCipher::from_passphrase("integration-key")
}

fn ada() -> Identity {
    Identity::new("u-ada").with_display_name("Ada")
}

async fn remote_session(store: &InMemoryRemoteStore, identity: Option<Identity>) -> (PresentationSession, PresentationId) {
    let config = SessionConfig::default();
    let id = PresentationSession::create_remote(store, &ada(), "Quarterly Review", &config)
        .await
        .unwrap();
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let adapter = PersistenceAdapter::remote(shared, id.clone(), cipher(), config.remote_timeout());
    (PresentationSession::open(adapter, identity, &config).await, id)
}

#[tokio::test]
async fn test_edits_reach_the_store_encrypted() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, Some(ada())).await;
    assert_eq!(session.mode(), PersistenceMode::Remote);
    assert_eq!(session.metadata().unwrap().title, "Quarterly Review");

    let slide = session.document().selected_id().clone();
    assert!(session.update_field(&slide, FieldKey::Title, "Revenue"));
    assert!(session.update_field(&slide, FieldKey::Subtitle, "Up 12%"));
    session.flush().await;

    let fields = store.get(&paths::slide(&id, &slide)).await.unwrap().unwrap();
    assert_eq!(fields["title"], "Revenue");
    let content = fields["content"].as_str().unwrap();
    assert!(FieldCipher::is_ciphertext(content));
    assert_eq!(cipher().decrypt(content), "Up 12%");

    // A second session sees the same document
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let adapter = PersistenceAdapter::remote(shared, id, cipher(), Duration::from_secs(1));
    let reopened = PresentationSession::open(adapter, None, &SessionConfig::default()).await;
    assert_eq!(reopened.document().slides()[0].subtitle, "Up 12%");
    assert_eq!(reopened.history().len(), 1);
    assert!(!reopened.history().can_undo());
}

#[tokio::test]
async fn test_restore_returns_to_milestone() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, Some(ada())).await;
    let slide = session.document().selected_id().clone();

    session.update_field(&slide, FieldKey::Title, "Milestone");
    session.update_field(&slide, FieldKey::Subtitle, "Agreed scope");
    session.flush().await;

    let version = session.save_version(Some("milestone")).await.unwrap();
    assert_eq!(version.summary, "milestone");
    assert_eq!(version.created_by_name, "Ada");

    session.update_field(&slide, FieldKey::Title, "Draft 1");
    session.update_field(&slide, FieldKey::Title, "Draft 2");
    session.update_field(&slide, FieldKey::Subtitle, "Scope creep");
    let extra = session.add_slide();
    session.flush().await;
    assert_eq!(store.count(&paths::slides(&id)), 2);

    assert!(session.restore_version(&version.id).await);

    let doc = session.document();
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.slides()[0].title, "Milestone");
    assert_eq!(doc.slides()[0].subtitle, "Agreed scope");
    assert_eq!(doc.selected_id(), &slide);
    assert!(!doc.contains(&extra));
    assert_eq!(session.history().len(), 1);
    assert!(!session.undo());
    assert_eq!(store.count(&paths::slides(&id)), 1);

    let status = session.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Success);

    // Versions and audit entries are visible to everyone
    assert_eq!(store.count(&paths::versions(&id)), 1);
    tokio::time::timeout(Duration::from_secs(1), async {
        while store.count(paths::AUDIT_LOGS) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_version_requires_identity() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, None).await;

    assert!(session.save_version(Some("anon")).await.is_none());
    assert_eq!(store.count(&paths::versions(&id)), 0);
    assert_eq!(session.status().current().unwrap().kind, StatusKind::Error);

    assert!(!session.save().await);
}

#[tokio::test]
async fn test_anonymous_edits_stay_local() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, None).await;
    assert!(session.is_hydrated());

    let slide = session.document().selected_id().clone();
    assert!(session.update_field(&slide, FieldKey::Title, "anon write"));
    session.add_slide();
    session.flush().await;

    assert_eq!(session.document().slides()[0].title, "anon write");
    assert_eq!(store.count(&paths::slides(&id)), 0);
    let status = session.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "You must be signed in to save");
}

#[tokio::test]
async fn test_failed_first_load_never_writes_placeholder() {
    let store = InMemoryRemoteStore::new();
    let config = SessionConfig::default();
    let id = PresentationSession::create_remote(&store, &ada(), "Quarterly Review", &config)
        .await
        .unwrap();
    let real = SlideId::new("real-1");
    let mut fields = serde_json::Map::new();
    fields.insert("order".into(), 1.into());
    fields.insert("title".into(), "Real deck".into());
    store.set_merge(&paths::slide(&id, &real), fields).await.unwrap();

    store.set_offline(true);
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let adapter = PersistenceAdapter::remote(shared, id.clone(), cipher(), config.remote_timeout());
    let mut session = PresentationSession::open(adapter, Some(ada()), &config).await;
    assert!(!session.is_hydrated());
    store.set_offline(false);

    let placeholder = session.document().selected_id().clone();
    assert!(session.update_field(&placeholder, FieldKey::Title, "typed after failed load"));
    session.flush().await;
    assert!(!session.save().await);
    assert!(session.save_version(None).await.is_none());

    let docs = store.list(&paths::slides(&id), None).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "real-1");

    // A successful reload replaces the placeholder and unlocks writes
    assert!(session.reload().await);
    assert!(session.is_hydrated());
    assert_eq!(session.document().slides()[0].id, real);
    assert!(session.update_field(&real, FieldKey::Title, "Real deck, revised"));
    session.flush().await;
    let fields = store.get(&paths::slide(&id, &real)).await.unwrap().unwrap();
    assert_eq!(fields["title"], "Real deck, revised");
}

#[tokio::test]
async fn test_version_orders_match_the_store() {
    let store = InMemoryRemoteStore::new();
    let config = SessionConfig::default();
    let id = PresentationSession::create_remote(&store, &ada(), "Quarterly Review", &config)
        .await
        .unwrap();
    for (slide, order) in [("gap-a", 4), ("gap-b", 9)] {
        let mut fields = serde_json::Map::new();
        fields.insert("order".into(), order.into());
        store
            .set_merge(&paths::slide(&id, &SlideId::new(slide)), fields)
            .await
            .unwrap();
    }

    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let adapter = PersistenceAdapter::remote(shared, id.clone(), cipher(), config.remote_timeout());
    let mut session = PresentationSession::open(adapter, Some(ada()), &config).await;

    let version = session.save_version(Some("renumbered")).await.unwrap();
    let snapshot: Vec<(String, u32)> = version
        .slides
        .iter()
        .map(|s| (s.id.to_string(), s.order))
        .collect();
    assert_eq!(snapshot, vec![("gap-a".to_string(), 1), ("gap-b".to_string(), 2)]);

    let stored: Vec<(String, u64)> = store
        .list(&paths::slides(&id), None)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| (doc.id.clone(), doc.fields["order"].as_u64().unwrap()))
        .collect();
    assert_eq!(stored, vec![("gap-a".to_string(), 1), ("gap-b".to_string(), 2)]);
}

#[tokio::test]
async fn test_unknown_version_leaves_document_alone() {
    let store = InMemoryRemoteStore::new();
    let (mut session, _) = remote_session(&store, Some(ada())).await;
    let slide = session.document().selected_id().clone();
    session.update_field(&slide, FieldKey::Title, "Keep me");
    let before = session.document().clone();

    assert!(!session.restore_version(&VersionId::new("missing")).await);
    assert_eq!(session.document(), &before);
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn test_failed_reload_keeps_live_state() {
    let store = InMemoryRemoteStore::new();
    let (mut session, _) = remote_session(&store, Some(ada())).await;
    let slide = session.document().selected_id().clone();
    session.update_field(&slide, FieldKey::Title, "Offline edits");
    session.flush().await;

    store.set_offline(true);
    let before = session.document().clone();
    assert!(!session.reload().await);
    assert_eq!(session.document(), &before);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.status().current().unwrap().kind, StatusKind::Error);

    // Writes keep failing quietly; the document still accepts edits
    assert!(session.update_field(&slide, FieldKey::Title, "Still editing"));
    session.flush().await;
    assert_eq!(session.document().slides()[0].title, "Still editing");
    assert_eq!(session.status().current().unwrap().text, "Failed to save changes");
}

#[tokio::test]
async fn test_deletes_and_moves_sync_remotely() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, Some(ada())).await;
    let first = session.document().selected_id().clone();
    let second = session.add_slide();
    let third = session.add_slide();

    assert!(session.move_slide(MoveDirection::Up));
    assert!(session.delete_slide(&first));
    session.flush().await;

    let docs = store.list(&paths::slides(&id), None).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.id != first.as_str()));

    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let adapter = PersistenceAdapter::remote(shared, id, cipher(), Duration::from_secs(1));
    let reopened = PresentationSession::open(adapter, None, &SessionConfig::default()).await;
    let order: Vec<_> = reopened.document().slides().iter().map(|s| s.id.clone()).collect();
    assert_eq!(order, vec![third, second]);
}

#[tokio::test]
async fn test_save_writes_metadata() {
    let store = InMemoryRemoteStore::new();
    let (mut session, id) = remote_session(&store, Some(ada())).await;

    assert!(session.rename("Board Update"));
    assert!(session.set_status(PresentationStatus::Final));
    assert!(session.save().await);

    let fields = store.get(&paths::presentation(&id)).await.unwrap().unwrap();
    assert_eq!(fields["title"], "Board Update");
    assert_eq!(fields["status"], "final");
    assert_eq!(fields["ownerId"], "u-ada");
    assert_eq!(session.status().current().unwrap().text, "Saved");
}

#[tokio::test]
async fn test_comments_round_trip_through_listener() {
    let store = InMemoryRemoteStore::new();
    let (session, id) = remote_session(&store, Some(ada())).await;

    assert!(session.post_comment("   ").await.is_none());
    assert!(session.post_comment("Looks good").await.is_some());
    assert!(session.post_comment("Ship it").await.is_some());

    let stored = store.list(&paths::comments(&id), None).await.unwrap();
    assert!(stored.iter().all(|c| c.fields["message"] != "Looks good"));

    tokio::time::timeout(Duration::from_secs(1), async {
        while session.comments().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let comments = session.comments();
    assert_eq!(comments[0].author, "Ada");
    assert!(comments.iter().any(|c| c.message == "Looks good"));
}

#[tokio::test]
async fn test_fallback_saves_to_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::default();
    let key = config.local_key("demo");

    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(dir.path()));
    let adapter = PersistenceAdapter::fallback(Arc::clone(&storage), key.clone());
    let mut session = PresentationSession::open(adapter, None, &config).await;
    assert_eq!(session.mode(), PersistenceMode::Fallback);
    assert!(session.metadata().is_none());

    let slide = session.document().selected_id().clone();
    session.update_field(&slide, FieldKey::Title, "Offline deck");
    session.add_slide();
    assert!(storage.get(&key).unwrap().is_none());

    assert!(session.save().await);
    assert!(storage.get(&key).unwrap().is_some());

    let adapter = PersistenceAdapter::fallback(storage, key);
    let reopened = PresentationSession::open(adapter, None, &config).await;
    assert_eq!(reopened.document().len(), 2);
    assert_eq!(reopened.document().slides()[0].title, "Offline deck");
}

#[tokio::test]
async fn test_fallback_has_no_versions_or_comments() {
    let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let adapter = PersistenceAdapter::fallback(storage, "deck");
    let mut session = PresentationSession::open(adapter, Some(ada()), &SessionConfig::default()).await;

    assert!(session.save_version(None).await.is_none());
    assert!(session.post_comment("hello").await.is_none());
    assert!(session.versions().is_empty());
    assert!(!session.apply_remote_slides());
}
