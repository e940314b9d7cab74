//! # Live Reconciliation Listener
//!
//! Three independent subscriptions, one task each:
//!
//! - **comments**: delivered oldest-first, kept newest-first
//! - **versions**: requested newest-first from the store
//! - **slides**: decoded and held, but only handed out for hydration or
//!   after an explicit [`arm_reload`](LiveListener::arm_reload)
//!
//! Remote slide snapshots are never applied while the user is typing; an
//! echo of the user's own writes would otherwise reset the document under
//! the caret.

use crate::records::{Comment, SlideRecord, VersionRecord};
use crate::remote::{paths, OrderBy, RemoteDoc, RemoteStore};
use futures::stream::{BoxStream, StreamExt};
use slidedeck_codec::FieldCipher;
use slidedeck_common::{CommentId, PresentationId, SlideId, VersionId};
use slidedeck_editor::Slide;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub struct LiveListener {
    comments: watch::Receiver<Vec<Comment>>,
    versions: watch::Receiver<Vec<VersionRecord>>,
    slides: watch::Receiver<Option<Vec<Slide>>>,
    armed: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl LiveListener {
    /// Subscribe to every stream of a presentation
    ///
    /// Must be called from within a tokio runtime. The slide feed starts
    /// armed so the first snapshot can hydrate the document.
    pub fn start(store: Arc<dyn RemoteStore>, presentation_id: &PresentationId, cipher: FieldCipher) -> Self {
        let comment_cipher = cipher.clone();
        let (comments, comments_task) = spawn_feed(
            store.subscribe(&paths::comments(presentation_id), Some(OrderBy::asc("createdAt"))),
            Vec::new(),
            move |docs| {
                let mut comments: Vec<Comment> = docs
                    .iter()
                    .map(|doc| Comment::from_fields(CommentId::new(doc.id.clone()), &doc.fields, &comment_cipher))
                    .collect();
                comments.reverse();
                comments
            },
        );

        let (versions, versions_task) = spawn_feed(
            store.subscribe(&paths::versions(presentation_id), Some(OrderBy::desc("createdAt"))),
            Vec::new(),
            |docs| {
                docs.iter()
                    .map(|doc| VersionRecord::from_fields(VersionId::new(doc.id.clone()), &doc.fields))
                    .collect()
            },
        );

        let (slides, slides_task) = spawn_feed(
            store.subscribe(&paths::slides(presentation_id), Some(OrderBy::asc("order"))),
            None,
            move |docs| {
                let mut slides: Vec<Slide> = docs
                    .iter()
                    .map(|doc| {
                        SlideRecord::from_fields(&doc.fields).into_slide(SlideId::new(doc.id.clone()), &cipher)
                    })
                    .collect();
                slides.sort_by_key(|s| s.order);
                Some(slides)
            },
        );

        debug!(presentation = %presentation_id, "live listener started");
        Self {
            comments,
            versions,
            slides,
            armed: true,
            tasks: vec![comments_task, versions_task, slides_task],
        }
    }

    /// Comments, newest first
    pub fn comments(&self) -> Vec<Comment> {
        self.comments.borrow().clone()
    }

    /// Versions, newest first
    pub fn versions(&self) -> Vec<VersionRecord> {
        self.versions.borrow().clone()
    }

    pub fn watch_comments(&self) -> watch::Receiver<Vec<Comment>> {
        self.comments.clone()
    }

    pub fn watch_versions(&self) -> watch::Receiver<Vec<VersionRecord>> {
        self.versions.clone()
    }

    /// Allow the next [`take_slides`](Self::take_slides) to return a snapshot
    pub fn arm_reload(&mut self) {
        self.armed = true;
    }

    /// Skip pending snapshots, e.g. after loading through the adapter
    pub fn disarm(&mut self) {
        self.armed = false;
        self.slides.borrow_and_update();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Latest remote slides, only while armed; disarms on success
    pub fn take_slides(&mut self) -> Option<Vec<Slide>> {
        if !self.armed {
            return None;
        }
        let slides = self.slides.borrow_and_update().clone()?;
        self.armed = false;
        Some(slides)
    }

    /// Wait until a slide snapshot newer than the last one taken arrives
    pub async fn slides_changed(&mut self) -> bool {
        self.slides.changed().await.is_ok()
    }

    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for LiveListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_feed<T, F>(
    mut stream: BoxStream<'static, Vec<RemoteDoc>>,
    initial: T,
    mut decode: F,
) -> (watch::Receiver<T>, JoinHandle<()>)
where
    T: Send + Sync + 'static,
    F: FnMut(&[RemoteDoc]) -> T + Send + 'static,
{
    let (tx, rx) = watch::channel(initial);
    let task = tokio::spawn(async move {
        while let Some(docs) = stream.next().await {
            trace!(docs = docs.len(), "remote snapshot");
            if tx.send(decode(docs.as_slice())).is_err() {
                break;
            }
        }
    });
    (rx, task)
}
