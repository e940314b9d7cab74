//! Per-slide write serialization
//!
//! Each slide id gets its own lane: a task draining an unbounded channel in
//! program order. Writes to one slide never overtake each other; writes to
//! different slides run concurrently. Enqueueing never blocks the caller.
//! Failures are logged and posted to the [`StatusBoard`].
//!
//! A lane retires once it has drained a delete with nothing queued behind
//! it. A later write for the same id starts a fresh lane.

use crate::persistence::PersistenceAdapter;
use crate::status::StatusBoard;
use slidedeck_common::SlideId;
use slidedeck_editor::Slide;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum SlideWrite {
    Upsert(Slide),
    Delete,
}

enum LaneMessage {
    Write(SlideWrite),
    Flush(oneshot::Sender<()>),
}

pub struct WriteQueue {
    adapter: Arc<PersistenceAdapter>,
    status: StatusBoard,
    handle: Handle,
    lanes: Arc<Mutex<HashMap<SlideId, mpsc::UnboundedSender<LaneMessage>>>>,
}

impl WriteQueue {
    /// Lanes are spawned on `handle`
    pub fn new(adapter: Arc<PersistenceAdapter>, status: StatusBoard, handle: Handle) -> Self {
        Self {
            adapter,
            status,
            handle,
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a write behind any earlier write for the same slide
    pub fn enqueue(&self, slide_id: SlideId, write: SlideWrite) {
        let mut lanes = self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let lane = lanes
            .entry(slide_id.clone())
            .or_insert_with(|| self.spawn_lane(slide_id.clone()));

        if lane.send(LaneMessage::Write(write)).is_err() {
            error!(slide_id = %slide_id, "write lane closed; write dropped");
        }
    }

    /// Wait for every write queued so far to finish
    pub async fn flush(&self) {
        let waiters: Vec<oneshot::Receiver<()>> = {
            let lanes = self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            lanes
                .values()
                .filter_map(|lane| {
                    let (tx, rx) = oneshot::channel();
                    lane.send(LaneMessage::Flush(tx)).ok().map(|_| rx)
                })
                .collect()
        };

        for waiter in waiters {
            let _ = waiter.await;
        }
    }

    fn spawn_lane(&self, slide_id: SlideId) -> mpsc::UnboundedSender<LaneMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let adapter = Arc::clone(&self.adapter);
        let status = self.status.clone();
        let lanes = Arc::clone(&self.lanes);

        self.handle.spawn(async move {
            let mut deleted = false;
            while let Some(message) = rx.recv().await {
                match message {
                    LaneMessage::Write(write) => {
                        deleted = matches!(write, SlideWrite::Delete);
                        let result = match &write {
                            SlideWrite::Upsert(slide) => adapter.save_slide(slide).await,
                            SlideWrite::Delete => adapter.delete_slide(&slide_id).await,
                        };
                        match result {
                            Ok(()) => trace!(slide_id = %slide_id, "slide write applied"),
                            Err(e) => {
                                error!(slide_id = %slide_id, error = %e, "slide write failed");
                                status.error("Failed to save changes");
                            }
                        }
                        if deleted && Self::retire(&lanes, &slide_id, &rx) {
                            break;
                        }
                    }
                    LaneMessage::Flush(done) => {
                        let retired = deleted && Self::retire(&lanes, &slide_id, &rx);
                        let _ = done.send(());
                        if retired {
                            break;
                        }
                    }
                }
            }
            trace!(slide_id = %slide_id, "write lane closed");
        });

        tx
    }

    /// Drop the lane from the map if nothing is queued behind the delete
    ///
    /// `enqueue` sends while holding the same lock, so no message can slip
    /// in between the emptiness check and the removal.
    fn retire(
        lanes: &Mutex<HashMap<SlideId, mpsc::UnboundedSender<LaneMessage>>>,
        slide_id: &SlideId,
        rx: &mpsc::UnboundedReceiver<LaneMessage>,
    ) -> bool {
        let mut lanes = lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !rx.is_empty() {
            return false;
        }
        lanes.remove(slide_id);
        true
    }

    /// Number of open lanes
    pub fn lane_count(&self) -> usize {
        self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
