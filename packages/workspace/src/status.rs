//! Transient, self-dismissing status messages
//!
//! Persistence and version failures never propagate into the document;
//! they surface here instead. Each message clears itself after the TTL
//! unless a newer message replaced it first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    seq: u64,
}

/// Publishes the current status message
#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<Option<StatusMessage>>>,
    seq: Arc<AtomicU64>,
    ttl: Duration,
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            seq: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatusMessage>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.tx.borrow().clone()
    }

    pub fn info(&self, text: impl Into<String>) {
        self.publish(StatusKind::Info, text.into());
    }

    pub fn success(&self, text: impl Into<String>) {
        self.publish(StatusKind::Success, text.into());
    }

    pub fn error(&self, text: impl Into<String>) {
        self.publish(StatusKind::Error, text.into());
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    fn publish(&self, kind: StatusKind, text: String) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(?kind, text = %text, "status");
        self.tx.send_replace(Some(StatusMessage { kind, text, seq }));

        // Outside a runtime the message stays until replaced or cleared
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let tx = Arc::clone(&self.tx);
        let ttl = self.ttl;
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            tx.send_if_modified(|current| match current {
                Some(message) if message.seq == seq => {
                    *current = None;
                    true
                }
                _ => false,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_message_expires_after_ttl() {
        let board = StatusBoard::new(Duration::from_millis(4000));
        board.error("Failed to save");
        assert_eq!(board.current().unwrap().kind, StatusKind::Error);

        tokio::time::sleep(Duration::from_millis(3999)).await;
        assert!(board.current().is_some());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_message_survives_older_timer() {
        let board = StatusBoard::new(Duration::from_millis(100));
        board.info("Saving");
        tokio::time::sleep(Duration::from_millis(60)).await;
        board.success("Saved");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(board.current().unwrap().text, "Saved");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(board.current().is_none());
    }

    #[test]
    fn test_publish_without_runtime() {
        let board = StatusBoard::new(Duration::from_millis(1));
        board.success("Saved");
        assert_eq!(board.current().unwrap().text, "Saved");
        board.clear();
        assert!(board.current().is_none());
    }
}
