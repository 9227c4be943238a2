//! # Scan Events
//!
//! Notifications about flushes and per-code commit outcomes, for whatever
//! front end hosts the scan session.
//!
//! ```text
//! ScanSession ──flush──► emit_flush(batch)
//!      │
//!      └─► commit task per code ──► emit_committed / emit_commit_failed
//! ```

use tokio::sync::mpsc;
use uuid::Uuid;

use stockscan_core::{BatchEntry, DrainedBatch};

/// Trait for emitting scan events (implemented by the hosting UI).
pub trait ScanEventEmitter: Send + Sync {
    /// A batch left the aggregator and its commits were dispatched.
    fn emit_flush(&self, batch: &DrainedBatch);

    /// One code of a flushed batch was stored by the inventory service.
    fn emit_committed(&self, batch_id: Uuid, entry: &BatchEntry);

    /// One code of a flushed batch could not be stored. It is not re-queued.
    fn emit_commit_failed(&self, batch_id: Uuid, entry: &BatchEntry, error: &str);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl ScanEventEmitter for NoOpEmitter {
    fn emit_flush(&self, _batch: &DrainedBatch) {}
    fn emit_committed(&self, _batch_id: Uuid, _entry: &BatchEntry) {}
    fn emit_commit_failed(&self, _batch_id: Uuid, _entry: &BatchEntry, _error: &str) {}
}

/// Owned form of an emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Flushed(DrainedBatch),
    Committed {
        batch_id: Uuid,
        entry: BatchEntry,
    },
    CommitFailed {
        batch_id: Uuid,
        entry: BatchEntry,
        error: String,
    },
}

/// Emitter that forwards every event into an unbounded channel.
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelEmitter {
    /// Creates the emitter and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelEmitter { tx }, rx)
    }
}

impl ScanEventEmitter for ChannelEmitter {
    fn emit_flush(&self, batch: &DrainedBatch) {
        let _ = self.tx.send(ScanEvent::Flushed(batch.clone()));
    }

    fn emit_committed(&self, batch_id: Uuid, entry: &BatchEntry) {
        let _ = self.tx.send(ScanEvent::Committed {
            batch_id,
            entry: entry.clone(),
        });
    }

    fn emit_commit_failed(&self, batch_id: Uuid, entry: &BatchEntry, error: &str) {
        let _ = self.tx.send(ScanEvent::CommitFailed {
            batch_id,
            entry: entry.clone(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_emitter_forwards_events() {
        let (emitter, mut rx) = ChannelEmitter::new();
        let batch = DrainedBatch::new(vec![BatchEntry::new("A", 2)]);

        emitter.emit_flush(&batch);
        emitter.emit_commit_failed(batch.id, &batch.entries[0], "Unknown item code: A");

        assert_eq!(rx.try_recv().unwrap(), ScanEvent::Flushed(batch.clone()));
        assert_eq!(
            rx.try_recv().unwrap(),
            ScanEvent::CommitFailed {
                batch_id: batch.id,
                entry: BatchEntry::new("A", 2),
                error: "Unknown item code: A".to_string(),
            }
        );
    }

    #[test]
    fn test_channel_emitter_survives_dropped_receiver() {
        let (emitter, rx) = ChannelEmitter::new();
        drop(rx);
        emitter.emit_committed(Uuid::new_v4(), &BatchEntry::new("A", 1));
    }
}
