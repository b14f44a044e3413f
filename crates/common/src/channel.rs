//! Snapshot channel between device threads and the output forwarder
//!
//! Every device session publishes into the same bounded FIFO; a single
//! forwarder drains it and owns the consumer connection. Messages from one
//! session keep their submission order because each publisher sends from a
//! single thread into one queue.

use async_channel::{Receiver, Sender, bounded};
use protocol::{DeviceId, Snapshot};

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A snapshot tagged with the device it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub device: DeviceId,
    pub snapshot: Snapshot,
}

/// Sending side, cloned into every device session
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    tx: Sender<Envelope>,
}

impl SnapshotPublisher {
    /// Publish from a blocking thread
    ///
    /// Blocks while the queue is full. Fails once the forwarder is gone.
    pub fn publish_blocking(&self, envelope: Envelope) -> crate::Result<()> {
        self.tx
            .send_blocking(envelope)
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Publish from async context
    pub async fn publish(&self, envelope: Envelope) -> crate::Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Close the channel from the sending side
    ///
    /// Blocked and future publishes fail; already queued envelopes can
    /// still be received.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    /// Whether the receiving side has been closed
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side, owned by the forwarder
#[derive(Debug)]
pub struct SnapshotQueue {
    rx: Receiver<Envelope>,
}

impl SnapshotQueue {
    /// Receive the next envelope
    ///
    /// Fails once every publisher has been dropped and the queue is drained.
    pub async fn recv(&self) -> crate::Result<Envelope> {
        self.rx
            .recv()
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Close the queue; pending and future publishes fail
    pub fn close(&self) -> bool {
        self.rx.close()
    }

    /// Number of queued envelopes
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the snapshot channel
///
/// Returns (SnapshotPublisher for device sessions, SnapshotQueue for the forwarder)
pub fn create_snapshot_channel(capacity: usize) -> (SnapshotPublisher, SnapshotQueue) {
    let (tx, rx) = bounded(capacity.max(1));
    (SnapshotPublisher { tx }, SnapshotQueue { rx })
}
