//! Output forwarder
//!
//! The consumer connection is owned by a single Tokio task that drains the
//! snapshot queue and writes each encoded message whole. Device sessions
//! never touch the connection, so messages cannot interleave on the wire.

use anyhow::{Context, Result};
use common::SnapshotQueue;
use protocol::SnapshotFormat;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters reported when the forwarder finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Messages fully written
    pub messages: u64,
    /// Bytes written
    pub bytes: u64,
    /// Whether the forwarder stopped because a write failed
    pub write_failed: bool,
}

/// Spawns the forwarder task
pub struct OutputSink;

impl OutputSink {
    /// Start forwarding `queue` to `writer`
    ///
    /// Runs until every publisher is dropped and the queue is drained. A
    /// write failure closes the queue and cancels `token` so the device
    /// sessions wind down.
    pub fn spawn<W>(
        writer: W,
        queue: SnapshotQueue,
        format: SnapshotFormat,
        token: CancellationToken,
    ) -> SinkHandle
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let task = tokio::spawn(forward(writer, queue, format, token));
        SinkHandle { task }
    }
}

/// Handle to the running forwarder
pub struct SinkHandle {
    task: JoinHandle<SinkStats>,
}

impl SinkHandle {
    /// Wait for the forwarder to finish
    pub async fn join(self) -> Result<SinkStats> {
        self.task.await.context("Output forwarder panicked")
    }
}

async fn forward<W>(
    mut writer: W,
    queue: SnapshotQueue,
    format: SnapshotFormat,
    token: CancellationToken,
) -> SinkStats
where
    W: AsyncWrite + Unpin,
{
    let mut stats = SinkStats::default();
    info!("Output forwarder started ({:?} format)", format);

    while let Ok(envelope) = queue.recv().await {
        let message = match envelope.snapshot.encode(envelope.device, format) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to encode snapshot from {}: {}", envelope.device, e);
                continue;
            }
        };

        if let Err(e) = write_message(&mut writer, message.as_bytes()).await {
            error!("Failed to write to consumer: {}", e);
            stats.write_failed = true;
            queue.close();
            token.cancel();
            break;
        }

        stats.messages += 1;
        stats.bytes += message.len() as u64;
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Error shutting down consumer connection: {}", e);
    }

    info!(
        "Output forwarder stopped: {} messages, {} bytes",
        stats.messages, stats.bytes
    );
    stats
}

async fn write_message<W>(writer: &mut W, message: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message).await?;
    writer.flush().await
}
