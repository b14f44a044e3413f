//! Per-device read loop
//!
//! A [`DeviceSession`] owns one [`ReportSource`] and the device's
//! [`AxisState`]. It runs on its own OS thread, pulling reports with a
//! bounded blocking read, decoding them, and publishing the resulting
//! snapshots to the shared output queue.

use common::{Envelope, SnapshotPublisher};
use protocol::{AxisState, DeviceId, REPORT_SIZE, decode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Default timeout for a single report read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// Failure of a single report read
#[derive(Debug, Error)]
pub enum ReadError {
    /// No report arrived within the timeout
    #[error("read timed out")]
    Timeout,

    /// Transfer-level failure (I/O, pipe, overflow, interrupted)
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else, e.g. the device disappeared
    #[error("unexpected read failure: {0}")]
    Unexpected(String),
}

/// Source of raw reports for one device
///
/// Implemented by [`crate::usb::device::SpaceDevice`] for real hardware.
pub trait ReportSource: Send {
    /// Blocking read of one report into `buf`, bounded by `timeout`
    ///
    /// Returns the number of bytes read; `Ok(0)` means no data.
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError>;

    /// Buffer size needed for one read
    fn report_len(&self) -> usize {
        REPORT_SIZE
    }

    /// Release I/O resources; called once when the session ends
    fn close(&mut self);
}

/// Counters collected over a session's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-empty reads
    pub reports: u64,
    /// Snapshots published
    pub snapshots: u64,
    /// Reports rejected by the decoder
    pub rejected: u64,
    /// Reads that returned no data
    pub empty_reads: u64,
    /// Timeouts
    pub timeouts: u64,
    /// Transport or unexpected read failures
    pub read_errors: u64,
}

/// One device's read loop
pub struct DeviceSession<S: ReportSource> {
    id: DeviceId,
    source: S,
    state: AxisState,
    publisher: SnapshotPublisher,
    read_timeout: Duration,
    stats: SessionStats,
}

impl<S: ReportSource> DeviceSession<S> {
    /// Create a session with a zeroed axis state
    pub fn new(
        id: DeviceId,
        source: S,
        publisher: SnapshotPublisher,
        read_timeout: Duration,
    ) -> Self {
        Self {
            id,
            source,
            state: AxisState::new(),
            publisher,
            read_timeout,
            stats: SessionStats::default(),
        }
    }

    /// Run until `token` is cancelled or the output queue closes
    ///
    /// The token is checked once per iteration, so shutdown latency is
    /// bounded by the read timeout. The source is closed before returning.
    pub fn run(mut self, token: CancellationToken) -> SessionStats {
        info!("Session {} started", self.id);

        let mut buf = vec![0u8; self.source.report_len().max(REPORT_SIZE)];

        while !token.is_cancelled() {
            match self.source.read_report(&mut buf, self.read_timeout) {
                Ok(0) => {
                    self.stats.empty_reads += 1;
                    debug!("Session {}: no data received from the device", self.id);
                }
                Ok(len) => {
                    if !self.handle_report(&buf[..len.min(buf.len())]) {
                        break;
                    }
                }
                Err(ReadError::Timeout) => {
                    self.stats.timeouts += 1;
                    trace!("Session {}: read timed out", self.id);
                }
                Err(e @ ReadError::Transport(_)) => {
                    self.stats.read_errors += 1;
                    warn!("Session {}: {}", self.id, e);
                }
                Err(e @ ReadError::Unexpected(_)) => {
                    self.stats.read_errors += 1;
                    error!("Session {}: {}", self.id, e);
                }
            }
        }

        self.source.close();
        info!("Session {} stopped: {:?}", self.id, self.stats);
        self.stats
    }

    /// Decode and publish one report
    ///
    /// Returns false once the output queue is closed.
    fn handle_report(&mut self, raw: &[u8]) -> bool {
        self.stats.reports += 1;
        debug!("Session {}: received data {:?}", self.id, raw);

        let snapshot = match decode(raw, &mut self.state) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.rejected += 1;
                warn!("Session {}: dropping report: {}", self.id, e);
                return true;
            }
        };

        let envelope = Envelope {
            device: self.id,
            snapshot,
        };

        match self.publisher.publish_blocking(envelope) {
            Ok(()) => {
                self.stats.snapshots += 1;
                true
            }
            Err(e) => {
                error!("Session {}: output closed, stopping: {}", self.id, e);
                false
            }
        }
    }
}
