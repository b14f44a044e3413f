//! Wiring between the device sessions and the output forwarder
//!
//! Shutdown order: stop the sessions, wait for them to release their
//! devices, then let the forwarder drain the queue and close the consumer
//! connection.

use crate::sink::{OutputSink, SinkHandle, SinkStats};
use crate::supervisor::SessionSupervisor;
use crate::usb::SessionStats;
use anyhow::{Context, Result};
use common::{SnapshotPublisher, create_snapshot_channel};
use protocol::{DeviceId, SnapshotFormat};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Final counters of a bridge run
#[derive(Debug, Clone, Default)]
pub struct BridgeReport {
    pub sessions: Vec<(DeviceId, SessionStats)>,
    pub sink: SinkStats,
}

/// Running sessions plus the forwarder they feed
pub struct Bridge {
    supervisor: SessionSupervisor,
    sink: SinkHandle,
    publisher: SnapshotPublisher,
}

impl Bridge {
    /// Spawn the forwarder on `writer` and prepare an empty supervisor
    pub fn start<W>(
        writer: W,
        format: SnapshotFormat,
        queue_capacity: usize,
        read_timeout: Duration,
        token: CancellationToken,
    ) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (publisher, queue) = create_snapshot_channel(queue_capacity);
        let sink = OutputSink::spawn(writer, queue, format, token.clone());
        let supervisor = SessionSupervisor::new(publisher.clone(), token, read_timeout);

        Self {
            supervisor,
            sink,
            publisher,
        }
    }

    pub fn supervisor_mut(&mut self) -> &mut SessionSupervisor {
        &mut self.supervisor
    }

    /// Stop everything and wait for it to finish
    ///
    /// Sessions blocked on a full queue for longer than `grace` are released
    /// by closing the queue.
    pub async fn shutdown(self, grace: Duration) -> Result<BridgeReport> {
        let Bridge {
            supervisor,
            sink,
            publisher,
        } = self;

        supervisor.shutdown();

        let mut join = tokio::task::spawn_blocking(move || supervisor.join());
        let sessions = match tokio::time::timeout(grace, &mut join).await {
            Ok(joined) => joined.context("Session join task failed")?,
            Err(_) => {
                warn!("Sessions still running after {:?}, closing output queue", grace);
                publisher.close();
                join.await.context("Session join task failed")?
            }
        };
        info!("All device sessions stopped");

        drop(publisher);
        let sink = sink.join().await?;

        Ok(BridgeReport { sessions, sink })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::session::ReadError;
    use crate::usb::session::tests::ScriptedSource;
    use common::test_utils::{DEFAULT_TEST_TIMEOUT, translation_report, with_timeout};
    use protocol::read_snapshot_async;
    use std::collections::HashMap;
    use tokio::io::BufReader;

    const DEVICES: u32 = 4;
    const PER_DEVICE: i16 = 200;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sessions_deliver_every_message_in_order() {
        let (client, server) = tokio::io::duplex(1024);
        let token = CancellationToken::new();
        let mut bridge = Bridge::start(
            server,
            SnapshotFormat::Json,
            16,
            Duration::from_millis(5),
            token.clone(),
        );

        let consumer = tokio::spawn(async move {
            let mut reader = BufReader::new(client);
            let mut received = Vec::new();
            while let Some(message) = read_snapshot_async(&mut reader).await.unwrap() {
                received.push(message);
            }
            received
        });

        let mut done = Vec::new();
        let started = bridge
            .supervisor_mut()
            .start_all(0..DEVICES, |_, device| {
                let script = (0..PER_DEVICE).map(move |seq| {
                    Ok::<_, ReadError>(translation_report([seq, device as i16, 0]).to_vec())
                });
                let exhausted = CancellationToken::new();
                done.push(exhausted.clone());
                Ok::<_, ReadError>(ScriptedSource::new(script, exhausted))
            });
        assert_eq!(started, DEVICES as usize);

        with_timeout(DEFAULT_TEST_TIMEOUT, async {
            for exhausted in &done {
                exhausted.cancelled().await;
            }
        })
        .await
        .unwrap();

        let report = with_timeout(DEFAULT_TEST_TIMEOUT, bridge.shutdown(Duration::from_secs(1)))
            .await
            .unwrap()
            .unwrap();
        let received = with_timeout(DEFAULT_TEST_TIMEOUT, consumer)
            .await
            .unwrap()
            .unwrap();

        let total = DEVICES as usize * PER_DEVICE as usize;
        assert_eq!(received.len(), total);
        assert_eq!(report.sink.messages as usize, total);
        assert_eq!(report.sessions.len(), DEVICES as usize);

        let mut next: HashMap<DeviceId, i32> = HashMap::new();
        for (device, snapshot) in received {
            let device = device.expect("json messages carry the device");
            let expected = next.entry(device).or_insert(0);
            assert_eq!(snapshot.translation(), [*expected, device.0 as i32, 0]);
            *expected += 1;
        }
        assert!(next.values().all(|&n| n == i32::from(PER_DEVICE)));
    }

    #[tokio::test]
    async fn test_shutdown_without_sessions_closes_output() {
        let (client, server) = tokio::io::duplex(64);
        let bridge = Bridge::start(
            server,
            SnapshotFormat::List,
            4,
            Duration::from_millis(5),
            CancellationToken::new(),
        );

        let report = bridge.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(report.sessions.is_empty());
        assert_eq!(report.sink.messages, 0);

        let mut reader = BufReader::new(client);
        assert!(read_snapshot_async(&mut reader).await.unwrap().is_none());
    }
}
