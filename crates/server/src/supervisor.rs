//! Session supervisor
//!
//! Starts one [`DeviceSession`] thread per device, all publishing into the
//! same snapshot queue, and performs cooperative shutdown through a shared
//! [`CancellationToken`].

use crate::usb::{DeviceSession, ReportSource, SessionStats};
use anyhow::{Context, Result};
use common::SnapshotPublisher;
use protocol::DeviceId;
use std::fmt::Display;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Tracks the running device sessions
pub struct SessionSupervisor {
    publisher: SnapshotPublisher,
    token: CancellationToken,
    read_timeout: Duration,
    sessions: Vec<(DeviceId, JoinHandle<SessionStats>)>,
}

impl SessionSupervisor {
    pub fn new(
        publisher: SnapshotPublisher,
        token: CancellationToken,
        read_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            token,
            read_timeout,
            sessions: Vec::new(),
        }
    }

    /// Start a session thread for an already-opened source
    pub fn start<S>(&mut self, id: DeviceId, source: S) -> Result<()>
    where
        S: ReportSource + 'static,
    {
        let session = DeviceSession::new(id, source, self.publisher.clone(), self.read_timeout);
        let token = self.token.clone();

        let handle = std::thread::Builder::new()
            .name(format!("session-{}", id.0))
            .spawn(move || session.run(token))
            .with_context(|| format!("Failed to spawn session thread for device {}", id))?;

        self.sessions.push((id, handle));
        Ok(())
    }

    /// Set up and start a session for every device
    ///
    /// Devices are numbered in iteration order. A device whose setup fails
    /// is logged and skipped; the rest still start. Returns the number of
    /// sessions started.
    pub fn start_all<D, S, E, F>(
        &mut self,
        devices: impl IntoIterator<Item = D>,
        mut setup: F,
    ) -> usize
    where
        S: ReportSource + 'static,
        E: Display,
        F: FnMut(DeviceId, D) -> std::result::Result<S, E>,
    {
        let mut started = 0;

        for (index, device) in devices.into_iter().enumerate() {
            let id = DeviceId(index as u32);

            let source = match setup(id, device) {
                Ok(source) => source,
                Err(e) => {
                    error!("Endpoint setup failed for device {}: {}", id, e);
                    continue;
                }
            };

            match self.start(id, source) {
                Ok(()) => started += 1,
                Err(e) => error!("{:#}", e),
            }
        }

        info!("Started {} device session(s)", started);
        started
    }

    /// Ask every session to stop after its current read
    pub fn shutdown(&self) {
        info!("Stopping {} device session(s)", self.sessions.len());
        self.token.cancel();
    }

    /// Wait for every session thread to finish
    ///
    /// Blocks; call from a blocking context. A panicked session is logged
    /// and left out of the result.
    pub fn join(self) -> Vec<(DeviceId, SessionStats)> {
        let mut results = Vec::with_capacity(self.sessions.len());

        for (id, handle) in self.sessions {
            match handle.join() {
                Ok(stats) => results.push((id, stats)),
                Err(e) => error!("Session {} panicked: {:?}", id, e),
            }
        }

        results
    }
}
