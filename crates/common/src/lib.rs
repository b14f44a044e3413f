//! Common utilities for spacenav-bridge
//!
//! This crate provides functionality shared by the bridge binary and its
//! tests: error handling, logging setup, and the snapshot channel that
//! carries decoded snapshots from the blocking device threads to the
//! single async forwarder.

pub mod channel;
pub mod error;
pub mod logging;
pub mod test_utils;

pub use channel::{
    DEFAULT_QUEUE_CAPACITY, Envelope, SnapshotPublisher, SnapshotQueue, create_snapshot_channel,
};
pub use error::{Error, Result};
pub use logging::setup_logging;
