//! Protocol library for spacenav-bridge
//!
//! This crate defines the raw report format of the 3D navigation controller,
//! the per-device [`AxisState`] the reports are folded into, and the
//! [`Snapshot`] text messages written to the output stream.
//!
//! # Example
//!
//! ```
//! use protocol::{AxisState, DeviceId, SnapshotFormat, decode};
//!
//! let mut state = AxisState::new();
//!
//! // Translation report: X=0, Y=60, Z=0
//! let snapshot = decode(&[1, 0, 0, 60, 0, 0, 0, 0], &mut state).unwrap();
//! assert_eq!(snapshot.values(), &[0, 60, 0, 0, 0, 0, 0, 0]);
//!
//! // Stored state is reduced for the next report
//! assert_eq!(state.translation(), [0, 1, 0]);
//!
//! let line = snapshot.encode(DeviceId(0), SnapshotFormat::List).unwrap();
//! assert_eq!(line, "[0, 60, 0, 0, 0, 0, 0, 0]\n");
//! ```

pub mod codec;
pub mod decoder;
pub mod error;
pub mod report;
pub mod snapshot;
pub mod state;

pub use codec::read_snapshot;
#[cfg(feature = "async")]
pub use codec::read_snapshot_async;
pub use decoder::{REDUCTION_THRESHOLD, apply, decode, reduce_axis};
pub use error::{ProtocolError, Result};
pub use report::{REPORT_SIZE, Report, ReportKind, decode16};
pub use snapshot::{
    DeviceId, MESSAGE_DELIMITER, SNAPSHOT_LEN, Snapshot, SnapshotFormat, SnapshotMessage,
    parse_snapshot_line,
};
pub use state::{AXIS_COUNT, AxisState, BUTTON_COUNT};
