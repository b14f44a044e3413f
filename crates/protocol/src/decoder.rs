//! Report decoding state machine
//!
//! Decoding a report is a two-phase update of the device's [`AxisState`]:
//!
//! 1. The slots owned by the report kind are overwritten with the raw
//!    values from the report, and the snapshot is captured.
//! 2. The reduction pass maps the freshly written numeric slots to -1, 0
//!    or 1 in place. Slots reduced by earlier reports are left alone.
//!
//! The snapshot therefore shows raw values for the slots just written, and
//! the reduced values left behind by earlier reports for everything else.

use crate::error::Result;
use crate::report::Report;
use crate::snapshot::Snapshot;
use crate::state::AxisState;

/// Values above this threshold reduce to 1, values below its negation to -1
pub const REDUCTION_THRESHOLD: i32 = 50;

/// Reduce a numeric slot to -1, 0 or 1
///
/// # Example
/// ```
/// use protocol::reduce_axis;
///
/// assert_eq!(reduce_axis(60), 1);
/// assert_eq!(reduce_axis(44), 0);
/// assert_eq!(reduce_axis(-51), -1);
/// ```
pub fn reduce_axis(value: i32) -> i32 {
    if value > REDUCTION_THRESHOLD {
        1
    } else if value < -REDUCTION_THRESHOLD {
        -1
    } else {
        0
    }
}

/// Decode a raw report into `state` and return the resulting snapshot
///
/// On error (empty buffer, unknown kind, short report) `state` is left
/// untouched and no snapshot is produced.
///
/// # Example
/// ```
/// use protocol::{AxisState, decode};
///
/// let mut state = AxisState::new();
/// let snapshot = decode(&[1, 0, 0, 60, 0, 0, 0, 0], &mut state).unwrap();
/// assert_eq!(snapshot.translation(), [0, 60, 0]);
/// assert_eq!(state.translation(), [0, 1, 0]);
/// ```
pub fn decode(raw: &[u8], state: &mut AxisState) -> Result<Snapshot> {
    let report = Report::parse(raw)?;
    Ok(apply(report, state))
}

/// Apply an already-parsed report to `state`
pub fn apply(report: Report, state: &mut AxisState) -> Snapshot {
    match report {
        Report::Translation(values) => state.set_translation(values),
        Report::Rotation(values) => state.set_rotation(values),
        Report::Button { button1, button2 } => state.set_buttons(button1, button2),
    }

    let snapshot = Snapshot::from_state(state);
    state.reduce();
    snapshot
}
