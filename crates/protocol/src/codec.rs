//! Stream helpers for consumers of the snapshot stream
//!
//! The stream is a sequence of newline-terminated messages, one per decoded
//! report:
//!
//! ```text
//! [0, 44, 0, 0, 0, 0, 0, 0]\n
//! [0, 60, 0, 0, 0, 0, 0, 0]\n
//! ```

use crate::error::Result;
use crate::snapshot::{DeviceId, Snapshot, parse_snapshot_line};
use std::io::BufRead;

#[cfg(feature = "async")]
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read the next snapshot from a buffered stream
///
/// Returns `Ok(None)` at end of stream. Blank lines are skipped.
///
/// # Example
/// ```
/// use protocol::read_snapshot;
/// use std::io::Cursor;
///
/// let mut stream = Cursor::new("[0, 60, 0, 0, 0, 0, 1, 0]\n");
/// let (_, snapshot) = read_snapshot(&mut stream).unwrap().unwrap();
/// assert_eq!(snapshot.translation(), [0, 60, 0]);
/// assert!(read_snapshot(&mut stream).unwrap().is_none());
/// ```
pub fn read_snapshot<R: BufRead>(reader: &mut R) -> Result<Option<(Option<DeviceId>, Snapshot)>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return parse_snapshot_line(&line).map(Some);
        }
    }
}

/// Read the next snapshot from an async buffered stream
///
/// Async counterpart of [`read_snapshot`].
#[cfg(feature = "async")]
pub async fn read_snapshot_async<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<Option<(Option<DeviceId>, Snapshot)>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return parse_snapshot_line(&line).map(Some);
        }
    }
}
