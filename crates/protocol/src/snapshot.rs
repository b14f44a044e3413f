//! Snapshot type and its textual wire formats

use crate::error::{ProtocolError, Result};
use crate::state::AxisState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of elements in a snapshot
pub const SNAPSHOT_LEN: usize = 8;

/// Output of one decode call
///
/// Layout: `[tx, ty, tz, rx, ry, rz, button1, button2]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot([i32; SNAPSHOT_LEN]);

impl Snapshot {
    /// Build a snapshot from raw values
    pub const fn new(values: [i32; SNAPSHOT_LEN]) -> Self {
        Self(values)
    }

    pub(crate) fn from_state(state: &AxisState) -> Self {
        let axes = state.axes();
        let [b1, b2] = state.buttons();
        Self([
            axes[0],
            axes[1],
            axes[2],
            axes[3],
            axes[4],
            axes[5],
            i32::from(b1),
            i32::from(b2),
        ])
    }

    pub fn values(&self) -> &[i32; SNAPSHOT_LEN] {
        &self.0
    }

    pub fn translation(&self) -> [i32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn rotation(&self) -> [i32; 3] {
        [self.0[3], self.0[4], self.0[5]]
    }

    pub fn buttons(&self) -> [i32; 2] {
        [self.0[6], self.0[7]]
    }

    /// Encode as one newline-terminated message in the given format
    ///
    /// # Example
    /// ```
    /// use protocol::{DeviceId, Snapshot, SnapshotFormat};
    ///
    /// let snapshot = Snapshot::new([0, 44, 0, 0, 0, 0, 1, 0]);
    /// let line = snapshot.encode(DeviceId(0), SnapshotFormat::List).unwrap();
    /// assert_eq!(line, "[0, 44, 0, 0, 0, 0, 1, 0]\n");
    /// ```
    pub fn encode(&self, device: DeviceId, format: SnapshotFormat) -> Result<String> {
        let mut line = match format {
            SnapshotFormat::List => self.to_string(),
            SnapshotFormat::Json => serde_json::to_string(&SnapshotMessage {
                device,
                values: *self,
            })?,
        };
        line.push(MESSAGE_DELIMITER);
        Ok(line)
    }
}

impl From<[i32; SNAPSHOT_LEN]> for Snapshot {
    fn from(values: [i32; SNAPSHOT_LEN]) -> Self {
        Self(values)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

/// Delimiter terminating every message on the output stream
pub const MESSAGE_DELIMITER: char = '\n';

/// Device ordinal, assigned in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// JSON-format message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub device: DeviceId,
    pub values: Snapshot,
}

/// Textual encoding used on the output stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Bare list, e.g. `[0, 44, 0, 0, 0, 0, 0, 0]`
    #[default]
    List,
    /// JSON object carrying the device ordinal, e.g. `{"device":0,"values":[...]}`
    Json,
}

impl FromStr for SnapshotFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(SnapshotFormat::List),
            "json" => Ok(SnapshotFormat::Json),
            other => Err(ProtocolError::MalformedSnapshot(format!(
                "unknown format '{}'",
                other
            ))),
        }
    }
}

/// Parse one message line as written by [`Snapshot::encode`]
///
/// Accepts either format. The device ordinal is only present in JSON
/// messages.
pub fn parse_snapshot_line(line: &str) -> Result<(Option<DeviceId>, Snapshot)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with('{') {
        let message: SnapshotMessage = serde_json::from_str(line)?;
        Ok((Some(message.device), message.values))
    } else if line.starts_with('[') {
        let values: [i32; SNAPSHOT_LEN] = serde_json::from_str(line)?;
        Ok((None, Snapshot(values)))
    } else {
        Err(ProtocolError::MalformedSnapshot(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_list_format() {
        let snapshot = Snapshot::new([0, -14336, 0, 1, 0, -1, 0, 1]);
        assert_eq!(snapshot.to_string(), "[0, -14336, 0, 1, 0, -1, 0, 1]");
    }

    #[test]
    fn test_json_encoding() {
        let snapshot = Snapshot::new([1, 2, 3, 4, 5, 6, 0, 1]);
        let line = snapshot.encode(DeviceId(3), SnapshotFormat::Json).unwrap();
        assert_eq!(line, "{\"device\":3,\"values\":[1,2,3,4,5,6,0,1]}\n");
    }

    #[test]
    fn test_parse_both_formats() {
        let snapshot = Snapshot::new([0, 60, 0, -1, 0, 0, 1, 0]);

        let list = snapshot.encode(DeviceId(1), SnapshotFormat::List).unwrap();
        assert_eq!(parse_snapshot_line(&list).unwrap(), (None, snapshot));

        let json = snapshot.encode(DeviceId(1), SnapshotFormat::Json).unwrap();
        assert_eq!(
            parse_snapshot_line(&json).unwrap(),
            (Some(DeviceId(1)), snapshot)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_snapshot_line("hello").is_err());
        assert!(parse_snapshot_line("[1, 2, 3]").is_err());
        assert!(parse_snapshot_line("{\"device\":1}").is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("list".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::List);
        assert_eq!("JSON".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::Json);
        assert!("xml".parse::<SnapshotFormat>().is_err());
    }
}
