//! Raw report parsing
//!
//! The controller sends fixed-size 8-byte reports on its interrupt IN
//! endpoint. Byte 0 is the report kind; the layout of the remaining bytes
//! depends on the kind:
//!
//! ```text
//! kind 1 (translation): [1][x_lo][x_hi][y_lo][y_hi][z_lo][z_hi][-]
//! kind 2 (rotation):    [2][x_lo][x_hi][y_lo][y_hi][z_lo][z_hi][-]
//! kind 3 (button):      [3][mask][-][-][-][-][-][-]
//! ```
//!
//! Axis values are little-endian two's complement 16-bit integers.

use crate::error::{ProtocolError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Size of a full report as read from the device
pub const REPORT_SIZE: usize = 8;

/// Minimum length of a translation/rotation report (tag + three 16-bit values)
const AXIS_REPORT_LEN: usize = 7;

/// Minimum length of a button report (tag + mask)
const BUTTON_REPORT_LEN: usize = 2;

const BUTTON_1_MASK: u8 = 0x01;
const BUTTON_2_MASK: u8 = 0x02;

/// Report kind, taken from the first byte of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReportKind {
    Translation = 1,
    Rotation = 2,
    Button = 3,
}

impl ReportKind {
    /// Minimum number of bytes a report of this kind must carry
    pub fn min_len(self) -> usize {
        match self {
            ReportKind::Translation | ReportKind::Rotation => AXIS_REPORT_LEN,
            ReportKind::Button => BUTTON_REPORT_LEN,
        }
    }
}

impl TryFrom<u8> for ReportKind {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(ReportKind::Translation),
            2 => Ok(ReportKind::Rotation),
            3 => Ok(ReportKind::Button),
            other => Err(ProtocolError::UnknownReportKind(other)),
        }
    }
}

/// A parsed report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Translation along X, Y, Z
    Translation([i16; 3]),
    /// Rotation about X, Y, Z
    Rotation([i16; 3]),
    /// Button states
    Button { button1: bool, button2: bool },
}

impl Report {
    /// Parse a raw report buffer
    ///
    /// Fails without side effects on an empty buffer, an unknown kind tag,
    /// or a buffer too short for its kind. Trailing bytes are ignored.
    ///
    /// # Example
    /// ```
    /// use protocol::Report;
    ///
    /// let report = Report::parse(&[1, 0, 0, 44, 0, 0, 0, 0]).unwrap();
    /// assert_eq!(report, Report::Translation([0, 44, 0]));
    /// ```
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let &tag = raw.first().ok_or(ProtocolError::EmptyReport)?;
        let kind = ReportKind::try_from(tag)?;

        if raw.len() < kind.min_len() {
            return Err(ProtocolError::ReportTooShort {
                needed: kind.min_len(),
                actual: raw.len(),
            });
        }

        let report = match kind {
            ReportKind::Translation => Report::Translation(read_axes(&raw[1..AXIS_REPORT_LEN])),
            ReportKind::Rotation => Report::Rotation(read_axes(&raw[1..AXIS_REPORT_LEN])),
            ReportKind::Button => Report::Button {
                button1: raw[1] & BUTTON_1_MASK != 0,
                button2: (raw[1] & BUTTON_2_MASK) >> 1 != 0,
            },
        };

        Ok(report)
    }

    /// Kind of this report
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Translation(_) => ReportKind::Translation,
            Report::Rotation(_) => ReportKind::Rotation,
            Report::Button { .. } => ReportKind::Button,
        }
    }
}

/// Reconstruct a signed 16-bit value from its little-endian byte pair
///
/// Equivalent to `low + high * 256`, minus 65536 when `high >= 128`.
///
/// # Example
/// ```
/// use protocol::decode16;
///
/// assert_eq!(decode16(44, 0), 44);
/// assert_eq!(decode16(0, 200), -14336);
/// assert_eq!(decode16(0xff, 0xff), -1);
/// ```
pub fn decode16(low: u8, high: u8) -> i16 {
    LittleEndian::read_i16(&[low, high])
}

fn read_axes(bytes: &[u8]) -> [i16; 3] {
    [
        decode16(bytes[0], bytes[1]),
        decode16(bytes[2], bytes[3]),
        decode16(bytes[4], bytes[5]),
    ]
}
