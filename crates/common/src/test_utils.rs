//! Test utilities for spacenav-bridge
//!
//! Provides raw report builders and helper functions for testing across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::translation_report;
//!
//! let raw = translation_report([0, 60, 0]);
//! assert_eq!(raw, [1, 0, 0, 60, 0, 0, 0, 0]);
//! ```

use protocol::{REPORT_SIZE, ReportKind};
use std::future::Future;
use std::time::Duration;

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a raw translation report
pub fn translation_report(values: [i16; 3]) -> [u8; REPORT_SIZE] {
    axis_report(ReportKind::Translation, values)
}

/// Build a raw rotation report
pub fn rotation_report(values: [i16; 3]) -> [u8; REPORT_SIZE] {
    axis_report(ReportKind::Rotation, values)
}

/// Build a raw button report
///
/// # Example
/// ```
/// use common::test_utils::button_report;
///
/// assert_eq!(button_report(true, true)[1], 0b11);
/// ```
pub fn button_report(button1: bool, button2: bool) -> [u8; REPORT_SIZE] {
    let mut raw = [0u8; REPORT_SIZE];
    raw[0] = ReportKind::Button as u8;
    raw[1] = u8::from(button1) | (u8::from(button2) << 1);
    raw
}

fn axis_report(kind: ReportKind, values: [i16; 3]) -> [u8; REPORT_SIZE] {
    let mut raw = [0u8; REPORT_SIZE];
    raw[0] = kind as u8;
    for (i, value) in values.iter().enumerate() {
        raw[1 + i * 2..3 + i * 2].copy_from_slice(&value.to_le_bytes());
    }
    raw
}

/// Run an async operation with a timeout
///
/// # Example
/// ```
/// use common::test_utils::{with_timeout, DEFAULT_TEST_TIMEOUT};
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_timeout(DEFAULT_TEST_TIMEOUT, async {
///         // Your async test logic here
///         42
///     }).await.unwrap();
///     assert_eq!(result, 42);
/// }
/// ```
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

/// Error returned when a test times out
#[derive(Debug)]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_report_layout() {
        assert_eq!(translation_report([0, 44, 0]), [1, 0, 0, 44, 0, 0, 0, 0]);
        assert_eq!(
            rotation_report([-1, -14336, 256]),
            [2, 0xff, 0xff, 0x00, 0xc8, 0x00, 0x01, 0]
        );
    }

    #[test]
    fn test_button_report_layout() {
        assert_eq!(button_report(false, false)[..2], [3, 0]);
        assert_eq!(button_report(true, false)[..2], [3, 1]);
        assert_eq!(button_report(false, true)[..2], [3, 2]);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(DEFAULT_TEST_TIMEOUT, async { 42 }).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_failure() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(result.is_err());
    }
}
