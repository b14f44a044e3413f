//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Report tag outside the known translation/rotation/button set
    #[error("Unknown report kind: {0}")]
    UnknownReportKind(u8),

    /// Report shorter than its kind requires
    #[error("Report too short: needed {needed} bytes, got {actual}")]
    ReportTooShort { needed: usize, actual: usize },

    /// Report buffer was empty
    #[error("Empty report")]
    EmptyReport,

    /// Snapshot line could not be parsed by a consumer
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during stream operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
