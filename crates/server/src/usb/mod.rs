//! USB subsystem
//!
//! Device discovery, per-device setup and teardown, and the per-device
//! session loop. All USB I/O is blocking and runs on dedicated OS threads,
//! one per device, outside the Tokio runtime.

pub mod device;
pub mod manager;
pub mod session;

// Re-export public types
pub use manager::DeviceManager;
pub use session::{DeviceSession, ReportSource, SessionStats};
