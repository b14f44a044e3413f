//! USB device abstraction
//!
//! This module wraps an opened rusb handle for one 3D navigation controller:
//! kernel driver detach/reattach, interface claim, endpoint resolution, and
//! the bounded report read used by the session loop.

use crate::usb::session::{ReadError, ReportSource};
use protocol::DeviceId;
use rusb::{Context, Device, DeviceHandle, Direction, TransferType};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure while preparing a device for reading
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to open device: {0}")]
    Open(rusb::Error),

    #[error("failed to detach kernel driver: {0}")]
    KernelDriver(rusb::Error),

    #[error("failed to read config descriptor: {0}")]
    Descriptor(rusb::Error),

    #[error("interface {0} not found")]
    NoInterface(u8),

    #[error("no IN endpoint on interface {0}")]
    NoInputEndpoint(u8),

    #[error("failed to claim interface {interface}: {source}")]
    Claim { interface: u8, source: rusb::Error },
}

/// Endpoint descriptor fields the session needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub address: u8,
    pub direction: Direction,
    pub transfer_type: TransferType,
    pub max_packet_size: u16,
}

/// Endpoints of the claimed interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Report endpoint
    pub input: Endpoint,
    /// Host-to-device endpoint, absent on input-only interfaces
    pub output: Option<Endpoint>,
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = self.input;
        write!(f, "IN {:#04x} ({} bytes)", input.address, input.max_packet_size)?;
        match self.output {
            Some(ep) => write!(f, ", OUT {:#04x}", ep.address),
            None => write!(f, ", no OUT"),
        }
    }
}

/// Pick the first IN endpoint and the first OUT endpoint
pub fn select_endpoints(endpoints: &[Endpoint], interface: u8) -> Result<Endpoints, SetupError> {
    let input = endpoints
        .iter()
        .find(|ep| ep.direction == Direction::In)
        .copied()
        .ok_or(SetupError::NoInputEndpoint(interface))?;
    let output = endpoints
        .iter()
        .find(|ep| ep.direction == Direction::Out)
        .copied();
    Ok(Endpoints { input, output })
}

/// Map a rusb read failure to the session's error taxonomy
pub fn classify_read_error(e: rusb::Error) -> ReadError {
    match e {
        rusb::Error::Timeout => ReadError::Timeout,
        rusb::Error::Io | rusb::Error::Pipe | rusb::Error::Overflow | rusb::Error::Interrupted => {
            ReadError::Transport(e.to_string())
        }
        other => ReadError::Unexpected(other.to_string()),
    }
}

/// An opened controller ready for report reads
pub struct SpaceDevice {
    id: DeviceId,
    /// Device handle (None once closed)
    handle: Option<DeviceHandle<Context>>,
    interface: u8,
    endpoints: Endpoints,
    /// Whether we detached a kernel driver and must reattach it on close
    reattach: bool,
}

impl SpaceDevice {
    /// Open a device and prepare `interface` for reading
    ///
    /// Detaches an active kernel driver (remembering to reattach it),
    /// resolves the endpoints of alt-setting 0, and claims the interface.
    /// On failure the kernel driver is restored before returning.
    pub fn open(device: &Device<Context>, id: DeviceId, interface: u8) -> Result<Self, SetupError> {
        let handle = device.open().map_err(SetupError::Open)?;

        let reattach = match handle.kernel_driver_active(interface) {
            Ok(true) => {
                debug!(
                    "Detaching kernel driver from interface {} on device {}",
                    interface, id
                );
                handle
                    .detach_kernel_driver(interface)
                    .map_err(SetupError::KernelDriver)?;
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                false
            }
        };

        let prepared = Self::resolve_endpoints(device, interface).and_then(|endpoints| {
            handle
                .claim_interface(interface)
                .map_err(|source| SetupError::Claim { interface, source })?;
            Ok(endpoints)
        });

        let endpoints = match prepared {
            Ok(endpoints) => endpoints,
            Err(e) => {
                if reattach {
                    if let Err(err) = handle.attach_kernel_driver(interface) {
                        warn!("Failed to reattach kernel driver on device {}: {}", id, err);
                    }
                }
                return Err(e);
            }
        };

        debug!("Opened device {}: {}", id, endpoints);

        Ok(Self {
            id,
            handle: Some(handle),
            interface,
            endpoints,
            reattach,
        })
    }

    fn resolve_endpoints(
        device: &Device<Context>,
        interface: u8,
    ) -> Result<Endpoints, SetupError> {
        let config = device
            .active_config_descriptor()
            .or_else(|_| device.config_descriptor(0))
            .map_err(SetupError::Descriptor)?;

        let descriptor = config
            .interfaces()
            .find(|iface| iface.number() == interface)
            .and_then(|iface| iface.descriptors().find(|d| d.setting_number() == 0))
            .ok_or(SetupError::NoInterface(interface))?;

        let endpoints: Vec<Endpoint> = descriptor
            .endpoint_descriptors()
            .map(|ep| Endpoint {
                address: ep.address(),
                direction: ep.direction(),
                transfer_type: ep.transfer_type(),
                max_packet_size: ep.max_packet_size(),
            })
            .collect();

        select_endpoints(&endpoints, interface)
    }
}

impl ReportSource for SpaceDevice {
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| ReadError::Unexpected("device closed".to_string()))?;

        let input = self.endpoints.input;
        let result = match input.transfer_type {
            TransferType::Bulk => handle.read_bulk(input.address, buf, timeout),
            _ => handle.read_interrupt(input.address, buf, timeout),
        };

        result.map_err(classify_read_error)
    }

    fn report_len(&self) -> usize {
        usize::from(self.endpoints.input.max_packet_size)
    }

    /// Release the interface and hand the device back to the kernel driver
    fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.release_interface(self.interface) {
                warn!("Failed to release interface {}: {}", self.interface, e);
            }

            if self.reattach {
                match handle.attach_kernel_driver(self.interface) {
                    Ok(()) => debug!(
                        "Reattached kernel driver to interface {} on device {}",
                        self.interface, self.id
                    ),
                    Err(e) => warn!(
                        "Failed to reattach kernel driver to interface {} on device {}: {}",
                        self.interface, self.id, e
                    ),
                }
            }

            debug!("Closed device {} ({})", self.id, self.endpoints);
        }
    }
}

impl Drop for SpaceDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(address: u8, direction: Direction) -> Endpoint {
        Endpoint {
            address,
            direction,
            transfer_type: TransferType::Interrupt,
            max_packet_size: 8,
        }
    }

    #[test]
    fn test_select_endpoints_in_and_out() {
        let eps = [endpoint(0x01, Direction::Out), endpoint(0x81, Direction::In)];
        let endpoints = select_endpoints(&eps, 0).unwrap();
        assert_eq!(endpoints.input.address, 0x81);
        assert_eq!(endpoints.output.map(|ep| ep.address), Some(0x01));
        assert_eq!(endpoints.to_string(), "IN 0x81 (8 bytes), OUT 0x01");
    }

    #[test]
    fn test_select_endpoints_input_only() {
        let eps = [endpoint(0x81, Direction::In), endpoint(0x82, Direction::In)];
        let endpoints = select_endpoints(&eps, 0).unwrap();
        assert_eq!(endpoints.input.address, 0x81);
        assert!(endpoints.output.is_none());
        assert_eq!(endpoints.to_string(), "IN 0x81 (8 bytes), no OUT");
    }

    #[test]
    fn test_select_endpoints_without_input_fails() {
        let eps = [endpoint(0x01, Direction::Out)];
        assert!(matches!(
            select_endpoints(&eps, 2),
            Err(SetupError::NoInputEndpoint(2))
        ));
        assert!(select_endpoints(&[], 0).is_err());
    }

    #[test]
    fn test_classify_read_error() {
        assert!(matches!(
            classify_read_error(rusb::Error::Timeout),
            ReadError::Timeout
        ));
        for e in [
            rusb::Error::Io,
            rusb::Error::Pipe,
            rusb::Error::Overflow,
            rusb::Error::Interrupted,
        ] {
            assert!(matches!(classify_read_error(e), ReadError::Transport(_)));
        }
        for e in [rusb::Error::NoDevice, rusb::Error::Access, rusb::Error::Other] {
            assert!(matches!(classify_read_error(e), ReadError::Unexpected(_)));
        }
    }
}
