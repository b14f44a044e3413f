//! USB device manager
//!
//! Owns the rusb context and handles device enumeration.

use crate::usb::device::{SetupError, SpaceDevice};
use protocol::DeviceId;
use rusb::{Context, Device, DeviceDescriptor, UsbContext};
use std::fmt;
use tracing::{debug, info};

/// Printable summary of a connected USB device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub bus_number: u8,
    pub device_address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bus {:03} Device {:03}: {:04x}:{:04x} - {} {}",
            self.bus_number,
            self.device_address,
            self.vendor_id,
            self.product_id,
            self.manufacturer
                .as_deref()
                .unwrap_or("Unknown Manufacturer"),
            self.product.as_deref().unwrap_or("Unknown Product")
        )
    }
}

/// Whether a descriptor matches the requested vendor/product pair
pub fn matches_ids(descriptor: &DeviceDescriptor, vendor_id: u16, product_id: u16) -> bool {
    descriptor.vendor_id() == vendor_id && descriptor.product_id() == product_id
}

/// USB device manager
pub struct DeviceManager {
    /// USB context for device operations
    context: Context,
}

impl DeviceManager {
    /// Create a new device manager
    pub fn new() -> Result<Self, rusb::Error> {
        let context = Context::new()?;
        Ok(Self { context })
    }

    /// Enumerate devices with the given vendor/product ID
    pub fn find_devices(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Vec<Device<Context>>, rusb::Error> {
        let mut found = Vec::new();

        for device in self.context.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    debug!(
                        "Skipping device on bus {} address {}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            if matches_ids(&descriptor, vendor_id, product_id) {
                info!(
                    "Found device {:04x}:{:04x} on bus {:03} address {:03}",
                    vendor_id,
                    product_id,
                    device.bus_number(),
                    device.address()
                );
                found.push(device);
            }
        }

        Ok(found)
    }

    /// Open a discovered device for report reads
    pub fn open(
        &self,
        device: &Device<Context>,
        id: DeviceId,
        interface: u8,
    ) -> Result<SpaceDevice, SetupError> {
        SpaceDevice::open(device, id, interface)
    }

    /// Summaries of every connected USB device
    pub fn list_devices(&self) -> Result<Vec<DeviceSummary>, rusb::Error> {
        let mut summaries = Vec::new();

        for device in self.context.devices()?.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };

            // String descriptors need an open handle; skip them if access is denied
            let (manufacturer, product) = match device.open() {
                Ok(handle) => (
                    handle.read_manufacturer_string_ascii(&descriptor).ok(),
                    handle.read_product_string_ascii(&descriptor).ok(),
                ),
                Err(_) => (None, None),
            };

            summaries.push(DeviceSummary {
                bus_number: device.bus_number(),
                device_address: device.address(),
                vendor_id: descriptor.vendor_id(),
                product_id: descriptor.product_id(),
                manufacturer,
                product,
            });
        }

        Ok(summaries)
    }
}
