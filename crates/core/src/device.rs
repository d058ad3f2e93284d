//! USB device handle backed by libusb (via `rusb`).
//!
//! Opens a device by its exact vendor/product pair. Enumeration, hot-plug and
//! multi-device selection are left to the caller.

use crate::error::{Error, Result, TransferError};
use crate::transport::UsbTransport;
use crate::wire::INTERFACE;
use rusb::{DeviceHandle, GlobalContext};
use std::time::Duration;
use tracing::{debug, info};

/// A USB vendor/product identifier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl std::fmt::Display for UsbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid, self.pid)
    }
}

impl std::str::FromStr for UsbId {
    type Err = Error;

    /// Parse `"VID:PID"` in hex, as printed by `lsusb`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation {
            field: "device",
            reason: format!("'{s}' is not of the form VID:PID (hex)"),
        };
        let (vid, pid) = s.split_once(':').ok_or_else(invalid)?;
        let parse = |h: &str| {
            let h = h.trim_start_matches("0x").trim_start_matches("0X");
            u16::from_str_radix(h, 16).map_err(|_| invalid())
        };
        Ok(Self {
            vid: parse(vid)?,
            pid: parse(pid)?,
        })
    }
}

impl From<rusb::Error> for TransferError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Timeout => Self::Timeout,
            rusb::Error::NoDevice | rusb::Error::NotFound => Self::Disconnected,
            rusb::Error::Access => Self::PermissionDenied,
            rusb::Error::Busy => Self::Busy,
            other => Self::Usb(other.to_string()),
        }
    }
}

/// An open USB device.
pub struct UsbDevice {
    handle: DeviceHandle<GlobalContext>,
    id: UsbId,
}

impl UsbDevice {
    /// Open the first device matching `id`.
    pub fn open(id: UsbId) -> Result<Self> {
        let mut handle = rusb::open_device_with_vid_pid(id.vid, id.pid)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;

        // Kernel HID driver owns the interface; detach on claim, reattach on release.
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => {
                return Err(Error::InterfaceClaim {
                    interface: INTERFACE,
                    cause: e.into(),
                })
            }
        }

        info!(device = %id, "Opened USB device");
        Ok(Self { handle, id })
    }
}

impl UsbTransport for UsbDevice {
    fn claim_interface(&mut self, interface: u8) -> std::result::Result<(), TransferError> {
        debug!(device = %self.id, interface, "claim_interface");
        Ok(self.handle.claim_interface(interface)?)
    }

    fn release_interface(&mut self, interface: u8) -> std::result::Result<(), TransferError> {
        debug!(device = %self.id, interface, "release_interface");
        Ok(self.handle.release_interface(interface)?)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, TransferError> {
        Ok(self
            .handle
            .write_control(request_type, request, value, index, data, timeout)?)
    }

    fn write_interrupt(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, TransferError> {
        Ok(self.handle.write_interrupt(endpoint, data, timeout)?)
    }
}
