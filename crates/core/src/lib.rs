//! cosmic-mouse-core: configuration protocol for the Cosmic Byte Firestorm mouse.
//!
//! The device has no acknowledgement or retry semantics of its own. A
//! configuration is applied by replaying a fixed, ordered script of USB
//! control and interrupt transfers with mandatory settle delays between them.

pub mod comm;
pub mod device;
pub mod encode;
pub mod error;
pub mod executor;
pub mod presets;
pub mod profile;
pub mod safety;
pub mod script;
pub mod selectors;
pub mod transport;

/// Fixed USB parameters of the configuration protocol.
///
/// These are set by the device firmware and are not configurable.
pub mod wire {
    use std::time::Duration;

    /// Interrupt OUT endpoint used for every 32-byte packet.
    pub const ENDPOINT_OUT: u8 = 0x03;
    /// bmRequestType: host-to-device, class, interface.
    pub const REQUEST_TYPE: u8 = 0x21;
    /// bRequest: HID SET_REPORT.
    pub const REQUEST: u8 = 0x09;
    /// wValue: output report, ID 0.
    pub const VALUE: u16 = 0x0300;
    /// wIndex: the configuration interface.
    pub const INTERFACE: u8 = 2;

    /// Length of a control transfer payload.
    pub const CONTROL_LEN: usize = 8;
    /// Length of an interrupt transfer payload.
    pub const PACKET_LEN: usize = 32;

    /// Per-transfer timeout.
    pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(500);
    /// Settle delay after most steps.
    pub const SETTLE: Duration = Duration::from_millis(20);
    /// Settle delay after the final commit step.
    pub const COMMIT_SETTLE: Duration = Duration::from_millis(50);
}
