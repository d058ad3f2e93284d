//! Transfer script: the ordered sequence of transfers that applies a profile.
//!
//! The firmware is a fixed-function state machine. Steps must be sent in this
//! exact order with their settle delays; a reordered, skipped or rushed step
//! leaves the device ignoring the update or unresponsive until power-cycled.
//!
//! The fixed payloads below were captured from the vendor tool. Their meaning
//! is unknown; they are opaque and must be sent byte for byte.
//!
//! Layout (23 steps):
//!
//! | #     | Phase      | Transfer                                         |
//! |-------|------------|--------------------------------------------------|
//! | 0-3   | Preamble   | 4 fixed control                                  |
//! | 4-7   | ModeSelect | DPI level, fixed, effect, arm                    |
//! | 8-20  | Upload     | colors/confirm, DPI colors/confirm, DPI/confirm, |
//! |       |            | 3 status packets, confirm, 2 zero packets, confirm|
//! | 21-22 | Commit     | commit packet, final control (50 ms settle)      |

use crate::encode::{encode_profile, Packet};
use crate::error::Result;
use crate::profile::Profile;
use crate::selectors::{ControlCode, SelectorTable};
use crate::wire::{COMMIT_SETTLE, CONTROL_LEN, PACKET_LEN, SETTLE};
use std::time::Duration;

const PREAMBLE: [[u8; CONTROL_LEN]; 4] = [
    [0x27, 0x27, 0xD5, 0xFF, 0xEC, 0x0D, 0x9E, 0x76],
    [0x25, 0x2D, 0xAD, 0xFF, 0xE8, 0x12, 0x0E, 0xEE],
    [0x27, 0x2B, 0xD5, 0xFF, 0xF0, 0x05, 0x9E, 0x76],
    [0x27, 0x2B, 0xDD, 0xFF, 0xF0, 0xFD, 0x9E, 0x76],
];

/// Sent between the DPI level and effect selectors.
const MODE_LATCH: [u8; CONTROL_LEN] = [0x27, 0x2B, 0x95, 0x04, 0xA0, 0x15, 0x9E, 0x76];
/// Arms the device for the color upload.
const UPLOAD_ARM: [u8; CONTROL_LEN] = [0x27, 0x2A, 0x8D, 0xFF, 0xE8, 0x75, 0x9E, 0x36];

const CONFIRM_LED_COLORS: [u8; CONTROL_LEN] = [0x27, 0x2A, 0x85, 0xFF, 0xF0, 0x75, 0x9E, 0x36];
const CONFIRM_DPI_COLORS: [u8; CONTROL_LEN] = [0x27, 0x2B, 0xF5, 0xFF, 0xD8, 0x7D, 0x9E, 0xB6];
const CONFIRM_DPI_VALUES: [u8; CONTROL_LEN] = [0x27, 0x2D, 0x55, 0xFF, 0xF0, 0x85, 0xA0, 0x76];
const CONFIRM_STATUS: [u8; CONTROL_LEN] = [0x27, 0x2D, 0x2D, 0xFF, 0xF8, 0x85, 0xA0, 0x76];
const CONFIRM_PADDING: [u8; CONTROL_LEN] = [0x27, 0x2B, 0xF5, 0xFF, 0x00, 0x75, 0x9E, 0xD6];
const COMMIT_CONTROL: [u8; CONTROL_LEN] = [0x27, 0x2C, 0x6D, 0x02, 0x38, 0x3A, 0xB4, 0xD6];

const STATUS_PACKETS: [Packet; 3] = [
    [
        0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0xFF, 0x00, 0xFF,
        0x00, 0xFF, 0xFF, 0xFF, 0x80, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ],
    [
        0x01, 0x00, 0xF0, 0x00, 0x01, 0x00, 0xF1, 0x00, 0x01, 0x00, 0xF2, 0x00, 0x01, 0x00, 0xF4,
        0x00, 0x01, 0x00, 0xF3, 0x00, 0x07, 0x00, 0x03, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x0A, 0xF0,
        0x21, 0x03,
    ],
    [
        0x0B, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, 0x00, 0x04, 0x00,
        0x02, 0x00,
    ],
];

const ZERO_PACKET: Packet = [0u8; PACKET_LEN];

const COMMIT_PACKET: Packet = {
    let mut p = [0u8; PACKET_LEN];
    p[0] = 0xFF;
    p
};

/// Protocol phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preamble,
    ModeSelect,
    Upload,
    Commit,
}

/// One USB transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// SET_REPORT control transfer on the configuration interface.
    Control([u8; CONTROL_LEN]),
    /// 32-byte write to the interrupt OUT endpoint.
    Interrupt(Packet),
}

impl Transfer {
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Control(p) => p.as_slice(),
            Self::Interrupt(p) => p.as_slice(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Control(_) => "control",
            Self::Interrupt(_) => "interrupt",
        }
    }
}

/// A transfer plus the delay that must elapse before the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub phase: Phase,
    pub transfer: Transfer,
    pub settle: Duration,
}

/// The complete, ordered list of steps for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferScript {
    steps: Vec<Step>,
}

impl TransferScript {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

struct Builder {
    steps: Vec<Step>,
    phase: Phase,
}

impl Builder {
    fn phase(&mut self, phase: Phase) -> &mut Self {
        self.phase = phase;
        self
    }

    fn control(&mut self, payload: [u8; CONTROL_LEN]) -> &mut Self {
        self.push(Transfer::Control(payload))
    }

    fn interrupt(&mut self, payload: Packet) -> &mut Self {
        self.push(Transfer::Interrupt(payload))
    }

    fn push(&mut self, transfer: Transfer) -> &mut Self {
        self.steps.push(Step {
            phase: self.phase,
            transfer,
            settle: SETTLE,
        });
        self
    }
}

/// Build the transfer script for a profile.
///
/// Fails with an encoding error or [`crate::error::Error::UnknownSelector`]
/// before anything is sent. The profile is expected to have passed
/// [`crate::safety::validate_profile`].
pub fn build_script(profile: &Profile, selectors: &SelectorTable) -> Result<TransferScript> {
    let ControlCode(dpi_select) = selectors.dpi_level(profile.active_dpi)?;
    let ControlCode(effect_select) = selectors.effect(&profile.effect)?;
    let payloads = encode_profile(profile)?;

    let mut b = Builder {
        steps: Vec::with_capacity(23),
        phase: Phase::Preamble,
    };

    for cmd in PREAMBLE {
        b.control(cmd);
    }

    b.phase(Phase::ModeSelect)
        .control(dpi_select)
        .control(MODE_LATCH)
        .control(effect_select)
        .control(UPLOAD_ARM);

    b.phase(Phase::Upload)
        .interrupt(payloads.led_colors)
        .control(CONFIRM_LED_COLORS)
        .interrupt(payloads.dpi_colors)
        .control(CONFIRM_DPI_COLORS)
        .interrupt(payloads.dpi_values)
        .control(CONFIRM_DPI_VALUES);
    for packet in STATUS_PACKETS {
        b.interrupt(packet);
    }
    b.control(CONFIRM_STATUS)
        .interrupt(ZERO_PACKET)
        .interrupt(ZERO_PACKET)
        .control(CONFIRM_PADDING);

    b.phase(Phase::Commit)
        .interrupt(COMMIT_PACKET)
        .control(COMMIT_CONTROL);

    let mut steps = b.steps;
    if let Some(last) = steps.last_mut() {
        last.settle = COMMIT_SETTLE;
    }
    Ok(TransferScript { steps })
}
