//! Safety layer: validates a profile record before anything reaches the device.
//!
//! The device accepts whatever bytes it is sent and has no way to report a bad
//! value, so every check here runs before the first transfer.
//!
//! ## DPI
//! - Each value is a multiple of 100 (the device stores DPI / 100).
//! - Range 100 to 25,500. The stored unit is a single byte, so 25,500 is the
//!   largest value the device can represent.
//!
//! ## Levels and colors
//! - Active level is 1-based, 1 to 6.
//! - Exactly 8 LED colors, 6 DPI values and 6 DPI colors.

use crate::error::{Error, Result};
use crate::profile::{Profile, DPI_LEVELS, LED_COUNT};

/// DPI constraints.
pub const DPI_MIN: u16 = 100;
pub const DPI_MAX: u16 = 25500;
pub const DPI_STEP: u16 = 100;

/// Bricking risk disclaimer, shown before device writes.
pub const BRICKING_DISCLAIMER: &str = "\
WARNING: This software replays a reverse-engineered USB command sequence. \
An interrupted write can leave the mouse ignoring input until it is unplugged \
and reconnected. Use at your own risk.";

/// Validate a single DPI value.
pub fn validate_dpi(dpi: u16) -> Result<u16> {
    if !(DPI_MIN..=DPI_MAX).contains(&dpi) {
        return Err(Error::Validation {
            field: "dpi",
            reason: format!("{dpi} outside {DPI_MIN}..={DPI_MAX}"),
        });
    }
    if dpi % DPI_STEP != 0 {
        return Err(Error::Validation {
            field: "dpi",
            reason: format!("{dpi} is not a multiple of {DPI_STEP}"),
        });
    }
    Ok(dpi)
}

/// Validate a 1-based DPI level.
pub fn validate_dpi_level(level: u8) -> Result<u8> {
    if level == 0 || usize::from(level) > DPI_LEVELS {
        return Err(Error::Validation {
            field: "active_dpi",
            reason: format!("level {level} outside 1..={DPI_LEVELS}"),
        });
    }
    Ok(level)
}

fn validate_len(field: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::Validation {
            field,
            reason: format!("expected {expected} entries, got {actual}"),
        });
    }
    Ok(())
}

/// Validate every invariant of a profile record.
///
/// Selector names are not checked here; they are resolved against the
/// selector table when the transfer script is built.
pub fn validate_profile(profile: &Profile) -> Result<()> {
    validate_len("led_colors", profile.led_colors.len(), LED_COUNT)?;
    validate_len("dpi_values", profile.dpi_values.len(), DPI_LEVELS)?;
    validate_len("dpi_colors", profile.dpi_colors.len(), DPI_LEVELS)?;
    for &dpi in &profile.dpi_values {
        validate_dpi(dpi)?;
    }
    validate_dpi_level(profile.active_dpi)?;
    Ok(())
}
