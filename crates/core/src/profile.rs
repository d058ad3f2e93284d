//! Profile record: the desired lighting and DPI state of the mouse.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Number of LED zones.
pub const LED_COUNT: usize = 8;
/// Number of DPI levels.
pub const DPI_LEVELS: usize = 6;

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Parse `"R,G,B"` with each channel in 0..=255.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(Error::Validation {
                field: "color",
                reason: format!("'{s}' is not of the form R,G,B"),
            });
        }
        let channel = |p: &str| {
            p.parse::<u8>().map_err(|_| Error::Validation {
                field: "color",
                reason: format!("'{s}': channel '{p}' must be 0-255"),
            })
        };
        Ok(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
        ))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_bytes().serialize(s)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    /// Accepts `[r, g, b]` or `{ "r": .., "g": .., "b": .. }`.
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RgbRepr {
            Triple([u8; 3]),
            Named { r: u8, g: u8, b: u8 },
        }

        Ok(match RgbRepr::deserialize(d)? {
            RgbRepr::Triple([r, g, b]) => Rgb::new(r, g, b),
            RgbRepr::Named { r, g, b } => Rgb::new(r, g, b),
        })
    }
}

/// Desired device state.
///
/// Sequence lengths are fixed at 8 LED colors, 6 DPI values and 6 DPI colors.
/// `active_dpi` is 1-based. Run [`crate::safety::validate_profile`] before
/// handing a record to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Lighting effect name, resolved through the selector table.
    pub effect: String,
    pub led_colors: Vec<Rgb>,
    pub dpi_values: Vec<u16>,
    pub active_dpi: u8,
    pub dpi_colors: Vec<Rgb>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            effect: "standard".into(),
            led_colors: vec![Rgb::new(255, 0, 0); LED_COUNT],
            dpi_values: vec![1000, 1600, 2400, 4800, 9600, 12600],
            active_dpi: 2,
            dpi_colors: vec![
                Rgb::new(255, 0, 0),
                Rgb::new(255, 128, 0),
                Rgb::new(255, 255, 0),
                Rgb::new(0, 255, 0),
                Rgb::new(0, 255, 255),
                Rgb::new(0, 0, 255),
            ],
        }
    }
}

impl Profile {
    /// DPI value of the active level, if the level is in range.
    pub fn active_dpi_value(&self) -> Option<u16> {
        let idx = usize::from(self.active_dpi).checked_sub(1)?;
        self.dpi_values.get(idx).copied()
    }
}

/// Default profile location: `<config_dir>/cosmic-mouse/profile.json`.
pub fn default_profile_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cosmic-mouse")
        .join("profile.json")
}

/// Load a profile, or the defaults if no file exists yet.
pub fn load_profile(path: &Path) -> Result<Profile> {
    if !path.exists() {
        return Ok(Profile::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Profile(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Profile(format!("parse {}: {e}", path.display())))
}

/// Save a profile, creating the parent directory if needed.
pub fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Profile(format!("create {}: {e}", parent.display())))?;
    }
    let content = serde_json::to_string_pretty(profile)
        .map_err(|e| Error::Profile(format!("serialize: {e}")))?;
    std::fs::write(path, content)
        .map_err(|e| Error::Profile(format!("write {}: {e}", path.display())))
}
