//! Selector tables: effect names and DPI levels to their 8-byte control codes.
//!
//! Both tables are closed: a key that is not present is a caller error and
//! fails with [`Error::UnknownSelector`] before any transfer is issued.
//!
//! Table file format (JSON):
//!
//! ```json
//! {
//!   "effects":    { "standard": "0011223344556677" },
//!   "dpi_levels": { "1": "0011223344556677", "2": "..." }
//! }
//! ```

use crate::error::{Error, Result, SelectorKind};
use crate::profile::DPI_LEVELS;
use crate::wire::CONTROL_LEN;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An 8-byte control transfer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlCode(pub [u8; CONTROL_LEN]);

impl ControlCode {
    /// Parse 16 hex digits (whitespace ignored).
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut code = [0u8; CONTROL_LEN];
        hex::decode_to_slice(&digits, &mut code)
            .map_err(|e| Error::Selectors(format!("'{s}' is not {CONTROL_LEN} hex bytes: {e}")))?;
        Ok(Self(code))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for ControlCode {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ControlCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        ControlCode::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Effect and DPI-level selector codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTable {
    #[serde(default)]
    effects: BTreeMap<String, ControlCode>,
    #[serde(default)]
    dpi_levels: BTreeMap<u8, ControlCode>,
}

impl SelectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an effect code.
    pub fn with_effect(mut self, name: impl Into<String>, code: ControlCode) -> Self {
        self.effects.insert(name.into(), code);
        self
    }

    /// Add or replace a DPI level code (1-based level).
    pub fn with_dpi_level(mut self, level: u8, code: ControlCode) -> Self {
        self.dpi_levels.insert(level, code);
        self
    }

    /// Look up the control code for an effect name.
    pub fn effect(&self, name: &str) -> Result<ControlCode> {
        self.effects
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSelector {
                kind: SelectorKind::Effect,
                key: name.to_string(),
            })
    }

    /// Look up the control code for a 1-based DPI level.
    pub fn dpi_level(&self, level: u8) -> Result<ControlCode> {
        self.dpi_levels
            .get(&level)
            .copied()
            .ok_or_else(|| Error::UnknownSelector {
                kind: SelectorKind::DpiLevel,
                key: level.to_string(),
            })
    }

    /// Known effect names, sorted.
    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    /// Parse a table from JSON and check its keys.
    pub fn from_json(content: &str) -> Result<Self> {
        let table: SelectorTable =
            serde_json::from_str(content).map_err(|e| Error::Selectors(e.to_string()))?;
        if let Some(&level) = table
            .dpi_levels
            .keys()
            .find(|&&l| l == 0 || usize::from(l) > DPI_LEVELS)
        {
            return Err(Error::Selectors(format!(
                "DPI level {level} outside 1..={DPI_LEVELS}"
            )));
        }
        Ok(table)
    }

    /// Load a table file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Selectors(format!("read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }
}

/// Default table location: `<config_dir>/cosmic-mouse/selectors.json`.
pub fn default_selectors_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cosmic-mouse")
        .join("selectors.json")
}
