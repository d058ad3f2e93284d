//! Named color presets for the LED zones and DPI indicators.

use crate::profile::{Rgb, DPI_LEVELS, LED_COUNT};

const RED: Rgb = Rgb::new(255, 0, 0);
const ORANGE: Rgb = Rgb::new(255, 128, 0);
const YELLOW: Rgb = Rgb::new(255, 255, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const CYAN: Rgb = Rgb::new(0, 255, 255);
const BLUE: Rgb = Rgb::new(0, 0, 255);
const PURPLE: Rgb = Rgb::new(128, 0, 255);
const MAGENTA: Rgb = Rgb::new(255, 0, 255);
const WHITE: Rgb = Rgb::new(255, 255, 255);
const OFF: Rgb = Rgb::new(0, 0, 0);

/// LED zone presets (8 colors each).
pub const LED_PRESETS: &[(&str, [Rgb; LED_COUNT])] = &[
    ("red", [RED; LED_COUNT]),
    ("green", [GREEN; LED_COUNT]),
    ("blue", [BLUE; LED_COUNT]),
    ("white", [WHITE; LED_COUNT]),
    ("off", [OFF; LED_COUNT]),
    (
        "rainbow",
        [RED, ORANGE, YELLOW, GREEN, CYAN, BLUE, PURPLE, MAGENTA],
    ),
    ("fire", [RED, ORANGE, YELLOW, ORANGE, RED, ORANGE, YELLOW, ORANGE]),
    ("ocean", [BLUE, CYAN, BLUE, CYAN, BLUE, CYAN, BLUE, CYAN]),
];

/// DPI indicator presets (6 colors each).
pub const DPI_PRESETS: &[(&str, [Rgb; DPI_LEVELS])] = &[
    ("rainbow", [RED, ORANGE, YELLOW, GREEN, CYAN, BLUE]),
    ("red", [RED; DPI_LEVELS]),
    ("white", [WHITE; DPI_LEVELS]),
    ("heat", [BLUE, CYAN, GREEN, YELLOW, ORANGE, RED]),
];

/// Look up an LED preset by name (case-insensitive).
pub fn led_preset(name: &str) -> Option<&'static [Rgb; LED_COUNT]> {
    LED_PRESETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, colors)| colors)
}

/// Look up a DPI indicator preset by name (case-insensitive).
pub fn dpi_preset(name: &str) -> Option<&'static [Rgb; DPI_LEVELS]> {
    DPI_PRESETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, colors)| colors)
}
