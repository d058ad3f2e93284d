//! Payload encoder: profile fields to fixed 32-byte device buffers.
//!
//! Layouts:
//! - color table: RGB triples packed at offsets 0, 3, 6, ..., rest zero
//! - DPI table: bytes 0..6 = DPI / 100, bytes 6..8 = `63 68`, rest zero

use crate::error::{Error, Result};
use crate::profile::{Profile, Rgb, DPI_LEVELS, LED_COUNT};
use crate::wire::PACKET_LEN;

/// Trailer the firmware expects after the six DPI bytes.
pub const DPI_SENTINEL: [u8; 2] = [0x63, 0x68];

/// A 32-byte interrupt payload.
pub type Packet = [u8; PACKET_LEN];

/// The three profile-dependent buffers of one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payloads {
    pub led_colors: Packet,
    pub dpi_colors: Packet,
    pub dpi_values: Packet,
}

fn expect_len(field: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::Encoding {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn pack_colors(colors: &[Rgb]) -> Packet {
    let mut buf = [0u8; PACKET_LEN];
    for (slot, color) in buf.chunks_exact_mut(3).zip(colors) {
        slot.copy_from_slice(&color.to_bytes());
    }
    buf
}

/// Encode the 8 LED zone colors.
pub fn encode_led_colors(colors: &[Rgb]) -> Result<Packet> {
    expect_len("led_colors", colors.len(), LED_COUNT)?;
    Ok(pack_colors(colors))
}

/// Encode the 6 DPI indicator colors.
pub fn encode_dpi_colors(colors: &[Rgb]) -> Result<Packet> {
    expect_len("dpi_colors", colors.len(), DPI_LEVELS)?;
    Ok(pack_colors(colors))
}

/// Encode the 6 DPI values in device units (DPI / 100).
///
/// One byte per level caps the range at 25,500 DPI; 25,600 would encode as 256.
pub fn encode_dpi_values(values: &[u16]) -> Result<Packet> {
    expect_len("dpi_values", values.len(), DPI_LEVELS)?;
    let mut buf = [0u8; PACKET_LEN];
    for (slot, &dpi) in buf.iter_mut().zip(values) {
        let units = dpi / 100;
        *slot = u8::try_from(units).map_err(|_| Error::Encoding {
            field: "dpi_values",
            expected: usize::from(u8::MAX),
            actual: usize::from(units),
        })?;
    }
    buf[DPI_LEVELS..DPI_LEVELS + DPI_SENTINEL.len()].copy_from_slice(&DPI_SENTINEL);
    Ok(buf)
}

/// Encode all profile-dependent buffers.
pub fn encode_profile(profile: &Profile) -> Result<Payloads> {
    Ok(Payloads {
        led_colors: encode_led_colors(&profile.led_colors)?,
        dpi_colors: encode_dpi_colors(&profile.dpi_colors)?,
        dpi_values: encode_dpi_values(&profile.dpi_values)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_color_table() {
        let p = Profile::default();
        let buf = encode_led_colors(&p.led_colors).unwrap();
        for i in 0..LED_COUNT {
            assert_eq!(&buf[i * 3..i * 3 + 3], &[0xFF, 0x00, 0x00]);
        }
        assert_eq!(&buf[24..], &[0u8; 8]);
    }

    #[test]
    fn default_profile_dpi_table() {
        let p = Profile::default();
        let buf = encode_dpi_values(&p.dpi_values).unwrap();
        assert_eq!(&buf[..6], &[0x0A, 0x10, 0x18, 0x30, 0x60, 0x7E]);
        assert_eq!(&buf[6..8], &[0x63, 0x68]);
        assert_eq!(&buf[8..], &[0u8; 24]);
    }

    #[test]
    fn color_table_recovers_each_triple() {
        let colors: Vec<Rgb> = (0..8u8)
            .map(|i| Rgb::new(i * 31, 255 - i * 17, i.wrapping_mul(97)))
            .collect();
        let buf = encode_led_colors(&colors).unwrap();
        for (i, c) in colors.iter().enumerate() {
            let got = Rgb::new(buf[3 * i], buf[3 * i + 1], buf[3 * i + 2]);
            assert_eq!(got, *c);
        }
    }

    #[test]
    fn dpi_colors_use_first_eighteen_bytes() {
        let p = Profile::default();
        let buf = encode_dpi_colors(&p.dpi_colors).unwrap();
        assert_eq!(&buf[..6], &[0xFF, 0x00, 0x00, 0xFF, 0x80, 0x00]);
        assert_eq!(&buf[15..18], &[0x00, 0x00, 0xFF]);
        assert_eq!(&buf[18..], &[0u8; 14]);
    }

    #[test]
    fn dpi_units_are_exact_across_range() {
        for dpi in (100..=25500u16).step_by(100) {
            let buf = encode_dpi_values(&[dpi; 6]).unwrap();
            assert_eq!(u16::from(buf[0]), dpi / 100);
            assert_eq!(&buf[6..8], &DPI_SENTINEL);
        }
    }

    #[test]
    fn dpi_beyond_one_byte_is_an_encoding_error() {
        let result = encode_dpi_values(&[25600, 100, 100, 100, 100, 100]);
        assert!(matches!(result, Err(Error::Encoding { .. })));
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        let c = Rgb::new(1, 2, 3);
        assert!(matches!(
            encode_led_colors(&[c; 7]),
            Err(Error::Encoding {
                expected: 8,
                actual: 7,
                ..
            })
        ));
        assert!(matches!(
            encode_led_colors(&[c; 9]),
            Err(Error::Encoding { actual: 9, .. })
        ));
        assert!(matches!(
            encode_dpi_values(&[100; 5]),
            Err(Error::Encoding { actual: 5, .. })
        ));
        assert!(matches!(
            encode_dpi_values(&[100; 7]),
            Err(Error::Encoding { actual: 7, .. })
        ));
        assert!(encode_dpi_colors(&[c; 5]).is_err());
    }

    #[test]
    fn encoding_is_deterministic() {
        let p = Profile::default();
        assert_eq!(encode_profile(&p).unwrap(), encode_profile(&p).unwrap());
    }
}
