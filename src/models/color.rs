use image::Rgba;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("Invalid hex color regex")
});

/// Fully transparent pixel used for the background when transparency is requested.
pub const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` into an RGBA pixel.
///
/// Short forms expand each nibble (`#0f8` is `#00ff88`). A missing alpha component is opaque.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, ColorError> {
    let caps = HEX_COLOR
        .captures(value.trim())
        .ok_or_else(|| ColorError::InvalidHex(value.to_string()))?;
    let digits = &caps[1];

    let expanded: String = if digits.len() <= 4 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16)
            .map_err(|_| ColorError::InvalidHex(value.to_string()))
    };

    let alpha = if expanded.len() == 8 { channel(3)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(1)?, channel(2)?, alpha]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_form() {
        assert_eq!(parse_hex_color("#000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#1a2B3c").unwrap(), Rgba([0x1a, 0x2b, 0x3c, 255]));
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(parse_hex_color("#0f8").unwrap(), Rgba([0x00, 0xff, 0x88, 255]));
        assert_eq!(parse_hex_color("#0f80").unwrap(), Rgba([0x00, 0xff, 0x88, 0]));
    }

    #[test]
    fn test_parse_with_alpha() {
        assert_eq!(parse_hex_color("#00000000").unwrap(), Rgba([0, 0, 0, 0]));
        assert_eq!(parse_hex_color("#ff000080").unwrap(), Rgba([255, 0, 0, 0x80]));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "000000", "#12", "#12345", "#GGGGGG", "red", "#1234567"] {
            assert_eq!(
                parse_hex_color(bad),
                Err(ColorError::InvalidHex(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }
}
