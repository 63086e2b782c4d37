// Fill colour parsing and the contrast outline policy

use image::Rgb;

/// Channel sum above which a fill counts as light
const LIGHT_CHANNEL_SUM: u32 = 500;

/// Unit offsets for the eight compass directions, drawn before the fill pass
pub const OUTLINE_DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Parse `#RRGGBB`, `#RGB`, `white` or `black`
pub fn try_parse_color(value: &str) -> Option<Rgb<u8>> {
    let value = value.trim();
    match value.to_lowercase().as_str() {
        "white" => return Some(Rgb([255, 255, 255])),
        "black" => return Some(Rgb([0, 0, 0])),
        _ => {}
    }

    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        3 => {
            let mut channels = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let nibble = c.to_digit(16)? as u8;
                channels[i] = nibble * 16 + nibble;
            }
            Some(Rgb(channels))
        }
        _ => None,
    }
}

/// Like `try_parse_color`, falling back to black
pub fn parse_color(value: &str) -> Rgb<u8> {
    try_parse_color(value).unwrap_or(Rgb([0, 0, 0]))
}

pub fn is_light(color: Rgb<u8>) -> bool {
    let Rgb([r, g, b]) = color;
    color == Rgb([255, 255, 255]) || r as u32 + g as u32 + b as u32 > LIGHT_CHANNEL_SUM
}

/// Outline colour and per-direction pixel offset for a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outline {
    pub color: Rgb<u8>,
    pub offset: i32,
}

/// Pick an outline opposite to the fill's luminance bucket
pub fn outline_for(fill: Rgb<u8>, font_px: u32) -> Outline {
    let px = font_px as i32;
    if is_light(fill) {
        Outline {
            color: Rgb([0, 0, 0]),
            offset: (px / 10).max(3),
        }
    } else {
        Outline {
            color: Rgb([255, 255, 255]),
            offset: (px / 15).max(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_color("#1A1A1A"), Rgb([26, 26, 26]));
        assert_eq!(parse_color("#fff"), Rgb([255, 255, 255]));
        assert_eq!(parse_color("  #00ff7f "), Rgb([0, 255, 127]));
        assert_eq!(parse_color("WHITE"), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_unparseable_is_black() {
        for value in ["", "red", "#12345", "#GGGGGG", "123456", "#ffff"] {
            assert_eq!(try_parse_color(value), None, "{value}");
            assert_eq!(parse_color(value), Rgb([0, 0, 0]));
        }
    }

    #[test]
    fn test_outline_contrast() {
        let white = outline_for(parse_color("#FFFFFF"), 48);
        assert_eq!(white.color, Rgb([0, 0, 0]));
        assert_eq!(white.offset, 4);

        let black = outline_for(parse_color("#000000"), 48);
        assert_eq!(black.color, Rgb([255, 255, 255]));
        assert_eq!(black.offset, 3);
    }

    #[test]
    fn test_outline_threshold_and_minimum_offsets() {
        // 170 * 3 = 510 is light, 166 * 3 = 498 is dark
        assert_eq!(outline_for(Rgb([170, 170, 170]), 20).color, Rgb([0, 0, 0]));
        assert_eq!(outline_for(Rgb([166, 166, 166]), 20).color, Rgb([255, 255, 255]));

        assert_eq!(outline_for(Rgb([255, 255, 255]), 20).offset, 3);
        assert_eq!(outline_for(Rgb([0, 0, 0]), 20).offset, 2);
    }
}
