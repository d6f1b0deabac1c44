//! Colour arguments.
//!
//! Colour variables are stored as packed HSL integers: hue, saturation and
//! lightness in the low three bytes and an optional alpha in the top byte.
//! Users may also type `$RGB`, `$RRGGBB` or a colour name.

use bevy::color::{Hsla, Srgba};

/// Lowest lightness of "light" colours (e.g. player skins).
pub const DARKEST_LIGHTNESS: f32 = 0.5;

/// Unpack a packed HSL(A) colour.
pub fn unpack_hsla(packed: u32, alpha: bool) -> Hsla {
    let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
    Hsla::new(
        channel(16) * 360.0,
        channel(8),
        channel(0),
        if alpha { channel(24) } else { 1.0 },
    )
}

/// Pack a colour, rescaling lightness so `darkest` maps to zero.
pub fn pack_hsla(color: Hsla, darkest: f32, alpha: bool) -> u32 {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;

    let lightness = if darkest > 0.0 {
        (color.lightness - darkest) / (1.0 - darkest)
    } else {
        color.lightness
    };
    let hue = (color.hue / 360.0).rem_euclid(1.0);

    let mut packed = (byte(hue) << 16) | (byte(color.saturation) << 8) | byte(lightness);
    if alpha {
        packed |= byte(color.alpha) << 24;
    }
    packed
}

/// Map stored lightness back into the light range.
pub fn unclamp_lighting(color: Hsla) -> Hsla {
    Hsla {
        lightness: DARKEST_LIGHTNESS + color.lightness * (1.0 - DARKEST_LIGHTNESS),
        ..color
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Interpret a console token as a colour.
///
/// Unknown input yields black, matching how missing arguments read.
pub fn parse_color(token: &str, light: bool) -> Hsla {
    let black = Hsla::new(0.0, 0.0, 0.0, 1.0);

    let unsigned = token.strip_prefix(['-', '+']).unwrap_or(token);
    if is_all_digits(unsigned) {
        let packed = token
            .parse::<i64>()
            .map(|v| v as u32)
            .unwrap_or(u32::MAX);
        let color = unpack_hsla(packed, true);
        return if light { unclamp_lighting(color) } else { color };
    }

    if let Some(hex) = token.strip_prefix('$') {
        if hex.len() != 3 && hex.len() != 6 {
            return black;
        }
        return Srgba::hex(hex).map(Hsla::from).unwrap_or(black);
    }

    let hue_sixth = |n: f32| Hsla::new(n * 60.0, 1.0, 0.5, 1.0);
    match token.to_ascii_lowercase().as_str() {
        "red" => hue_sixth(0.0),
        "yellow" => hue_sixth(1.0),
        "green" => hue_sixth(2.0),
        "cyan" => hue_sixth(3.0),
        "blue" => hue_sixth(4.0),
        "magenta" => hue_sixth(5.0),
        "white" => Hsla::new(0.0, 0.0, 1.0, 1.0),
        "gray" => Hsla::new(0.0, 0.0, 0.5, 1.0),
        _ => black,
    }
}
