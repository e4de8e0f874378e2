//! Color parsing and conversion helpers.
//!
//! Accepts the color notations the editor stores on elements: `#rgb`,
//! `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and
//! `transparent`.

use serde::{Deserialize, Serialize};

/// An sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha in `0.0..=1.0`.
    pub a: f32,
}

/// A color in hue/saturation/value space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    /// Hue in degrees, `0.0..360.0`.
    pub h: f32,
    /// Saturation, `0.0..=1.0`.
    pub s: f32,
    /// Value, `0.0..=1.0`.
    pub v: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    /// Create a color from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// `#rrggbb` notation, alpha dropped.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgba(...)` notation.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    /// Whether the color paints nothing.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Convert to HSV (alpha dropped).
    #[must_use]
    pub fn to_hsv(&self) -> Hsv {
        let r = f32::from(self.r) / 255.0;
        let g = f32::from(self.g) / 255.0;
        let b = f32::from(self.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if (max - r).abs() < f32::EPSILON {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if (max - g).abs() < f32::EPSILON {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let s = if max == 0.0 { 0.0 } else { delta / max };

        Hsv { h, s, v: max }
    }
}

impl Hsv {
    /// Convert back to an opaque RGB color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba(&self) -> Rgba {
        let h = self.h.rem_euclid(360.0);
        let s = clamp(self.s, 0.0, 1.0);
        let v = clamp(self.v, 0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |value: f32| ((value + m) * 255.0).round() as u8;
        Rgba::rgb(channel(r), channel(g), channel(b))
    }
}

/// Clamp `value` into `min..=max`. NaN collapses to `min`.
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// Parse a CSS-like color string.
#[must_use]
pub fn parse_color(input: &str) -> Option<Rgba> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("transparent") {
        return Some(Rgba::TRANSPARENT);
    }
    if let Some(hex) = input.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = input.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    parse_rgb_args(args)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);

    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Rgba::new(
            pair(0)?,
            pair(2)?,
            pair(4)?,
            f32::from(pair(6)?) / 255.0,
        )),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let value: f32 = s.parse().ok()?;
        Some(clamp(value, 0.0, 255.0).round() as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => clamp(a.parse().ok()?, 0.0, 1.0),
        None => 1.0,
    };
    Some(Rgba::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

/// Pick black or white text for legibility on top of `background`.
#[must_use]
pub fn readable_text_on(background: &str) -> &'static str {
    match parse_color(background) {
        Some(color) => {
            let hsv = color.to_hsv();
            // Bright, weakly saturated backgrounds (whites, pastels, yellows) take dark text.
            if hsv.v > 0.7 && (hsv.s < 0.5 || (40.0..=200.0).contains(&hsv.h)) {
                "#000000"
            } else {
                "#ffffff"
            }
        }
        None => "#ffffff",
    }
}
