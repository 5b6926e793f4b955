use std::collections::HashMap;

use crossterm::style::Color;

pub const SLOT_BAR: &str = "5383ec";
pub const SUCCEEDED: &str = "58a65c";
pub const IN_FLIGHT: &str = "f1bf42";
pub const REMAINDER: &str = "d85140";
pub const FOREGROUND: &str = "fff";

/// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb` into an RGB triple.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        6 => Some((
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let short = |i: usize| channel(&digits[i..=i]).map(|v| v * 0x11);
            Some((short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

/// Memoized hex parsing, owned by whoever draws.
#[derive(Debug, Default)]
pub struct ColorCache {
    parsed: HashMap<String, Option<Color>>,
}

impl ColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal color for `hex`, or `Color::Reset` when it does not parse.
    pub fn get(&mut self, hex: &str) -> Color {
        if let Some(color) = self.parsed.get(hex) {
            return color.unwrap_or(Color::Reset);
        }
        let color = hex_to_rgb(hex).map(|(r, g, b)| Color::Rgb { r, g, b });
        self.parsed.insert(hex.to_string(), color);
        color.unwrap_or(Color::Reset)
    }

    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}
