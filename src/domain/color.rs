// SPDX-License-Identifier: MPL-2.0
//! Color value objects.
//!
//! Every color field of a design is either an explicit [`Rgba`] or the
//! literal `automatic`, which asks the style resolver to derive the color
//! from the paired background. Parsing happens here, at the boundary, so a
//! malformed string can never reach a draft.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The literal accepted in place of a color to request contrast-derived color.
pub const AUTOMATIC: &str = "automatic";

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Perceived brightness on the 0–255 scale (ITU-R BT.601 weights).
    ///
    /// Alpha is ignored: a translucent background is judged by its color.
    #[must_use]
    pub fn luma(self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// Returns whether the color is fully opaque.
    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.a == 0xff
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)` or `rgba(..)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `field` when the text is not a color.
    pub fn parse(field: &str, text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || Error::validation(field, format!("'{text}' is not a hex or rgba color"));

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let lower = text.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();

        match (parts.as_slice(), has_alpha) {
            ([r, g, b], false) => Ok(Self::rgb(
                channel(r).ok_or_else(invalid)?,
                channel(g).ok_or_else(invalid)?,
                channel(b).ok_or_else(invalid)?,
            )),
            ([r, g, b, a], true) => Ok(Self {
                r: channel(r).ok_or_else(invalid)?,
                g: channel(g).ok_or_else(invalid)?,
                b: channel(b).ok_or_else(invalid)?,
                a: alpha(a).ok_or_else(invalid)?,
            }),
            _ => Err(invalid()),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);

    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

fn channel(text: &str) -> Option<u8> {
    text.parse::<u8>().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn alpha(text: &str) -> Option<u8> {
    let value: f64 = text.parse().ok()?;
    if !(0.0..=1.0).contains(&value) {
        return None;
    }
    // The range check above keeps the product within 0..=255.
    Some((value * 255.0).round() as u8)
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("color", s)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgba::parse("color", &raw).map_err(serde::de::Error::custom)
    }
}

/// A color field that is either derived automatically or chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorValue {
    #[default]
    Automatic,
    Explicit(Rgba),
}

impl ColorValue {
    /// Parses a color or the literal `automatic`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `field` for anything else.
    pub fn parse(field: &str, text: &str) -> Result<Self> {
        if text.trim().eq_ignore_ascii_case(AUTOMATIC) {
            Ok(Self::Automatic)
        } else {
            Rgba::parse(field, text).map(Self::Explicit)
        }
    }

    /// Returns the explicit color, if any.
    #[must_use]
    pub fn explicit(self) -> Option<Rgba> {
        match self {
            Self::Automatic => None,
            Self::Explicit(color) => Some(color),
        }
    }

    #[must_use]
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Automatic)
    }
}

impl From<Rgba> for ColorValue {
    fn from(color: Rgba) -> Self {
        Self::Explicit(color)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => f.write_str(AUTOMATIC),
            Self::Explicit(color) => color.fmt(f),
        }
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ColorValue::parse("color", &raw).map_err(serde::de::Error::custom)
    }
}

/// A CSS gradient expression used as a button fill.
///
/// Only `linear-gradient(..)` and `radial-gradient(..)` with balanced
/// parentheses are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gradient(String);

impl Gradient {
    /// Validates and wraps a gradient expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `field` for malformed expressions.
    pub fn parse(field: &str, text: &str) -> Result<Self> {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();
        if !(lower.starts_with("linear-gradient(") || lower.starts_with("radial-gradient(")) {
            return Err(Error::validation(
                field,
                "expected linear-gradient(..) or radial-gradient(..)",
            ));
        }

        let mut depth = 0_i32;
        for (index, c) in text.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 && index + 1 != text.len() {
                        return Err(Error::validation(field, "trailing text after gradient"));
                    }
                }
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            return Err(Error::validation(field, "unbalanced parentheses"));
        }

        Ok(Self(text.to_string()))
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first color stop, used as the contrast reference for button text.
    #[must_use]
    pub fn first_stop(&self) -> Option<Rgba> {
        let open = self.0.find('(')?;
        let inner = &self.0[open + 1..self.0.len().saturating_sub(1)];
        split_top_level(inner).into_iter().find_map(|arg| {
            let token = arg.split_whitespace().next().unwrap_or_default();
            if token.starts_with('#') {
                return Rgba::parse("gradient", token).ok();
            }
            let lower = arg.to_ascii_lowercase();
            if lower.starts_with("rgb") {
                let end = arg.find(')')?;
                return Rgba::parse("gradient", &arg[..=end]).ok();
            }
            None
        })
    }
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Gradient {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Gradient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Gradient::parse("gradient", &raw).map_err(serde::de::Error::custom)
    }
}
