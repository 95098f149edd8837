//! Paint colour parsing, conversion and normalization.
//!
//! Paint colours show up as CSS strings (`#rgb`, `rgb()`, `hsl()`, named) or
//! as data expressions whose branches hold such strings. Legends need one
//! representative literal, highlighting needs the HSL channels.

use palette::encoding::Srgb;
use palette::{Hsla, IntoColor, Srgba};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A normalized colour value handed to legend presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwatchColor {
    /// A CSS colour string (hex after HSL conversion, otherwise as authored).
    Literal(String),
    /// A sampled expression branch that is not itself a literal.
    Unresolved(Value),
}

impl From<&str> for SwatchColor {
    fn from(s: &str) -> Self {
        SwatchColor::Literal(s.to_string())
    }
}

/// Reduces a paint colour to a single comparable literal.
///
/// Expressions are sampled, never evaluated: the last element stands in for
/// the whole expression. HSL literals become hex; other literals pass
/// through unchanged.
pub fn normalize(value: Option<&Value>) -> Option<SwatchColor> {
    let sampled = match value? {
        Value::Null => return None,
        Value::Array(items) => items.last()?,
        other => other,
    };

    match sampled {
        Value::Null => None,
        Value::String(s) if is_hsl(s) => match parse_rgba(s) {
            Some(rgba) => Some(SwatchColor::Literal(to_hex(&rgba))),
            None => Some(SwatchColor::Literal(s.clone())),
        },
        Value::String(s) => Some(SwatchColor::Literal(s.clone())),
        other => Some(SwatchColor::Unresolved(other.clone())),
    }
}

fn is_hsl(s: &str) -> bool {
    s.trim_start().to_ascii_lowercase().starts_with("hsl")
}

/// Parses any CSS colour: hex, `rgb()`, `hsl()` (comma or space syntax) and
/// named colours.
pub fn parse_rgba(s: &str) -> Option<Srgba<f64>> {
    let c = csscolorparser::parse(s.trim()).ok()?;
    Some(Srgba::new(c.r, c.g, c.b, c.a))
}

/// `#rrggbb`, alpha dropped.
pub fn to_hex(rgba: &Srgba<f64>) -> String {
    let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        c(rgba.color.red),
        c(rgba.color.green),
        c(rgba.color.blue)
    )
}

/// A paint colour in HSL form, the shape highlight recolouring works in.
#[derive(Debug, Clone, Copy)]
pub struct HslColor(pub Hsla<Srgb, f64>);

impl HslColor {
    /// Hue in degrees; saturation, lightness and alpha are clamped to `0.0..=1.0`.
    pub fn new(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        Self(Hsla::new(
            hue,
            saturation.clamp(0.0, 1.0),
            lightness.clamp(0.0, 1.0),
            alpha.clamp(0.0, 1.0),
        ))
    }

    pub fn parse(s: &str) -> Option<Self> {
        parse_rgba(s).map(Self::from_rgba)
    }

    pub fn from_rgba(rgba: Srgba<f64>) -> Self {
        Self(rgba.into_color())
    }

    pub fn to_rgba(&self) -> Srgba<f64> {
        self.0.into_color()
    }

    pub fn hue(&self) -> f64 {
        self.0.color.hue.into_positive_degrees()
    }

    pub fn saturation(&self) -> f64 {
        self.0.color.saturation
    }

    pub fn lightness(&self) -> f64 {
        self.0.color.lightness
    }

    pub fn alpha(&self) -> f64 {
        self.0.alpha
    }

    /// Lowers saturation and lightness by `step` and makes the colour opaque.
    pub fn emphasized(&self, step: f64) -> Self {
        Self::new(
            self.hue(),
            self.saturation() - step,
            self.lightness() - step,
            1.0,
        )
    }

    pub fn with_alpha(&self, alpha: f64) -> Self {
        Self::new(self.hue(), self.saturation(), self.lightness(), alpha)
    }
}

impl fmt::Display for HslColor {
    /// `hsl(h, s%, l%)` when opaque, `hsla(h, s%, l%, a)` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut h = fmt_number(self.hue());
        if h == "360" {
            h = "0".to_string();
        }
        let s = fmt_number(self.saturation() * 100.0);
        let l = fmt_number(self.lightness() * 100.0);
        if self.alpha() >= 1.0 {
            write!(f, "hsl({}, {}%, {}%)", h, s, l)
        } else {
            write!(f, "hsla({}, {}%, {}%, {})", h, s, l, fmt_number(self.alpha()))
        }
    }
}

/// Returns true for strings the highlight recolouring understands.
///
/// Named colours are excluded.
pub fn is_recolorable(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    (lower.starts_with('#') || lower.starts_with("rgb") || lower.starts_with("hsl"))
        && parse_rgba(&lower).is_some()
}

/// Up to two decimals, trailing zeros trimmed.
fn fmt_number(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
