//! Colors for diagram styling.
//!
//! [`Color`] wraps the `DynamicColor` type from the color crate. Besides CSS
//! parsing it offers [`Color::from_hue`] and [`hue_from_types`], which derive
//! a stable pastel color from a set of type IRIs so that every element of the
//! same class is painted the same way across sessions.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{AlphaColor, DynamicColor, Lch, Srgb};

/// Default seed for [`hue_from_types`], the 32-bit FNV offset basis.
pub const DEFAULT_HUE_SEED: u32 = 0x811c_9dc5;
const HUE_HASH_MASK: u32 = 0x7fff_ffff;

/// Lightness and chroma used for colors derived from a hue.
const DERIVED_LIGHTNESS: f32 = 75.0;
const DERIVED_CHROMA: f32 = 40.0;

/// CSS color value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Parses a CSS color string such as `"#ff0000"`, `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoscope_core::color::Color;
    ///
    /// assert!(Color::new("#336699").is_ok());
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        DynamicColor::from_str(color_str)
            .map(|color| Self { color })
            .map_err(|err| format!("invalid color `{color_str}`: {err}"))
    }

    /// Creates an opaque color with fixed lightness and chroma in CIE LCh
    /// space and the given hue in degrees.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoscope_core::color::Color;
    ///
    /// let a = Color::from_hue(120.0);
    /// let b = Color::from_hue(120.0);
    /// assert_eq!(a, b);
    /// assert_eq!(a.alpha(), 1.0);
    /// ```
    pub fn from_hue(hue: f32) -> Self {
        let lch = AlphaColor::<Lch>::new([DERIVED_LIGHTNESS, DERIVED_CHROMA, hue, 1.0]);
        let rgba = lch.convert::<Srgb>().to_rgba8();
        let color = DynamicColor::from_alpha_color(AlphaColor::<Srgb>::from_rgba8(
            rgba.r, rgba.g, rgba.b, 255,
        ));
        Self { color }
    }

    /// Hex representation (`#rrggbb`) ignoring alpha.
    pub fn to_hex(self) -> String {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    }

    /// Returns a string usable as an SVG ID fragment.
    pub fn to_id_safe_string(self) -> String {
        let mut sanitized = self
            .to_string()
            .replace('#', "hex")
            .replace(['(', ')', ',', ' ', ';', '%', '.'], "_");

        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized = format!("c_{sanitized}");
        }

        sanitized
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self {
            color: DynamicColor::from_alpha_color(AlphaColor::<Srgb>::from_rgba8(0, 0, 0, 255)),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_hex())
    }
}

/// Derives a hue in degrees `[0, 360]` from a list of type IRIs.
///
/// The IRIs are hashed in order with a 32-bit FNV-1a variant starting from
/// `seed`, so the result only depends on the seed, the strings and their order.
///
/// # Examples
///
/// ```
/// use ontoscope_core::color::{hue_from_types, DEFAULT_HUE_SEED};
///
/// let hue = hue_from_types(&["http://xmlns.com/foaf/0.1/Person"], DEFAULT_HUE_SEED);
/// assert!((0.0..=360.0).contains(&hue));
/// assert_eq!(hue, hue_from_types(&["http://xmlns.com/foaf/0.1/Person"], DEFAULT_HUE_SEED));
/// ```
pub fn hue_from_types<S: AsRef<str>>(types: &[S], seed: u32) -> f32 {
    let mut hash = seed & HUE_HASH_MASK;
    for iri in types {
        hash = fnv1a_update(hash, iri.as_ref());
    }
    360.0 * ((hash & HUE_HASH_MASK) as f64 / HUE_HASH_MASK as f64) as f32
}

fn fnv1a_update(mut hash: u32, text: &str) -> u32 {
    for unit in text.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash
            .wrapping_add(hash << 1)
            .wrapping_add(hash << 4)
            .wrapping_add(hash << 7)
            .wrapping_add(hash << 8)
            .wrapping_add(hash << 24);
    }
    hash
}
