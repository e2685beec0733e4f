#![forbid(unsafe_code)]

//! Packed RGBA color and CSS color parsing.
//!
//! Colors are stored as straight (non-premultiplied) alpha in a single `u32`:
//! `0xRRGGBBAA`. Blending helpers operate in the `[0, 255]` integer domain and
//! round once at the end.

use std::fmt;

use crate::error::ConfigError;

/// A color packed as `0xRRGGBBAA`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Same color with alpha forced to 255.
    #[inline]
    pub const fn opaque(self) -> Self {
        Self::rgb(self.r(), self.g(), self.b())
    }

    #[inline]
    const fn div_round_u8(numer: u64, denom: u64) -> u8 {
        debug_assert!(denom != 0);
        let v = (numer + (denom / 2)) / denom;
        if v > 255 { 255 } else { v as u8 }
    }

    /// Porter-Duff SourceOver: `src over dst`.
    #[inline]
    pub fn over(self, dst: Self) -> Self {
        let s_a = self.a() as u64;
        if s_a == 255 {
            return self;
        }
        if s_a == 0 {
            return dst;
        }

        let d_a = dst.a() as u64;
        let inv_s_a = 255 - s_a;

        // numer_a = 255*s_a + d_a*(255 - s_a), i.e. out_a scaled by 255.
        let numer_a = 255 * s_a + d_a * inv_s_a;
        if numer_a == 0 {
            return Self::TRANSPARENT;
        }
        let out_a = Self::div_round_u8(numer_a, 255);

        let channel = |s: u8, d: u8| {
            Self::div_round_u8(
                (s as u64) * s_a * 255 + (d as u64) * d_a * inv_s_a,
                numer_a,
            )
        };
        Self::rgba(
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
            out_a,
        )
    }

    /// Difference blend of `self` onto an opaque `dst`, weighted by `self`'s alpha.
    ///
    /// Matches the canvas `difference` composite operation for an opaque
    /// destination: `|dst - src|` per channel, lerped by source alpha.
    #[inline]
    pub fn difference(self, dst: Self) -> Self {
        let ta = self.a() as f32 / 255.0;
        let mix = |s: u8, d: u8| {
            let diff = (d as i16 - s as i16).unsigned_abs() as f32;
            (d as f32 * (1.0 - ta) + diff * ta).round().clamp(0.0, 255.0) as u8
        };
        Self::rgba(
            mix(self.r(), dst.r()),
            mix(self.g(), dst.g()),
            mix(self.b(), dst.b()),
            dst.a(),
        )
    }

    /// Apply uniform opacity in `[0.0, 1.0]` by scaling alpha.
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        let a = ((self.a() as f32) * opacity).round().clamp(0.0, 255.0) as u8;
        Self::rgba(self.r(), self.g(), self.b(), a)
    }

    /// CSS `rgba(r, g, b, opacity)` string, as fed to a canvas 2D context.
    pub fn css_rgba(self, opacity: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r(), self.g(), self.b(), opacity)
    }

    /// CSS `#rrggbb` string (alpha dropped).
    pub fn css_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }

    /// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or
    /// `rgba(r, g, b, a)` where `a` is in `[0, 1]`.
    pub fn parse_css(input: &str) -> Result<Self, ConfigError> {
        let s = input.trim();
        let invalid = || ConfigError::InvalidColor(input.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                3 => {
                    let (r, g, b) = (nibble(0), nibble(1), nibble(2));
                    match (r, g, b) {
                        (Some(r), Some(g), Some(b)) => Ok(Self::rgb(r * 17, g * 17, b * 17)),
                        _ => Err(invalid()),
                    }
                }
                6 | 8 => {
                    let r = byte(0).ok_or_else(invalid)?;
                    let g = byte(2).ok_or_else(invalid)?;
                    let b = byte(4).ok_or_else(invalid)?;
                    let a = if hex.len() == 8 {
                        byte(6).ok_or_else(invalid)?
                    } else {
                        255
                    };
                    Ok(Self::rgba(r, g, b, a))
                }
                _ => Err(invalid()),
            };
        }

        let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid());
        }

        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            let alpha: f32 = parts[3].parse().map_err(|_| invalid())?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(invalid());
            }
            (alpha * 255.0).round() as u8
        } else {
            255
        };
        Ok(Self::rgba(r, g, b, a))
    }
}

impl fmt::Debug for PackedRgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PackedRgba({}, {}, {}, {})",
            self.r(),
            self.g(),
            self.b(),
            self.a()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_roundtrip_through_packing() {
        let c = PackedRgba::rgba(1, 2, 3, 4);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (1, 2, 3, 4));
    }

    #[test]
    fn over_with_opaque_source_is_source() {
        let src = PackedRgba::rgb(200, 10, 10);
        assert_eq!(src.over(PackedRgba::WHITE), src);
    }

    #[test]
    fn over_with_transparent_source_is_destination() {
        let dst = PackedRgba::rgb(5, 6, 7);
        assert_eq!(PackedRgba::TRANSPARENT.over(dst), dst);
    }

    #[test]
    fn over_half_alpha_on_opaque_mixes() {
        let src = PackedRgba::rgba(0, 0, 0, 128);
        let out = src.over(PackedRgba::WHITE);
        assert_eq!(out.a(), 255);
        assert!(out.r() > 120 && out.r() < 135, "got {out:?}");
    }

    #[test]
    fn difference_with_white_inverts() {
        let out = PackedRgba::WHITE.difference(PackedRgba::rgb(255, 0, 55));
        assert_eq!(out, PackedRgba::rgb(0, 255, 200));
    }

    #[test]
    fn with_opacity_scales_alpha() {
        assert_eq!(PackedRgba::WHITE.with_opacity(0.0).a(), 0);
        assert_eq!(PackedRgba::WHITE.with_opacity(2.0).a(), 255);
    }

    #[test]
    fn css_rgba_formats_opacity() {
        let s = PackedRgba::rgb(180, 200, 254).css_rgba(0.5);
        assert_eq!(s, "rgba(180, 200, 254, 0.5)");
    }

    #[test]
    fn parse_css_forms() {
        assert_eq!(
            PackedRgba::parse_css("rgb(0, 0, 0)").unwrap(),
            PackedRgba::BLACK
        );
        assert_eq!(PackedRgba::parse_css("#fff").unwrap(), PackedRgba::WHITE);
        assert_eq!(
            PackedRgba::parse_css("#0a0b0c").unwrap(),
            PackedRgba::rgb(10, 11, 12)
        );
        assert_eq!(
            PackedRgba::parse_css("rgba(1,2,3,0)").unwrap(),
            PackedRgba::rgba(1, 2, 3, 0)
        );
        assert_eq!(PackedRgba::WHITE.css_hex(), "#ffffff");
    }

    #[test]
    fn parse_css_rejects_garbage() {
        for bad in ["", "red", "#12", "rgb(1,2)", "rgb(300,0,0)", "rgba(1,2,3,2)"] {
            assert!(PackedRgba::parse_css(bad).is_err(), "{bad} should fail");
        }
    }
}
