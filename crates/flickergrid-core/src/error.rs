#![forbid(unsafe_code)]

//! Error types.
//!
//! The effect is decorative, so very little can fail at runtime: a missing
//! raster context turns the component into a silent no-op rather than an
//! error. What remains is configuration validation.

use std::fmt;

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Cell size must be finite and strictly positive.
    InvalidCellSize(f32),
    /// Gap must be finite and non-negative.
    InvalidGap(f32),
    /// `cell_size + gap` must be strictly positive.
    ZeroPitch,
    /// Maximum opacity must lie in `[0, 1]`.
    OpacityOutOfRange(f32),
    /// Flicker chance must lie in `[0, 1]`.
    ChanceOutOfRange(f32),
    /// Size override must be finite and non-negative.
    InvalidDimension(f32),
    /// Glow blur must be finite and non-negative.
    InvalidGlowBlur(f32),
    /// Reveal radius must be finite and strictly positive.
    InvalidRadius(f32),
    /// Reveal fade rate must be finite and non-negative.
    InvalidFadeRate(f32),
    /// Reveal text must contain at least one glyph.
    EmptyText,
    /// Unparseable CSS color.
    InvalidColor(String),
    /// Malformed JSON options.
    Json(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize(v) => write!(f, "cell size must be positive, got {v}"),
            Self::InvalidGap(v) => write!(f, "gap must be non-negative, got {v}"),
            Self::ZeroPitch => write!(f, "cell size plus gap must be positive"),
            Self::OpacityOutOfRange(v) => write!(f, "max opacity must be in [0, 1], got {v}"),
            Self::ChanceOutOfRange(v) => write!(f, "flicker chance must be in [0, 1], got {v}"),
            Self::InvalidDimension(v) => write!(f, "size override must be non-negative, got {v}"),
            Self::InvalidGlowBlur(v) => write!(f, "glow blur must be non-negative, got {v}"),
            Self::InvalidRadius(v) => write!(f, "reveal radius must be positive, got {v}"),
            Self::InvalidFadeRate(v) => write!(f, "fade rate must be non-negative, got {v}"),
            Self::EmptyText => write!(f, "reveal text must not be empty"),
            Self::InvalidColor(s) => write!(f, "invalid color: {s:?}"),
            Self::Json(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
