#![forbid(unsafe_code)]

//! Component configuration.
//!
//! # Options
//!
//! | Field            | Default        | Effect                                              |
//! |------------------|----------------|-----------------------------------------------------|
//! | `cell_size`      | 4              | side of each cell in logical px                     |
//! | `gap`            | 16             | spacing between cells; pitch = `cell_size + gap`    |
//! | `flicker_chance` | 0.05           | accepted and validated, not consulted by the updater|
//! | `color`          | `rgb(0, 0, 0)` | accepted and validated, not used by the updater     |
//! | `width`/`height` | container size | explicit logical size override                      |
//! | `max_opacity`    | 0.8            | upper bound for flicker-on opacity draws            |
//! | `background`     | `#ffffff`      | opaque fill under the cells                         |
//! | `glow_blur`      | 8              | shadow blur radius around lit cells                 |
//! | `seed`           | random         | fixes the random stream                             |
//!
//! The updater's flicker-on probability is fixed at
//! [`FLICKER_ON_PROBABILITY`](crate::updater::FLICKER_ON_PROBABILITY) and every
//! lit cell gets a freshly drawn pastel color, so `flicker_chance` and `color`
//! have no visible effect. They are kept so callers written against the
//! documented surface continue to work.

use serde::Deserialize;

use crate::color::PackedRgba;
use crate::error::ConfigError;

pub const DEFAULT_CELL_SIZE: f32 = 4.0;
pub const DEFAULT_GAP: f32 = 16.0;
pub const DEFAULT_FLICKER_CHANCE: f32 = 0.05;
pub const DEFAULT_MAX_OPACITY: f32 = 0.8;
pub const DEFAULT_GLOW_BLUR: f32 = 8.0;
pub const DEFAULT_COLOR: PackedRgba = PackedRgba::BLACK;
pub const DEFAULT_BACKGROUND: PackedRgba = PackedRgba::WHITE;

/// Configuration for [`FlickeringGrid`](crate::FlickeringGrid).
#[derive(Debug, Clone, PartialEq)]
pub struct FlickerConfig {
    pub cell_size: f32,
    pub gap: f32,
    pub flicker_chance: f32,
    pub color: PackedRgba,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub max_opacity: f32,
    pub background: PackedRgba,
    pub glow_blur: f32,
    pub seed: Option<u64>,
}

impl Default for FlickerConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            gap: DEFAULT_GAP,
            flicker_chance: DEFAULT_FLICKER_CHANCE,
            color: DEFAULT_COLOR,
            width: None,
            height: None,
            max_opacity: DEFAULT_MAX_OPACITY,
            background: DEFAULT_BACKGROUND,
            glow_blur: DEFAULT_GLOW_BLUR,
            seed: None,
        }
    }
}

impl FlickerConfig {
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    #[must_use]
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    #[must_use]
    pub fn with_flicker_chance(mut self, chance: f32) -> Self {
        self.flicker_chance = chance;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: PackedRgba) -> Self {
        self.color = color;
        self
    }

    /// Fix the logical surface size instead of following the container.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_max_opacity(mut self, max_opacity: f32) -> Self {
        self.max_opacity = max_opacity;
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: PackedRgba) -> Self {
        self.background = background;
        self
    }

    #[must_use]
    pub fn with_glow_blur(mut self, blur: f32) -> Self {
        self.glow_blur = blur;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Distance between consecutive cell origins in logical px.
    #[inline]
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.gap
    }

    /// Check every numeric option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(ConfigError::InvalidGap(self.gap));
        }
        if self.pitch() <= 0.0 {
            return Err(ConfigError::ZeroPitch);
        }
        if !(0.0..=1.0).contains(&self.max_opacity) {
            return Err(ConfigError::OpacityOutOfRange(self.max_opacity));
        }
        if !(0.0..=1.0).contains(&self.flicker_chance) {
            return Err(ConfigError::ChanceOutOfRange(self.flicker_chance));
        }
        for dim in [self.width, self.height].into_iter().flatten() {
            if !dim.is_finite() || dim < 0.0 {
                return Err(ConfigError::InvalidDimension(dim));
            }
        }
        if !self.glow_blur.is_finite() || self.glow_blur < 0.0 {
            return Err(ConfigError::InvalidGlowBlur(self.glow_blur));
        }
        Ok(())
    }

    /// Parse options from a JSON object and validate them.
    ///
    /// Keys are camelCase; the component prop names (`squareSize`,
    /// `gridGap`) and the pixel-suffixed forms (`cellSizePx`, `gapPx`) are
    /// accepted as aliases. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        let config = raw.into_config()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    #[serde(alias = "squareSize", alias = "cellSizePx")]
    cell_size: Option<f32>,
    #[serde(alias = "gridGap", alias = "gapPx")]
    gap: Option<f32>,
    flicker_chance: Option<f32>,
    color: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    max_opacity: Option<f32>,
    background: Option<String>,
    glow_blur: Option<f32>,
    seed: Option<u64>,
}

impl RawConfig {
    fn into_config(self) -> Result<FlickerConfig, ConfigError> {
        let defaults = FlickerConfig::default();
        Ok(FlickerConfig {
            cell_size: self.cell_size.unwrap_or(defaults.cell_size),
            gap: self.gap.unwrap_or(defaults.gap),
            flicker_chance: self.flicker_chance.unwrap_or(defaults.flicker_chance),
            color: match self.color {
                Some(css) => PackedRgba::parse_css(&css)?,
                None => defaults.color,
            },
            width: self.width,
            height: self.height,
            max_opacity: self.max_opacity.unwrap_or(defaults.max_opacity),
            background: match self.background {
                Some(css) => PackedRgba::parse_css(&css)?.opaque(),
                None => defaults.background,
            },
            glow_blur: self.glow_blur.unwrap_or(defaults.glow_blur),
            seed: self.seed,
        })
    }
}
