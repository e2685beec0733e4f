#![forbid(unsafe_code)]

//! Cursor-reveal variant.
//!
//! Same lifecycle as [`FlickeringGrid`](crate::FlickeringGrid): the resizer
//! lays out a grid, the visibility scheduler gates the loop, teardown is final.
//! The cells are different. Each holds a fixed glyph taken cyclically (in
//! reading order) from a configured text, and a reveal level in `[0, 1]` that
//! follows the cursor:
//!
//! ```text
//! target = clamp(1 - dist(cell centre, cursor) / radius, 0, 1)   cursor present
//! target = 0                                                     cursor absent
//! level moves toward target by at most fade_rate * dt per tick
//! ```
//!
//! Frames paint the background, every glyph with alpha = reveal level, then a
//! radial overlay around the cursor composited with difference blending.

use serde::Deserialize;

use crate::color::PackedRgba;
use crate::error::ConfigError;
use crate::flickering_grid::Dispatch;
use crate::grid::{GridGeometry, GridState};
use crate::resizer::Resizer;
use crate::scheduler::{FrameRequester, VisibilityScheduler};
use crate::surface::RasterSurface;

pub const DEFAULT_REVEAL_CELL_SIZE: f32 = 14.0;
pub const DEFAULT_REVEAL_GAP: f32 = 2.0;
pub const DEFAULT_REVEAL_TEXT: &str = "FLICKERGRID";
pub const DEFAULT_REVEAL_RADIUS: f32 = 120.0;
/// Reveal level change per second.
pub const DEFAULT_FADE_RATE: f32 = 4.0;
/// Step used for the first tick after (re)start.
const NOMINAL_STEP_S: f64 = 1.0 / 60.0;
/// Longer gaps (tab switches, pauses) are treated as this long.
const MAX_STEP_S: f64 = 0.1;

/// Configuration for [`RevealGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct RevealConfig {
    pub cell_size: f32,
    pub gap: f32,
    pub text: String,
    pub radius: f32,
    pub fade_rate: f32,
    pub glyph_color: PackedRgba,
    pub background: PackedRgba,
    /// Overlay color at the cursor; its alpha scales the overlay strength.
    pub disruption_color: PackedRgba,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_REVEAL_CELL_SIZE,
            gap: DEFAULT_REVEAL_GAP,
            text: DEFAULT_REVEAL_TEXT.to_string(),
            radius: DEFAULT_REVEAL_RADIUS,
            fade_rate: DEFAULT_FADE_RATE,
            glyph_color: PackedRgba::BLACK,
            background: PackedRgba::WHITE,
            disruption_color: PackedRgba::WHITE,
            width: None,
            height: None,
        }
    }
}

impl RevealConfig {
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

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
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_fade_rate(mut self, fade_rate: f32) -> Self {
        self.fade_rate = fade_rate;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(ConfigError::InvalidGap(self.gap));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        if !self.fade_rate.is_finite() || self.fade_rate < 0.0 {
            return Err(ConfigError::InvalidFadeRate(self.fade_rate));
        }
        if self.text.chars().next().is_none() {
            return Err(ConfigError::EmptyText);
        }
        for dim in [self.width, self.height].into_iter().flatten() {
            if !dim.is_finite() || dim < 0.0 {
                return Err(ConfigError::InvalidDimension(dim));
            }
        }
        Ok(())
    }

    /// Parse camelCase JSON options and validate them. Missing keys default.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawRevealConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        let defaults = Self::default();
        let color = |css: Option<String>, fallback: PackedRgba| match css {
            Some(css) => PackedRgba::parse_css(&css),
            None => Ok(fallback),
        };
        let config = Self {
            cell_size: raw.cell_size.unwrap_or(defaults.cell_size),
            gap: raw.gap.unwrap_or(defaults.gap),
            text: raw.text.unwrap_or(defaults.text),
            radius: raw.radius.unwrap_or(defaults.radius),
            fade_rate: raw.fade_rate.unwrap_or(defaults.fade_rate),
            glyph_color: color(raw.glyph_color, defaults.glyph_color)?,
            background: color(raw.background, defaults.background)?.opaque(),
            disruption_color: color(raw.disruption_color, defaults.disruption_color)?,
            width: raw.width,
            height: raw.height,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRevealConfig {
    #[serde(alias = "fontSize")]
    cell_size: Option<f32>,
    gap: Option<f32>,
    text: Option<String>,
    radius: Option<f32>,
    fade_rate: Option<f32>,
    glyph_color: Option<String>,
    background: Option<String>,
    disruption_color: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
}

/// Host notifications for [`RevealGrid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealEvent {
    Resize {
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
    },
    VisibilityChanged(bool),
    Tick(f64),
    /// Cursor position in logical px relative to the surface.
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
}

/// Counters for one reveal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealStats {
    /// Cells with a nonzero reveal level after the update.
    pub revealed: usize,
    /// Glyph draw calls issued.
    pub drawn: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealCell {
    pub glyph: char,
    pub level: f32,
}

/// Move `level` toward `target` by at most `max_delta`.
#[inline]
fn approach(level: f32, target: f32, max_delta: f32) -> f32 {
    if level < target {
        (level + max_delta).min(target)
    } else {
        (level - max_delta).max(target)
    }
}

/// Cursor-reveal text grid bound to a raster surface.
#[derive(Debug)]
pub struct RevealGrid<S> {
    config: RevealConfig,
    glyphs: Vec<char>,
    resizer: Resizer,
    scheduler: VisibilityScheduler,
    geometry: GridGeometry,
    cells: Vec<RevealCell>,
    pointer: Option<(f32, f32)>,
    last_tick_ms: Option<f64>,
    surface: Option<S>,
    last_stats: RevealStats,
}

impl<S: RasterSurface> RevealGrid<S> {
    pub fn new(config: RevealConfig, surface: Option<S>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut resizer = Resizer::new(config.cell_size, config.gap);
        resizer.set_overrides(config.width, config.height);
        Ok(Self {
            glyphs: config.text.chars().collect(),
            resizer,
            scheduler: VisibilityScheduler::new(),
            geometry: *GridState::empty().geometry(),
            cells: Vec::new(),
            pointer: None,
            last_tick_ms: None,
            surface,
            last_stats: RevealStats::default(),
            config,
        })
    }

    pub fn dispatch(
        &mut self,
        event: RevealEvent,
        frames: &mut dyn FrameRequester,
    ) -> Dispatch<RevealStats> {
        if self.surface.is_none() {
            return Dispatch::Inert;
        }
        if self.scheduler.is_torn_down() {
            return Dispatch::Ignored;
        }
        match event {
            RevealEvent::Resize {
                width,
                height,
                device_pixel_ratio,
            } => Dispatch::Regridded(self.regrid(width, height, device_pixel_ratio)),
            RevealEvent::VisibilityChanged(visible) => {
                if !visible {
                    self.last_tick_ms = None;
                }
                Dispatch::Visibility(self.scheduler.on_visibility(visible, frames))
            }
            RevealEvent::PointerMoved { x, y } => {
                self.pointer = Some((x, y));
                Dispatch::Pointer
            }
            RevealEvent::PointerLeft => {
                self.pointer = None;
                Dispatch::Pointer
            }
            RevealEvent::Tick(now_ms) => {
                if !self.scheduler.begin_tick() {
                    return Dispatch::Ignored;
                }
                let _span = tracing::trace_span!("flickergrid.reveal_tick", now_ms).entered();
                let revealed = self.step(now_ms);
                let drawn = self.draw();
                self.scheduler.end_tick(frames);
                self.last_stats = RevealStats { revealed, drawn };
                Dispatch::Rendered(self.last_stats)
            }
        }
    }

    pub fn teardown(&mut self, frames: &mut dyn FrameRequester) {
        self.scheduler.teardown(frames);
    }

    #[inline]
    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Cells in column-major order.
    #[inline]
    pub fn cells(&self) -> &[RevealCell] {
        &self.cells
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<&RevealCell> {
        if column >= self.geometry.columns || row >= self.geometry.rows {
            return None;
        }
        self.cells.get(self.geometry.index(column, row))
    }

    #[inline]
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    #[inline]
    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    #[inline]
    pub fn last_stats(&self) -> RevealStats {
        self.last_stats
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.scheduler.is_torn_down()
    }

    fn regrid(&mut self, width: f32, height: f32, dpr: f32) -> GridGeometry {
        let size = self.resizer.resolve(width, height, dpr);
        let geometry = self.resizer.geometry(size);
        if let Some(surface) = self.surface.as_mut() {
            surface.configure(size);
        }
        self.geometry = geometry;
        self.cells.clear();
        self.cells.reserve(geometry.len());
        let glyphs = &self.glyphs;
        self.cells.extend((0..geometry.columns).flat_map(move |column| {
            (0..geometry.rows).map(move |row| RevealCell {
                glyph: glyphs[(row * geometry.columns + column) % glyphs.len()],
                level: 0.0,
            })
        }));
        self.last_tick_ms = None;
        tracing::debug!(
            columns = geometry.columns,
            rows = geometry.rows,
            dpr = geometry.device_pixel_ratio,
            "flickergrid.reveal_regrid"
        );
        geometry
    }

    /// Advance reveal levels. Returns the number of revealed cells.
    fn step(&mut self, now_ms: f64) -> usize {
        let dt_s = match self.last_tick_ms {
            Some(prev) => ((now_ms - prev) / 1000.0).clamp(0.0, MAX_STEP_S),
            None => NOMINAL_STEP_S,
        };
        self.last_tick_ms = Some(now_ms);
        let max_delta = self.config.fade_rate * dt_s as f32;
        let pitch = self.geometry.pitch();
        let half = self.config.cell_size * 0.5;
        let radius = self.config.radius;

        let mut revealed = 0;
        for column in 0..self.geometry.columns {
            for row in 0..self.geometry.rows {
                let idx = self.geometry.index(column, row);
                let Some(cell) = self.cells.get_mut(idx) else {
                    continue;
                };
                let target = match self.pointer {
                    Some((px, py)) => {
                        let dx = column as f32 * pitch + half - px;
                        let dy = row as f32 * pitch + half - py;
                        (1.0 - (dx * dx + dy * dy).sqrt() / radius).clamp(0.0, 1.0)
                    }
                    None => 0.0,
                };
                cell.level = approach(cell.level, target, max_delta);
                if cell.level > 0.0 {
                    revealed += 1;
                }
            }
        }
        revealed
    }

    /// Paint one frame. Returns the number of glyph draw calls.
    fn draw(&mut self) -> usize {
        let Some(surface) = self.surface.as_mut() else {
            return 0;
        };
        surface.clear();
        surface.fill_background(self.config.background);

        let side = self.geometry.cell_side();
        let mut drawn = 0;
        for column in 0..self.geometry.columns {
            for row in 0..self.geometry.rows {
                let Some(cell) = self.cells.get(self.geometry.index(column, row)) else {
                    continue;
                };
                if cell.level <= 0.0 || cell.glyph.is_whitespace() {
                    continue;
                }
                let (x, y) = self.geometry.cell_origin(column, row);
                surface.draw_glyph(cell.glyph, x, y, side, self.config.glyph_color, cell.level);
                drawn += 1;
            }
        }

        if let Some((px, py)) = self.pointer {
            let dpr = self.geometry.device_pixel_ratio;
            surface.radial_disruption(
                px * dpr,
                py * dpr,
                self.config.radius * dpr,
                self.config.disruption_color,
            );
        }
        drawn
    }
}
