#![forbid(unsafe_code)]

//! Grid topology and the per-cell flicker buffer.
//!
//! The buffer is one contiguous `Vec<Cell>` in column-major order: cell
//! `(column, row)` lives at `column * rows + row`. Cells never reference each
//! other.
//!
//! # Invariants
//!
//! - `cells.len() == columns * rows` at all times.
//! - `columns = floor(width / (cell_size + gap))`, same for rows.
//! - The device pixel ratio only scales backing-store coordinates; it never
//!   changes `columns` or `rows`.
//! - A layout with more than [`MAX_CELLS`] cells, or more than that many on
//!   either axis, collapses to `0 x 0`.

use rand::Rng;

/// Lower bound of each pastel color channel (inclusive).
pub const PALETTE_MIN: u8 = 180;
/// Upper bound of each pastel color channel (exclusive).
pub const PALETTE_MAX: u8 = 255;
/// Initial `last_flicker_ms` values are spread over `[0, this)` to desynchronize cells.
pub const INITIAL_PHASE_SPREAD_MS: f64 = 2000.0;
/// Largest cell buffer a layout may describe (4M cells, roughly a 40960 px
/// square at the default pitch).
pub const MAX_CELLS: usize = 1 << 22;

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Current opacity in `[0, max_opacity]`.
    pub opacity: f32,
    /// Animation-clock timestamp (ms) of the last state transition.
    pub last_flicker_ms: f64,
}

impl Cell {
    /// A dark cell with a fresh pastel color and a random phase.
    pub fn fresh<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (red, green, blue) = pastel(rng);
        Self {
            red,
            green,
            blue,
            opacity: 0.0,
            last_flicker_ms: rng.random::<f64>() * INITIAL_PHASE_SPREAD_MS,
        }
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Draw a pastel color: each channel uniform over `PALETTE_MIN..PALETTE_MAX`.
#[inline]
pub fn pastel<R: Rng + ?Sized>(rng: &mut R) -> (u8, u8, u8) {
    (
        rng.random_range(PALETTE_MIN..PALETTE_MAX),
        rng.random_range(PALETTE_MIN..PALETTE_MAX),
        rng.random_range(PALETTE_MIN..PALETTE_MAX),
    )
}

/// Logical grid layout plus the pixel ratio used to address the backing store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: f32,
    pub gap: f32,
    pub device_pixel_ratio: f32,
}

impl GridGeometry {
    /// Lay out a grid over a `width` x `height` logical surface.
    ///
    /// Negative, NaN or infinite dimensions count as zero. A non-positive pitch
    /// yields an empty grid rather than dividing by zero. Layouts past
    /// [`MAX_CELLS`] collapse to an empty grid.
    pub fn compute(width: f32, height: f32, cell_size: f32, gap: f32, dpr: f32) -> Self {
        let pitch = cell_size + gap;
        let fit = |extent: f32| -> usize {
            if !(pitch > 0.0) || !extent.is_finite() || extent <= 0.0 {
                return 0;
            }
            (extent / pitch).floor() as usize
        };
        Self {
            columns: fit(width),
            rows: fit(height),
            cell_size,
            gap,
            device_pixel_ratio: if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 },
        }
        .bounded()
    }

    /// `self`, or an empty layout with the same cell metrics when it exceeds
    /// [`MAX_CELLS`].
    pub fn bounded(self) -> Self {
        let fits = self.columns <= MAX_CELLS
            && self.rows <= MAX_CELLS
            && self
                .columns
                .checked_mul(self.rows)
                .is_some_and(|n| n <= MAX_CELLS);
        if fits {
            return self;
        }
        tracing::warn!(
            columns = self.columns,
            rows = self.rows,
            max = MAX_CELLS,
            "grid exceeds cell limit; laying out nothing"
        );
        Self {
            columns: 0,
            rows: 0,
            ..self
        }
    }

    /// Cell count. Saturates instead of overflowing for hand-built layouts.
    #[inline]
    pub const fn len(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    /// Logical distance between consecutive cell origins.
    #[inline]
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.gap
    }

    /// Top-left corner of a cell in backing-store pixels.
    #[inline]
    pub fn cell_origin(&self, column: usize, row: usize) -> (f32, f32) {
        let step = self.pitch() * self.device_pixel_ratio;
        (column as f32 * step, row as f32 * step)
    }

    /// Side length of a cell square in backing-store pixels.
    #[inline]
    pub fn cell_side(&self) -> f32 {
        self.cell_size * self.device_pixel_ratio
    }

    /// Buffer index of `(column, row)`.
    #[inline]
    pub const fn index(&self, column: usize, row: usize) -> usize {
        column * self.rows + row
    }
}

/// The grid topology and its cell buffer.
#[derive(Debug, Clone)]
pub struct GridState {
    geometry: GridGeometry,
    cells: Vec<Cell>,
}

impl GridState {
    /// Allocate `geometry.len()` fresh cells.
    pub fn new<R: Rng + ?Sized>(geometry: GridGeometry, rng: &mut R) -> Self {
        let mut state = Self {
            geometry,
            cells: Vec::new(),
        };
        state.regrid(geometry, rng);
        state
    }

    /// A grid with no cells.
    pub fn empty() -> Self {
        Self {
            geometry: GridGeometry::compute(0.0, 0.0, 1.0, 0.0, 1.0),
            cells: Vec::new(),
        }
    }

    /// Replace the topology and reinitialize every cell.
    ///
    /// No state from the previous generation survives: every cell is dark,
    /// recolored and re-phased. The allocation is reused when it is large
    /// enough.
    pub fn regrid<R: Rng + ?Sized>(&mut self, geometry: GridGeometry, rng: &mut R) {
        let geometry = geometry.bounded();
        self.geometry = geometry;
        self.cells.clear();
        self.cells.reserve(geometry.len());
        self.cells
            .extend((0..geometry.len()).map(|_| Cell::fresh(rng)));
        debug_assert_eq!(self.cells.len(), self.geometry.len());
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.geometry.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&Cell> {
        if column >= self.geometry.columns || row >= self.geometry.rows {
            return None;
        }
        self.cells.get(self.geometry.index(column, row))
    }

    /// Number of cells with nonzero opacity.
    pub fn lit_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_lit()).count()
    }

    /// Clamp every cell into `[0, max_opacity]`.
    pub fn clamp_opacity(&mut self, max_opacity: f32) {
        for cell in &mut self.cells {
            cell.opacity = cell.opacity.clamp(0.0, max_opacity);
        }
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::empty()
    }
}
