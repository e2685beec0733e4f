#![forbid(unsafe_code)]

//! Draws a [`GridState`] onto a [`RasterSurface`].

use crate::color::PackedRgba;
use crate::config::FlickerConfig;
use crate::grid::GridState;
use crate::surface::RasterSurface;

/// Background fill plus one glowing square per lit cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    background: PackedRgba,
    glow_blur: f32,
}

impl Renderer {
    pub fn new(background: PackedRgba, glow_blur: f32) -> Self {
        Self {
            background: background.opaque(),
            glow_blur: glow_blur.max(0.0),
        }
    }

    pub fn from_config(config: &FlickerConfig) -> Self {
        Self::new(config.background, config.glow_blur)
    }

    #[inline]
    pub fn background(&self) -> PackedRgba {
        self.background
    }

    #[inline]
    pub fn glow_blur(&self) -> f32 {
        self.glow_blur
    }

    /// Paint one frame. Returns the number of cells drawn.
    ///
    /// Dark cells issue no draw call at all. Columns are walked outer, rows
    /// inner, matching buffer order.
    pub fn draw<S: RasterSurface + ?Sized>(&self, grid: &GridState, surface: &mut S) -> usize {
        surface.clear();
        surface.fill_background(self.background);

        let geometry = grid.geometry();
        let side = geometry.cell_side();
        let mut drawn = 0;
        for column in 0..geometry.columns {
            for row in 0..geometry.rows {
                let Some(cell) = grid.get(column, row) else {
                    continue;
                };
                if !cell.is_lit() {
                    continue;
                }
                let (x, y) = geometry.cell_origin(column, row);
                surface.fill_glow_square(
                    x,
                    y,
                    side,
                    PackedRgba::rgb(cell.red, cell.green, cell.blue),
                    cell.opacity,
                    self.glow_blur,
                );
                drawn += 1;
            }
        }
        drawn
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_config(&FlickerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use crate::surface::{PixelSurface, SurfaceSize};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn setup(w: f32, h: f32, dpr: f32) -> (GridState, PixelSurface) {
        let mut rng = SmallRng::seed_from_u64(11);
        let grid = GridState::new(GridGeometry::compute(w, h, 4.0, 16.0, dpr), &mut rng);
        let surface = PixelSurface::with_size(SurfaceSize::new(w, h, dpr));
        (grid, surface)
    }

    #[test]
    fn dark_grid_draws_only_background() {
        let (grid, mut surface) = setup(200.0, 200.0, 1.0);
        let drawn = Renderer::default().draw(&grid, &mut surface);
        assert_eq!(drawn, 0);
        assert_eq!(surface.draw_calls(), 0);
        assert_eq!(surface.count_not(PackedRgba::WHITE), 0);
    }

    #[test]
    fn lit_cells_issue_one_draw_each() {
        let (mut grid, mut surface) = setup(200.0, 200.0, 1.0);
        grid.cells_mut()[0].opacity = 0.8;
        grid.cells_mut()[57].opacity = 0.3;
        let drawn = Renderer::new(PackedRgba::WHITE, 0.0).draw(&grid, &mut surface);
        assert_eq!(drawn, 2);
        assert_eq!(surface.draw_calls(), 2);
        // Cell 0 covers the top-left 4x4 square only.
        assert_eq!(surface.count_not(PackedRgba::WHITE), 32);
        assert_eq!(surface.pixel(4, 0), Some(PackedRgba::WHITE));
    }

    #[test]
    fn squares_scale_with_dpr() {
        let (mut grid, mut surface) = setup(40.0, 40.0, 2.0);
        // (column 1, row 0) is index 1 * rows + 0 = 2.
        grid.cells_mut()[2].opacity = 0.8;
        Renderer::new(PackedRgba::WHITE, 0.0).draw(&grid, &mut surface);
        assert_eq!(surface.count_not(PackedRgba::WHITE), 64);
        assert_ne!(surface.pixel(40, 0), Some(PackedRgba::WHITE));
        assert_ne!(surface.pixel(47, 7), Some(PackedRgba::WHITE));
        assert_eq!(surface.pixel(48, 0), Some(PackedRgba::WHITE));
    }

    #[test]
    fn redraw_clears_previous_frame() {
        let (mut grid, mut surface) = setup(40.0, 40.0, 1.0);
        let renderer = Renderer::new(PackedRgba::WHITE, 0.0);
        grid.cells_mut()[0].opacity = 0.8;
        renderer.draw(&grid, &mut surface);
        grid.cells_mut()[0].opacity = 0.0;
        renderer.draw(&grid, &mut surface);
        assert_eq!(surface.count_not(PackedRgba::WHITE), 0);
    }

    #[test]
    fn empty_grid_is_noop() {
        let mut surface = PixelSurface::new();
        let drawn = Renderer::default().draw(&GridState::empty(), &mut surface);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn background_is_forced_opaque() {
        let r = Renderer::new(PackedRgba::rgba(1, 2, 3, 4), -2.0);
        assert_eq!(r.background(), PackedRgba::rgb(1, 2, 3));
        assert_eq!(r.glow_blur(), 0.0);
    }
}
