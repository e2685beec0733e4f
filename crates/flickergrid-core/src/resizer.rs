#![forbid(unsafe_code)]

//! Container size tracking and regridding.

use rand::Rng;

use crate::config::FlickerConfig;
use crate::grid::{GridGeometry, GridState};
use crate::surface::{RasterSurface, SurfaceSize};

/// Turns container size reports into a surface size and a fresh grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Resizer {
    cell_size: f32,
    gap: f32,
    width_override: Option<f32>,
    height_override: Option<f32>,
    current: Option<SurfaceSize>,
}

impl Resizer {
    pub fn new(cell_size: f32, gap: f32) -> Self {
        Self {
            cell_size,
            gap,
            width_override: None,
            height_override: None,
            current: None,
        }
    }

    pub fn from_config(config: &FlickerConfig) -> Self {
        let mut resizer = Self::new(config.cell_size, config.gap);
        resizer.set_overrides(config.width, config.height);
        resizer
    }

    /// Fix the logical size. A missing or zero override follows the container.
    pub fn set_overrides(&mut self, width: Option<f32>, height: Option<f32>) {
        self.width_override = width.filter(|w| *w > 0.0);
        self.height_override = height.filter(|h| *h > 0.0);
    }

    /// Size applied by the last [`Resizer::apply`], if any.
    #[inline]
    pub fn current(&self) -> Option<SurfaceSize> {
        self.current
    }

    /// Logical surface size for a container of the given dimensions.
    pub fn resolve(&self, container_width: f32, container_height: f32, dpr: f32) -> SurfaceSize {
        SurfaceSize::new(
            self.width_override.unwrap_or(container_width),
            self.height_override.unwrap_or(container_height),
            dpr,
        )
    }

    /// Grid layout for a resolved surface size.
    pub fn geometry(&self, size: SurfaceSize) -> GridGeometry {
        GridGeometry::compute(
            size.width,
            size.height,
            self.cell_size,
            self.gap,
            size.device_pixel_ratio,
        )
    }

    /// Reconfigure the surface backing store and reallocate the grid.
    ///
    /// Every call regrids, even when the size is unchanged.
    pub fn apply<S, R>(
        &mut self,
        container_width: f32,
        container_height: f32,
        dpr: f32,
        grid: &mut GridState,
        surface: &mut S,
        rng: &mut R,
    ) -> GridGeometry
    where
        S: RasterSurface + ?Sized,
        R: Rng + ?Sized,
    {
        let size = self.resolve(container_width, container_height, dpr);
        let geometry = self.geometry(size);
        surface.configure(size);
        grid.regrid(geometry, rng);
        self.current = Some(size);
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelSurface;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn resolve_prefers_positive_overrides() {
        let config = FlickerConfig::default().with_size(300.0, 0.0);
        let resizer = Resizer::from_config(&config);
        let size = resizer.resolve(800.0, 600.0, 2.0);
        assert_eq!((size.width, size.height), (300.0, 600.0));
        assert_eq!(size.device_pixel_ratio, 2.0);
    }

    #[test]
    fn apply_configures_surface_and_grid() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut resizer = Resizer::new(4.0, 16.0);
        let mut grid = GridState::empty();
        let mut surface = PixelSurface::new();
        let geometry = resizer.apply(200.0, 100.0, 2.0, &mut grid, &mut surface, &mut rng);
        assert_eq!((geometry.columns, geometry.rows), (10, 5));
        assert_eq!(grid.len(), 50);
        assert_eq!(surface.backing_size(), (400, 200));
        assert_eq!(surface.size().width, 200.0);
        assert_eq!(resizer.current(), Some(SurfaceSize::new(200.0, 100.0, 2.0)));
    }

    #[test]
    fn shrinking_to_zero_empties_grid() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut resizer = Resizer::new(4.0, 16.0);
        let mut grid = GridState::empty();
        let mut surface = PixelSurface::new();
        resizer.apply(200.0, 200.0, 1.0, &mut grid, &mut surface, &mut rng);
        resizer.apply(0.0, 200.0, 1.0, &mut grid, &mut surface, &mut rng);
        assert!(grid.is_empty());
        assert_eq!(surface.backing_size(), (0, 200));
    }
}
