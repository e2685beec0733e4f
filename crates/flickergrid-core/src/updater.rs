#![forbid(unsafe_code)]

//! Per-tick flicker update.
//!
//! Each cell is evaluated independently against a freshly drawn interval in
//! `[500, 3000)` ms. Once the interval has elapsed since the cell's last
//! transition, a biased coin picks one of two branches:
//!
//! ```text
//!            elapsed > interval
//!   ┌──────────────┬──────────────┐
//!   │ p = 0.3      │ p = 0.7      │
//!   ▼              ▼              │
//! FLICKER_ON     DECAY            │
//! new color      opacity *= 0.95  │
//! opacity ~ U    snap < 0.01 to 0 │
//! last = now     last = now - interval + U[0, 1000)
//! ```
//!
//! The decay branch backdates `last_flicker_ms` so the next check fires sooner,
//! which makes fading faster than lighting up. Because the interval is redrawn
//! at every evaluation, timing is closer to a memoryless process than to a
//! fixed period.

use rand::Rng;

use crate::grid::{Cell, GridState, pastel};

pub const FLICKER_INTERVAL_MIN_MS: f64 = 500.0;
pub const FLICKER_INTERVAL_SPAN_MS: f64 = 2500.0;
/// Probability that an expired cell lights up instead of decaying.
pub const FLICKER_ON_PROBABILITY: f32 = 0.3;
pub const DECAY_FACTOR: f32 = 0.95;
/// Decayed opacities below this snap to exactly zero.
pub const SNAP_TO_ZERO_BELOW: f32 = 0.01;
pub const DECAY_JITTER_MS: f64 = 1000.0;

/// Outcome of evaluating one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Interval not yet elapsed; nothing changed.
    Hold,
    FlickerOn,
    Decay,
}

/// Counters for one update pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub flickered_on: usize,
    pub decayed: usize,
}

/// Advance one cell to `now_ms`.
pub fn advance_cell<R: Rng + ?Sized>(
    cell: &mut Cell,
    now_ms: f64,
    max_opacity: f32,
    rng: &mut R,
) -> Transition {
    let interval = FLICKER_INTERVAL_MIN_MS + rng.random::<f64>() * FLICKER_INTERVAL_SPAN_MS;
    if now_ms - cell.last_flicker_ms <= interval {
        return Transition::Hold;
    }

    if rng.random::<f32>() < FLICKER_ON_PROBABILITY {
        let (red, green, blue) = pastel(rng);
        cell.red = red;
        cell.green = green;
        cell.blue = blue;
        cell.opacity = rng.random::<f32>() * max_opacity;
        cell.last_flicker_ms = now_ms;
        Transition::FlickerOn
    } else {
        cell.opacity *= DECAY_FACTOR;
        if cell.opacity < SNAP_TO_ZERO_BELOW {
            cell.opacity = 0.0;
        }
        cell.last_flicker_ms = now_ms - interval + rng.random::<f64>() * DECAY_JITTER_MS;
        Transition::Decay
    }
}

/// Advances every cell of a grid by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Updater {
    max_opacity: f32,
}

impl Updater {
    pub fn new(max_opacity: f32) -> Self {
        Self {
            max_opacity: max_opacity.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn max_opacity(&self) -> f32 {
        self.max_opacity
    }

    pub fn set_max_opacity(&mut self, max_opacity: f32) {
        self.max_opacity = max_opacity.clamp(0.0, 1.0);
    }

    /// Evaluate every cell at `now_ms`. An empty grid is a no-op.
    pub fn step<R: Rng + ?Sized>(
        &self,
        grid: &mut GridState,
        now_ms: f64,
        rng: &mut R,
    ) -> UpdateStats {
        let mut stats = UpdateStats::default();
        for cell in grid.cells_mut() {
            match advance_cell(cell, now_ms, self.max_opacity, rng) {
                Transition::Hold => {}
                Transition::FlickerOn => stats.flickered_on += 1,
                Transition::Decay => stats.decayed += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn cell(opacity: f32, last: f64) -> Cell {
        Cell {
            red: 200,
            green: 200,
            blue: 200,
            opacity,
            last_flicker_ms: last,
        }
    }

    #[test]
    fn holds_before_minimum_interval() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut c = cell(0.4, 1000.0);
        for _ in 0..100 {
            assert_eq!(advance_cell(&mut c, 1500.0, 0.8, &mut rng), Transition::Hold);
        }
        assert_eq!(c, cell(0.4, 1000.0));
    }

    #[test]
    fn always_transitions_after_maximum_interval() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..200 {
            let mut c = cell(0.4, 0.0);
            let t = advance_cell(&mut c, 3000.5, 0.8, &mut rng);
            assert_ne!(t, Transition::Hold);
        }
    }

    #[test]
    fn flicker_on_sets_timestamp_and_bounded_opacity() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen = 0;
        for _ in 0..500 {
            let mut c = cell(0.0, 0.0);
            if advance_cell(&mut c, 10_000.0, 0.8, &mut rng) == Transition::FlickerOn {
                seen += 1;
                assert_eq!(c.last_flicker_ms, 10_000.0);
                assert!((0.0..0.8).contains(&c.opacity));
                for ch in [c.red, c.green, c.blue] {
                    assert!((180..255).contains(&ch));
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn decay_shrinks_and_backdates() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut seen = 0;
        for _ in 0..500 {
            let mut c = cell(0.5, 0.0);
            if advance_cell(&mut c, 10_000.0, 0.8, &mut rng) == Transition::Decay {
                seen += 1;
                assert!((c.opacity - 0.475).abs() < 1e-6);
                // now - interval + jitter, interval in [500, 3000), jitter in [0, 1000)
                assert!(c.last_flicker_ms > 10_000.0 - 3000.0);
                assert!(c.last_flicker_ms < 10_000.0 - 500.0 + 1000.0);
                assert_eq!((c.red, c.green, c.blue), (200, 200, 200));
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn decay_snaps_small_opacity_to_zero() {
        let mut rng = SmallRng::seed_from_u64(5);
        loop {
            let mut c = cell(0.0105, 0.0);
            if advance_cell(&mut c, 10_000.0, 0.8, &mut rng) == Transition::Decay {
                assert_eq!(c.opacity, 0.0);
                break;
            }
        }
    }

    #[test]
    fn zero_max_opacity_never_lights() {
        let mut rng = SmallRng::seed_from_u64(6);
        let updater = Updater::new(0.0);
        let mut grid = GridState::new(GridGeometry::compute(200.0, 200.0, 4.0, 16.0, 1.0), &mut rng);
        let mut now = 0.0;
        for _ in 0..200 {
            now += 50.0;
            updater.step(&mut grid, now, &mut rng);
            assert_eq!(grid.lit_count(), 0);
        }
    }

    #[test]
    fn step_on_empty_grid_is_noop() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut grid = GridState::empty();
        assert_eq!(
            Updater::new(0.8).step(&mut grid, 1e9, &mut rng),
            UpdateStats::default()
        );
    }

    #[test]
    fn step_counts_transitions() {
        let mut rng = SmallRng::seed_from_u64(8);
        let updater = Updater::new(0.8);
        let mut grid = GridState::new(GridGeometry::compute(200.0, 200.0, 4.0, 16.0, 1.0), &mut rng);
        // Every initial phase is < 2000 ms, so at 5001 ms every cell has expired.
        let stats = updater.step(&mut grid, 5001.0, &mut rng);
        assert_eq!(stats.flickered_on + stats.decayed, 100);
        // Cells start dark, so only flicker-on transitions can light them.
        assert!(grid.lit_count() <= stats.flickered_on);
    }

    #[test]
    fn updater_clamps_configured_bound() {
        assert_eq!(Updater::new(4.0).max_opacity(), 1.0);
        let mut u = Updater::new(0.5);
        u.set_max_opacity(-1.0);
        assert_eq!(u.max_opacity(), 0.0);
    }
}
