#![forbid(unsafe_code)]

//! The flickering-grid component as one event-driven state machine.
//!
//! Hosts translate their callbacks into [`GridEvent`]s and feed them to
//! [`FlickeringGrid::dispatch`] on a single thread:
//!
//! - container resize notifications become [`GridEvent::Resize`],
//! - viewport intersection notifications become [`GridEvent::VisibilityChanged`],
//! - repaint callbacks become [`GridEvent::Tick`] with the animation clock.
//!
//! A tick runs the updater to completion and then the renderer over the same
//! grid generation. A resize swaps the generation between ticks.
//!
//! # Example
//!
//! ```
//! use flickergrid_core::{FlickerConfig, FlickeringGrid, GridEvent, ManualFrames, PixelSurface};
//!
//! let mut frames = ManualFrames::new();
//! let config = FlickerConfig::default().with_seed(7);
//! let mut grid = FlickeringGrid::new(config, Some(PixelSurface::new())).unwrap();
//!
//! grid.dispatch(GridEvent::Resize { width: 200.0, height: 200.0, device_pixel_ratio: 1.0 }, &mut frames);
//! grid.dispatch(GridEvent::VisibilityChanged(true), &mut frames);
//! assert_eq!(grid.grid().len(), 100);
//!
//! // The host repaints: consume the pending request, then tick.
//! assert!(frames.fire().is_some());
//! grid.dispatch(GridEvent::Tick(16.0), &mut frames);
//! assert!(frames.pending().is_some());
//!
//! grid.teardown(&mut frames);
//! assert!(frames.pending().is_none());
//! ```

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::FlickerConfig;
use crate::error::ConfigError;
use crate::grid::{GridGeometry, GridState};
use crate::renderer::Renderer;
use crate::resizer::Resizer;
use crate::scheduler::{FrameRequester, SchedulerState, VisibilityScheduler};
use crate::surface::RasterSurface;
use crate::updater::Updater;

/// Seed used when neither the config nor the host supplies one.
pub const DEFAULT_SEED: u64 = 0x5EED_F11C_4E12_0001;

/// Host notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridEvent {
    /// Container box changed. Sizes are logical px.
    Resize {
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
    },
    /// Surface started or stopped intersecting the viewport.
    VisibilityChanged(bool),
    /// A requested repaint fired; the payload is the animation clock in ms.
    Tick(f64),
}

/// Counters for one update/render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub flickered_on: usize,
    pub decayed: usize,
    pub drawn: usize,
}

/// What a dispatched event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch<T = FrameStats> {
    /// No raster surface is attached; the component never does anything.
    Inert,
    /// Torn down, or a tick with no frame pending.
    Ignored,
    /// The grid was reallocated with this layout.
    Regridded(GridGeometry),
    /// Visibility was recorded; the scheduler is now in this state.
    Visibility(SchedulerState),
    /// Cursor position was recorded.
    Pointer,
    /// One update/render pass ran.
    Rendered(T),
}

/// Flickering grid bound to a raster surface.
#[derive(Debug)]
pub struct FlickeringGrid<S> {
    config: FlickerConfig,
    resizer: Resizer,
    updater: Updater,
    renderer: Renderer,
    scheduler: VisibilityScheduler,
    grid: GridState,
    surface: Option<S>,
    rng: SmallRng,
    last_stats: FrameStats,
}

impl<S: RasterSurface> FlickeringGrid<S> {
    /// Validate `config` and bind `surface`.
    ///
    /// `None` means no drawable context was available: the result accepts
    /// every event and does nothing.
    pub fn new(config: FlickerConfig, surface: Option<S>) -> Result<Self, ConfigError> {
        config.validate()?;
        if surface.is_none() {
            tracing::debug!("no raster surface; flickering grid is inert");
        }
        Ok(Self {
            resizer: Resizer::from_config(&config),
            updater: Updater::new(config.max_opacity),
            renderer: Renderer::from_config(&config),
            scheduler: VisibilityScheduler::new(),
            grid: GridState::empty(),
            surface,
            rng: SmallRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED)),
            last_stats: FrameStats::default(),
            config,
        })
    }

    /// Route one host event.
    pub fn dispatch(&mut self, event: GridEvent, frames: &mut dyn FrameRequester) -> Dispatch {
        let Some(surface) = self.surface.as_mut() else {
            return Dispatch::Inert;
        };
        if self.scheduler.is_torn_down() {
            return Dispatch::Ignored;
        }
        match event {
            GridEvent::Resize {
                width,
                height,
                device_pixel_ratio,
            } => {
                let geometry = self.resizer.apply(
                    width,
                    height,
                    device_pixel_ratio,
                    &mut self.grid,
                    surface,
                    &mut self.rng,
                );
                tracing::debug!(
                    columns = geometry.columns,
                    rows = geometry.rows,
                    dpr = geometry.device_pixel_ratio,
                    "flickergrid.regrid"
                );
                Dispatch::Regridded(geometry)
            }
            GridEvent::VisibilityChanged(visible) => {
                Dispatch::Visibility(self.scheduler.on_visibility(visible, frames))
            }
            GridEvent::Tick(now_ms) => {
                if !self.scheduler.begin_tick() {
                    return Dispatch::Ignored;
                }
                let _span = tracing::trace_span!("flickergrid.tick", now_ms).entered();
                let update = self.updater.step(&mut self.grid, now_ms, &mut self.rng);
                let drawn = self.renderer.draw(&self.grid, surface);
                self.scheduler.end_tick(frames);
                self.last_stats = FrameStats {
                    flickered_on: update.flickered_on,
                    decayed: update.decayed,
                    drawn,
                };
                tracing::trace!(
                    flickered_on = update.flickered_on,
                    decayed = update.decayed,
                    drawn,
                    "frame"
                );
                Dispatch::Rendered(self.last_stats)
            }
        }
    }

    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
        frames: &mut dyn FrameRequester,
    ) -> Dispatch {
        self.dispatch(
            GridEvent::Resize {
                width,
                height,
                device_pixel_ratio,
            },
            frames,
        )
    }

    pub fn set_visible(&mut self, visible: bool, frames: &mut dyn FrameRequester) -> Dispatch {
        self.dispatch(GridEvent::VisibilityChanged(visible), frames)
    }

    pub fn tick(&mut self, now_ms: f64, frames: &mut dyn FrameRequester) -> Dispatch {
        self.dispatch(GridEvent::Tick(now_ms), frames)
    }

    /// Cancel the pending frame and stop. Safe to call any number of times.
    pub fn teardown(&mut self, frames: &mut dyn FrameRequester) {
        self.scheduler.teardown(frames);
    }

    /// Change the opacity bound at runtime. Lit cells above the new bound are
    /// clamped immediately.
    pub fn set_max_opacity(&mut self, max_opacity: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&max_opacity) {
            return Err(ConfigError::OpacityOutOfRange(max_opacity));
        }
        if self.scheduler.is_torn_down() {
            return Ok(());
        }
        self.config.max_opacity = max_opacity;
        self.updater.set_max_opacity(max_opacity);
        self.grid.clamp_opacity(max_opacity);
        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &FlickerConfig {
        &self.config
    }

    #[inline]
    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    #[inline]
    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Stats of the most recent pass.
    #[inline]
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    #[inline]
    pub fn is_inert(&self) -> bool {
        self.surface.is_none()
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.scheduler.is_torn_down()
    }
}
