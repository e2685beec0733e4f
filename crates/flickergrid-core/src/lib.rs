#![forbid(unsafe_code)]

//! `flickergrid-core` is the host-agnostic engine behind the flickering grid
//! background effect: a field of independently flickering cells drawn behind
//! page content.
//!
//! Design goals:
//! - **Host-driven**: the embedding environment pushes resize, visibility and
//!   repaint events; the engine never owns a clock or a thread.
//! - **Deterministic**: all randomness flows from one seeded generator.
//! - **Offscreen is free**: no frames are requested while the surface is not
//!   visible.
//!
//! Data flow:
//!
//! ```text
//! Resize ──► Resizer ──► GridState (regrid)
//! Visibility ──► VisibilityScheduler ──► FrameRequester (host)
//! Tick ──► Updater ──► GridState ──► Renderer ──► RasterSurface
//! ```
//!
//! [`FlickeringGrid`] wires these together behind a single
//! [`dispatch`](FlickeringGrid::dispatch) entry point. [`RevealGrid`] is a
//! sibling effect (cursor-revealed text) on the same lifecycle.

pub mod color;
pub mod config;
pub mod error;
pub mod flickering_grid;
pub mod grid;
pub mod renderer;
pub mod resizer;
pub mod reveal;
pub mod scheduler;
pub mod surface;
pub mod updater;

pub use color::PackedRgba;
pub use config::FlickerConfig;
pub use error::ConfigError;
pub use flickering_grid::{DEFAULT_SEED, Dispatch, FlickeringGrid, FrameStats, GridEvent};
pub use grid::{Cell, GridGeometry, GridState, MAX_CELLS};
pub use renderer::Renderer;
pub use resizer::Resizer;
pub use reveal::{RevealConfig, RevealEvent, RevealGrid, RevealStats};
pub use scheduler::{FrameHandle, FrameRequester, ManualFrames, SchedulerState, VisibilityScheduler};
pub use surface::{MAX_PIXELS, PixelSurface, RasterSurface, SurfaceSize};
pub use updater::{UpdateStats, Updater};
