#![forbid(unsafe_code)]

//! Deterministic headless host for the flickering grid.
//!
//! Plays a [`Scenario`](scenario::Scenario) (resizes, visibility flips, frame
//! bursts, teardown) against a [`FlickeringGrid`](flickergrid_core::FlickeringGrid)
//! bound to a software [`PixelSurface`](flickergrid_core::PixelSurface), with a
//! manual clock and a manual frame source. Every run is reproducible from its
//! seed.
//!
//! - **Checksums**: each rendered frame is hashed (`fnv1a64`) so runs can be
//!   compared across builds.
//! - **JSONL logs**: stable schema, one record per host event.
//! - **PNG dumps**: the final frame can be written as a PNG image.
//!
//! # Quick Start
//!
//! ```
//! use flickergrid_core::FlickerConfig;
//! use flickergrid_harness::{HeadlessHost, RunLogger, Scenario};
//!
//! let scenario = Scenario::steady(200.0, 200.0, 1.0, 30, 16.0);
//! let mut host = HeadlessHost::new(FlickerConfig::default().with_seed(42)).unwrap();
//! let mut log = RunLogger::noop();
//! let summary = host.run(&scenario, &mut log);
//! assert_eq!(summary.frames, 30);
//! ```
//!
//! # Environment
//!
//! The CLI reads `FLICKERGRID_SEED`, `FLICKERGRID_WIDTH`, `FLICKERGRID_HEIGHT`,
//! `FLICKERGRID_TICKS` and `FLICKERGRID_LOG` (tracing filter).

pub mod checksum;
pub mod cli;
pub mod host;
pub mod run_log;
pub mod scenario;
pub mod snapshot;

pub use checksum::frame_checksum;
pub use host::{HeadlessHost, RunSummary};
pub use run_log::RunLogger;
pub use scenario::{Scenario, ScenarioError, Step};
