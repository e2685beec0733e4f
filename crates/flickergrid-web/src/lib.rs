#![forbid(unsafe_code)]

//! WASM frontend for the flickering grid background.
//!
//! JS mounts an effect on an existing container and `<canvas>`:
//!
//! ```js
//! const grid = new FlickeringGridWeb(container, canvas, { squareSize: 4, gridGap: 16 });
//! // ...
//! grid.destroy();
//! ```
//!
//! The crate binds the canvas 2D context as the raster surface, drives ticks
//! from `requestAnimationFrame`, and forwards `ResizeObserver`,
//! `IntersectionObserver` and pointer notifications into the core state
//! machines. A canvas without a 2D context yields a mounted but inert effect.

pub mod options;

#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use canvas::Canvas2dSurface;
#[cfg(target_arch = "wasm32")]
pub use wasm::{FlickeringGridWeb, RevealGridWeb};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct FlickeringGridWeb;

#[cfg(not(target_arch = "wasm32"))]
impl FlickeringGridWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }

    pub fn destroy(&mut self) {}
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct RevealGridWeb;

#[cfg(not(target_arch = "wasm32"))]
impl RevealGridWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }

    pub fn destroy(&mut self) {}
}
