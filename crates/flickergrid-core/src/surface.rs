#![forbid(unsafe_code)]

//! Raster surfaces the renderers draw into.
//!
//! A surface has a logical size (layout pixels) and a backing store of
//! `floor(logical * dpr)` physical pixels. All drawing coordinates are in
//! backing-store pixels.
//!
//! [`PixelSurface`] is the software implementation used by headless hosts and
//! tests: a row-major `Vec<PackedRgba>` with straight-alpha source-over
//! blending. The web crate provides a canvas 2D implementation.

use crate::color::PackedRgba;

/// Largest backing store a [`PixelSurface`] allocates (64M pixels, 256 MiB).
/// Larger sizes configure an empty backing store.
pub const MAX_PIXELS: u64 = 1 << 26;

/// Logical surface size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl SurfaceSize {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
        device_pixel_ratio: 1.0,
    };

    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        let sanitize = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            width: sanitize(width),
            height: sanitize(height),
            device_pixel_ratio: if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        }
    }

    /// Backing-store width in physical pixels.
    #[inline]
    pub fn backing_width(&self) -> u32 {
        (self.width * self.device_pixel_ratio).floor() as u32
    }

    /// Backing-store height in physical pixels.
    #[inline]
    pub fn backing_height(&self) -> u32 {
        (self.height * self.device_pixel_ratio).floor() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backing_width() == 0 || self.backing_height() == 0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Drawing operations needed by the grid renderers.
///
/// Implementations must tolerate zero-sized backing stores and coordinates
/// outside the surface (clip, never panic).
pub trait RasterSurface {
    /// Resize the backing store to `size`'s backing resolution while the
    /// displayed size stays at the logical size. Clears the contents.
    fn configure(&mut self, size: SurfaceSize);

    /// Backing-store size in physical pixels.
    fn backing_size(&self) -> (u32, u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Fill the whole backing store with an opaque color.
    fn fill_background(&mut self, color: PackedRgba);

    /// Draw an axis-aligned square with a soft glow of the same color.
    ///
    /// `color` supplies RGB; `opacity` in `[0, 1]` is the fill alpha; `blur`
    /// is the glow radius in backing pixels (0 = no glow).
    fn fill_glow_square(
        &mut self,
        x: f32,
        y: f32,
        side: f32,
        color: PackedRgba,
        opacity: f32,
        blur: f32,
    );

    /// Draw one text glyph inside the `size` x `size` box at `(x, y)`.
    ///
    /// Surfaces without text support fill the glyph box instead.
    fn draw_glyph(
        &mut self,
        glyph: char,
        x: f32,
        y: f32,
        size: f32,
        color: PackedRgba,
        opacity: f32,
    ) {
        let _ = glyph;
        self.fill_glow_square(x, y, size, color, opacity, 0.0);
    }

    /// Radial gradient centred on `(cx, cy)` fading from `color` to nothing at
    /// `radius`, composited with difference blending.
    fn radial_disruption(&mut self, cx: f32, cy: f32, radius: f32, color: PackedRgba);
}

/// Software raster surface.
#[derive(Debug, Clone, Default)]
pub struct PixelSurface {
    size: SurfaceSize,
    width: u32,
    height: u32,
    pixels: Vec<PackedRgba>,
    draw_calls: u64,
}

impl PixelSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: SurfaceSize) -> Self {
        let mut surface = Self::new();
        surface.configure(size);
        surface
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Row-major pixels, `width * height` long.
    #[inline]
    pub fn pixels(&self) -> &[PackedRgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<PackedRgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Number of square/glyph/overlay draw operations since the last reset.
    #[inline]
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    pub fn reset_draw_calls(&mut self) {
        self.draw_calls = 0;
    }

    /// Count pixels that differ from `color`.
    pub fn count_not(&self, color: PackedRgba) -> usize {
        self.pixels.iter().filter(|&&p| p != color).count()
    }

    /// Pixel rows/columns covered by `[start, end)`, clipped to `limit`.
    #[inline]
    fn span(start: f32, end: f32, limit: u32) -> std::ops::Range<u32> {
        let lo = start.max(0.0).floor() as u32;
        let hi = end.max(0.0).ceil().min(limit as f32) as u32;
        lo.min(hi)..hi
    }

    #[inline]
    fn blend_at(&mut self, x: u32, y: u32, src: PackedRgba) {
        let idx = (y * self.width + x) as usize;
        if let Some(dst) = self.pixels.get_mut(idx) {
            *dst = src.over(*dst);
        }
    }
}

impl RasterSurface for PixelSurface {
    fn configure(&mut self, size: SurfaceSize) {
        self.size = size;
        let (w, h) = (size.backing_width(), size.backing_height());
        if u64::from(w) * u64::from(h) > MAX_PIXELS {
            tracing::warn!(
                width = w,
                height = h,
                max = MAX_PIXELS,
                "backing store too large; surface left empty"
            );
            self.width = 0;
            self.height = 0;
        } else {
            self.width = w;
            self.height = h;
        }
        let len = self.width as usize * self.height as usize;
        self.pixels.clear();
        self.pixels.resize(len, PackedRgba::TRANSPARENT);
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.pixels.fill(PackedRgba::TRANSPARENT);
    }

    fn fill_background(&mut self, color: PackedRgba) {
        self.pixels.fill(color.opaque());
    }

    fn fill_glow_square(
        &mut self,
        x: f32,
        y: f32,
        side: f32,
        color: PackedRgba,
        opacity: f32,
        blur: f32,
    ) {
        self.draw_calls += 1;
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 || side <= 0.0 || self.pixels.is_empty() {
            return;
        }
        let base = color.opaque();
        let (right, bottom) = (x + side, y + side);

        // Glow halo: gaussian-ish falloff of distance to the square, painted
        // under the square itself. Canvas shadows use sigma = blur / 2.
        if blur > 0.0 {
            let sigma = blur * 0.5;
            let two_sigma_sq = 2.0 * sigma * sigma;
            for py in Self::span(y - blur, bottom + blur, self.height) {
                let cy = py as f32 + 0.5;
                let dy = (y - cy).max(cy - bottom).max(0.0);
                for px in Self::span(x - blur, right + blur, self.width) {
                    let cx = px as f32 + 0.5;
                    let dx = (x - cx).max(cx - right).max(0.0);
                    let d_sq = dx * dx + dy * dy;
                    if d_sq == 0.0 || d_sq > blur * blur {
                        continue;
                    }
                    let falloff = (-d_sq / two_sigma_sq).exp();
                    self.blend_at(px, py, base.with_opacity(opacity * falloff * 0.5));
                }
            }
        }

        let fill = base.with_opacity(opacity);
        for py in Self::span(y, bottom, self.height) {
            let cy = py as f32 + 0.5;
            if cy < y || cy >= bottom {
                continue;
            }
            for px in Self::span(x, right, self.width) {
                let cx = px as f32 + 0.5;
                if cx < x || cx >= right {
                    continue;
                }
                self.blend_at(px, py, fill);
            }
        }
    }

    fn radial_disruption(&mut self, cx: f32, cy: f32, radius: f32, color: PackedRgba) {
        self.draw_calls += 1;
        if radius <= 0.0 || self.pixels.is_empty() {
            return;
        }
        let strength = color.a() as f32 / 255.0;
        let ys = Self::span(cy - radius, cy + radius, self.height);
        let xs = Self::span(cx - radius, cx + radius, self.width);
        for py in ys {
            let dy = py as f32 + 0.5 - cy;
            for px in xs.clone() {
                let dx = px as f32 + 0.5 - cx;
                let d = (dx * dx + dy * dy).sqrt();
                if d >= radius {
                    continue;
                }
                let src = color.opaque().with_opacity(strength * (1.0 - d / radius));
                let idx = (py * self.width + px) as usize;
                if let Some(dst) = self.pixels.get_mut(idx) {
                    *dst = src.difference(*dst);
                }
            }
        }
    }
}
