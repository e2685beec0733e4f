#![forbid(unsafe_code)]

//! `CanvasRenderingContext2d` as a [`RasterSurface`].
//!
//! Canvas calls return `Result<_, JsValue>` for exotic failures (detached
//! canvas, invalid composite op). The effect is decorative, so those are
//! logged and dropped rather than propagated.

use flickergrid_core::{PackedRgba, RasterSurface, SurfaceSize};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

#[derive(Debug, Clone)]
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas2dSurface {
    /// Bind the canvas's 2D context. `None` when the context is unavailable.
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn full_rect(&self) -> (f64, f64) {
        (f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }
}

fn log_js_error(op: &'static str, err: wasm_bindgen::JsValue) {
    tracing::debug!(op, error = ?err, "canvas call failed");
}

impl RasterSurface for Canvas2dSurface {
    fn configure(&mut self, size: SurfaceSize) {
        // Assigning width/height also clears the backing store.
        self.canvas.set_width(size.backing_width());
        self.canvas.set_height(size.backing_height());
        let style = self.canvas.style();
        if let Err(err) = style.set_property("width", &format!("{}px", size.width)) {
            log_js_error("style.width", err);
        }
        if let Err(err) = style.set_property("height", &format!("{}px", size.height)) {
            log_js_error("style.height", err);
        }
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn clear(&mut self) {
        let (w, h) = self.full_rect();
        self.ctx.clear_rect(0.0, 0.0, w, h);
    }

    fn fill_background(&mut self, color: PackedRgba) {
        let (w, h) = self.full_rect();
        self.ctx.set_fill_style_str(&color.opaque().css_hex());
        self.ctx.fill_rect(0.0, 0.0, w, h);
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
        let css = color.css_rgba(opacity);
        self.ctx.set_shadow_blur(f64::from(blur));
        self.ctx.set_shadow_color(&css);
        self.ctx.set_fill_style_str(&css);
        self.ctx
            .fill_rect(f64::from(x), f64::from(y), f64::from(side), f64::from(side));
        self.ctx.set_shadow_blur(0.0);
    }

    fn draw_glyph(
        &mut self,
        glyph: char,
        x: f32,
        y: f32,
        size: f32,
        color: PackedRgba,
        opacity: f32,
    ) {
        let mut buf = [0u8; 4];
        self.ctx.set_font(&format!("{size}px monospace"));
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(&color.css_rgba(opacity));
        if let Err(err) = self
            .ctx
            .fill_text(glyph.encode_utf8(&mut buf), f64::from(x), f64::from(y))
        {
            log_js_error("fill_text", err);
        }
    }

    fn radial_disruption(&mut self, cx: f32, cy: f32, radius: f32, color: PackedRgba) {
        if radius <= 0.0 {
            return;
        }
        let (cx, cy, r) = (f64::from(cx), f64::from(cy), f64::from(radius));
        let gradient = match self.ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, r) {
            Ok(g) => g,
            Err(err) => return log_js_error("create_radial_gradient", err),
        };
        let strength = f32::from(color.a()) / 255.0;
        let stops = [(0.0, color.css_rgba(strength)), (1.0, color.css_rgba(0.0))];
        for (offset, css) in &stops {
            if let Err(err) = gradient.add_color_stop(*offset, css) {
                log_js_error("add_color_stop", err);
            }
        }
        if let Err(err) = self.ctx.set_global_composite_operation("difference") {
            return log_js_error("composite difference", err);
        }
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill_rect(cx - r, cy - r, 2.0 * r, 2.0 * r);
        if let Err(err) = self.ctx.set_global_composite_operation("source-over") {
            log_js_error("composite source-over", err);
        }
    }
}
