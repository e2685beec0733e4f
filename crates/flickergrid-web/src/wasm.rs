#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use flickergrid_core::{
    ConfigError, FlickeringGrid, FrameHandle, FrameRequester, RevealEvent, RevealGrid,
};
use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    HtmlCanvasElement, HtmlElement, IntersectionObserver, IntersectionObserverEntry, PointerEvent,
    ResizeObserver, Window,
};

use crate::canvas::Canvas2dSurface;
use crate::options;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ObserverCallback<O> = Closure<dyn FnMut(Array, O)>;

fn to_js(err: ConfigError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// `JSON.stringify` the options object; `undefined`/`null` mean defaults.
fn options_json(options: &JsValue) -> Result<Option<String>, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(None);
    }
    Ok(js_sys::JSON::stringify(options)?.as_string())
}

/// `requestAnimationFrame` as a [`FrameRequester`].
struct WebFrames {
    window: Window,
    callback: FrameCallback,
}

impl FrameRequester for WebFrames {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let callback = self.callback.borrow();
        let callback = callback.as_ref()?;
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => Some(FrameHandle(id as u32)),
            Err(err) => {
                tracing::debug!(error = ?err, "requestAnimationFrame failed");
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0 as i32) {
            tracing::debug!(error = ?err, %handle, "cancelAnimationFrame failed");
        }
    }
}

/// The part of an effect the browser host drives.
trait Effect: 'static {
    fn is_inert(&self) -> bool;
    fn resize(&mut self, width: f32, height: f32, dpr: f32, frames: &mut dyn FrameRequester);
    fn visibility(&mut self, visible: bool, frames: &mut dyn FrameRequester);
    fn tick(&mut self, now_ms: f64, frames: &mut dyn FrameRequester);
    fn pointer(&mut self, _position: Option<(f32, f32)>, _frames: &mut dyn FrameRequester) {}
    fn teardown(&mut self, frames: &mut dyn FrameRequester);
}

impl Effect for FlickeringGrid<Canvas2dSurface> {
    fn is_inert(&self) -> bool {
        FlickeringGrid::is_inert(self)
    }

    fn resize(&mut self, width: f32, height: f32, dpr: f32, frames: &mut dyn FrameRequester) {
        FlickeringGrid::resize(self, width, height, dpr, frames);
    }

    fn visibility(&mut self, visible: bool, frames: &mut dyn FrameRequester) {
        self.set_visible(visible, frames);
    }

    fn tick(&mut self, now_ms: f64, frames: &mut dyn FrameRequester) {
        FlickeringGrid::tick(self, now_ms, frames);
    }

    fn teardown(&mut self, frames: &mut dyn FrameRequester) {
        FlickeringGrid::teardown(self, frames);
    }
}

impl Effect for RevealGrid<Canvas2dSurface> {
    fn is_inert(&self) -> bool {
        self.surface().is_none()
    }

    fn resize(&mut self, width: f32, height: f32, dpr: f32, frames: &mut dyn FrameRequester) {
        self.dispatch(
            RevealEvent::Resize {
                width,
                height,
                device_pixel_ratio: dpr,
            },
            frames,
        );
    }

    fn visibility(&mut self, visible: bool, frames: &mut dyn FrameRequester) {
        self.dispatch(RevealEvent::VisibilityChanged(visible), frames);
    }

    fn tick(&mut self, now_ms: f64, frames: &mut dyn FrameRequester) {
        self.dispatch(RevealEvent::Tick(now_ms), frames);
    }

    fn pointer(&mut self, position: Option<(f32, f32)>, frames: &mut dyn FrameRequester) {
        let event = match position {
            Some((x, y)) => RevealEvent::PointerMoved { x, y },
            None => RevealEvent::PointerLeft,
        };
        self.dispatch(event, frames);
    }

    fn teardown(&mut self, frames: &mut dyn FrameRequester) {
        RevealGrid::teardown(self, frames);
    }
}

/// Observers, listeners and the frame loop around one effect.
struct Host<E: Effect> {
    effect: E,
    frames: WebFrames,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    resize_observer: Option<ResizeObserver>,
    intersection_observer: Option<IntersectionObserver>,
    on_resize: Option<ObserverCallback<ResizeObserver>>,
    on_intersect: Option<ObserverCallback<IntersectionObserver>>,
    on_pointer_move: Option<Closure<dyn FnMut(PointerEvent)>>,
    on_pointer_leave: Option<Closure<dyn FnMut(PointerEvent)>>,
    destroyed: bool,
}

impl<E: Effect> Host<E> {
    fn resize_to_container(&mut self) {
        let width = self.container.client_width().max(0) as f32;
        let height = self.container.client_height().max(0) as f32;
        let dpr = self.frames.window.device_pixel_ratio() as f32;
        self.effect.resize(width, height, dpr, &mut self.frames);
    }

    fn pointer_position(&self, event: &PointerEvent) -> (f32, f32) {
        let rect = self.canvas.get_bounding_client_rect();
        (
            (f64::from(event.client_x()) - rect.left()) as f32,
            (f64::from(event.client_y()) - rect.top()) as f32,
        )
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.effect.teardown(&mut self.frames);
        if let Some(observer) = self.resize_observer.take() {
            observer.disconnect();
        }
        if let Some(observer) = self.intersection_observer.take() {
            observer.disconnect();
        }
        for (name, listener) in [
            ("pointermove", self.on_pointer_move.take()),
            ("pointerleave", self.on_pointer_leave.take()),
        ] {
            if let Some(listener) = listener {
                let _ = self
                    .container
                    .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
            }
        }
        self.on_resize = None;
        self.on_intersect = None;
        self.frames.callback.borrow_mut().take();
    }
}

impl<E: Effect> Drop for Host<E> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Run `f` on the host if it is still alive and not mid-callback.
fn with_host<E: Effect>(weak: &Weak<RefCell<Host<E>>>, f: impl FnOnce(&mut Host<E>)) {
    let Some(host) = weak.upgrade() else {
        return;
    };
    let Ok(mut host) = host.try_borrow_mut() else {
        return;
    };
    if !host.destroyed {
        f(&mut host);
    }
}

/// Wire `effect` to the page. An inert effect gets no observers and no loop.
fn mount<E: Effect>(
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    effect: E,
    track_pointer: bool,
) -> Result<Rc<RefCell<Host<E>>>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let inert = effect.is_inert();
    let host = Rc::new(RefCell::new(Host {
        effect,
        frames: WebFrames {
            window,
            callback: Rc::new(RefCell::new(None)),
        },
        container: container.clone(),
        canvas: canvas.clone(),
        resize_observer: None,
        intersection_observer: None,
        on_resize: None,
        on_intersect: None,
        on_pointer_move: None,
        on_pointer_leave: None,
        destroyed: false,
    }));
    if inert {
        tracing::debug!("no 2d context; effect not mounted");
        return Ok(host);
    }

    let weak = Rc::downgrade(&host);
    let on_frame = {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |now_ms: f64| {
            with_host(&weak, |host| {
                let Host { effect, frames, .. } = host;
                effect.tick(now_ms, frames);
            });
        }) as Box<dyn FnMut(f64)>)
    };

    let on_resize: ObserverCallback<ResizeObserver> = {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |_entries: Array, _observer: ResizeObserver| {
            with_host(&weak, Host::resize_to_container);
        }) as Box<dyn FnMut(Array, ResizeObserver)>)
    };

    let on_intersect: ObserverCallback<IntersectionObserver> = {
        let weak = weak.clone();
        Closure::wrap(Box::new(move |entries: Array, _observer: IntersectionObserver| {
            let Some(entry) = entries
                .iter()
                .last()
                .and_then(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
            else {
                return;
            };
            let visible = entry.is_intersecting();
            with_host(&weak, |host| {
                let Host { effect, frames, .. } = host;
                effect.visibility(visible, frames);
            });
        }) as Box<dyn FnMut(Array, IntersectionObserver)>)
    };

    let resize_observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())?;
    let intersection_observer = IntersectionObserver::new(on_intersect.as_ref().unchecked_ref())?;

    {
        let mut h = host.borrow_mut();
        *h.frames.callback.borrow_mut() = Some(on_frame);
        h.resize_to_container();
    }
    resize_observer.observe(&container);
    intersection_observer.observe(&canvas);

    if track_pointer {
        let on_move = {
            let weak = weak.clone();
            Closure::wrap(Box::new(move |event: PointerEvent| {
                with_host(&weak, |host| {
                    let position = host.pointer_position(&event);
                    let Host { effect, frames, .. } = host;
                    effect.pointer(Some(position), frames);
                });
            }) as Box<dyn FnMut(PointerEvent)>)
        };
        let on_leave = {
            let weak = weak.clone();
            Closure::wrap(Box::new(move |_event: PointerEvent| {
                with_host(&weak, |host| {
                    let Host { effect, frames, .. } = host;
                    effect.pointer(None, frames);
                });
            }) as Box<dyn FnMut(PointerEvent)>)
        };
        container
            .add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())?;
        container
            .add_event_listener_with_callback("pointerleave", on_leave.as_ref().unchecked_ref())?;
        let mut h = host.borrow_mut();
        h.on_pointer_move = Some(on_move);
        h.on_pointer_leave = Some(on_leave);
    }

    let mut h = host.borrow_mut();
    h.resize_observer = Some(resize_observer);
    h.intersection_observer = Some(intersection_observer);
    h.on_resize = Some(on_resize);
    h.on_intersect = Some(on_intersect);
    drop(h);
    Ok(host)
}

/// Flickering grid background bound to a container and its `<canvas>`.
#[wasm_bindgen]
pub struct FlickeringGridWeb {
    host: Rc<RefCell<Host<FlickeringGrid<Canvas2dSurface>>>>,
}

#[wasm_bindgen]
impl FlickeringGridWeb {
    /// Mount on `canvas` inside `container`.
    ///
    /// `options` accepts the component props (`squareSize`, `gridGap`,
    /// `flickerChance`, `color`, `width`, `height`, `maxOpacity`) plus
    /// `background`, `glowBlur` and `seed`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        canvas: HtmlCanvasElement,
        options: JsValue,
    ) -> Result<FlickeringGridWeb, JsValue> {
        let json = options_json(&options)?;
        let fallback_seed = options::seed_from_unit(js_sys::Math::random());
        let config = options::flicker_config(json.as_deref(), fallback_seed).map_err(to_js)?;
        let surface = Canvas2dSurface::new(canvas.clone());
        let grid = FlickeringGrid::new(config, surface).map_err(to_js)?;
        Ok(Self {
            host: mount(container, canvas, grid, false)?,
        })
    }

    /// Change the opacity bound; lit cells above it are clamped.
    #[wasm_bindgen(js_name = setMaxOpacity)]
    pub fn set_max_opacity(&mut self, max_opacity: f32) -> Result<(), JsValue> {
        self.host
            .borrow_mut()
            .effect
            .set_max_opacity(max_opacity)
            .map_err(to_js)
    }

    /// `true` when the canvas had no 2D context and nothing is drawn.
    #[wasm_bindgen(js_name = isInert)]
    pub fn is_inert(&self) -> bool {
        self.host.borrow().effect.is_inert()
    }

    /// Cancel the frame loop and disconnect every observer. Idempotent.
    pub fn destroy(&mut self) {
        self.host.borrow_mut().destroy();
    }
}

/// Cursor-reveal text grid bound to a container and its `<canvas>`.
#[wasm_bindgen]
pub struct RevealGridWeb {
    host: Rc<RefCell<Host<RevealGrid<Canvas2dSurface>>>>,
}

#[wasm_bindgen]
impl RevealGridWeb {
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        canvas: HtmlCanvasElement,
        options: JsValue,
    ) -> Result<RevealGridWeb, JsValue> {
        let json = options_json(&options)?;
        let config = options::reveal_config(json.as_deref()).map_err(to_js)?;
        let surface = Canvas2dSurface::new(canvas.clone());
        let grid = RevealGrid::new(config, surface).map_err(to_js)?;
        Ok(Self {
            host: mount(container, canvas, grid, true)?,
        })
    }

    #[wasm_bindgen(js_name = isInert)]
    pub fn is_inert(&self) -> bool {
        self.host.borrow().effect.is_inert()
    }

    pub fn destroy(&mut self) {
        self.host.borrow_mut().destroy();
    }
}
