pub mod config;
pub mod error;
pub mod logging;
pub mod ui;
pub mod utils;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

#[cfg(target_arch = "wasm32")]
use crate::{
    config::{KeyBindings, SceneConfig},
    controller::{input, FrameContext, HostRequest, InputEvent},
    error::{AppError, Result},
    view::{GpuContext, RenderState, UiFrame},
};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> std::result::Result<(), JsValue> {
    logging::init();

    let started = match init_canvas() {
        Ok((window, document, canvas)) => setup_app(&window, &document, &canvas).await,
        Err(e) => Err(e),
    };
    started.map_err(|e| {
        tracing::error!("startup failed: {e}");
        JsValue::from_str(&e.to_string())
    })
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(window: &Window, document: &Document, canvas: &HtmlCanvasElement) -> Result<()> {
    let (width, height) = viewport_size(window);
    canvas.set_width(width);
    canvas.set_height(height);

    let gpu = GpuContext::new(canvas, width, height).await?;

    let config = SceneConfig::default();
    tracing::info!(bodies = config.body_count, "building scene");
    let frame = Rc::new(RefCell::new(FrameContext::new(
        config,
        KeyBindings::default(),
        gpu.config.width,
        gpu.config.height,
    )));
    let mut render_state = RenderState::new(gpu.device.as_ref(), &gpu.config, &frame.borrow().scene);
    let egui_ctx = egui::Context::default();

    setup_input_listeners(document, window, canvas, frame.clone())?;

    let mut last_time: Option<f64> = None;
    let window_for_loop = window.clone();
    let canvas = canvas.clone();

    // Continuous redraw using requestAnimationFrame
    AnimationLoop::new(window.clone(), move |now: f64| {
        let dt = last_time.map(|t| ((now - t) / 1000.0) as f32).unwrap_or(0.0);
        last_time = Some(now);

        // Track the browser viewport; the canvas backing store follows it in device pixels.
        let (width, height) = viewport_size(&window_for_loop);
        if (width, height) != render_state.size() {
            canvas.set_width(width);
            canvas.set_height(height);
            render_state.resize(gpu.device.as_ref(), &gpu.surface, width, height);
            frame.borrow_mut().resize(width, height);
        }

        let mut frame = frame.borrow_mut();
        frame.update(dt);

        let pixels_per_point = window_for_loop.device_pixel_ratio() as f32;
        let mut raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width as f32 / pixels_per_point, height as f32 / pixels_per_point),
            )),
            time: Some(now / 1000.0),
            ..Default::default()
        };
        raw_input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(pixels_per_point);

        let output = ui::build_ui(&egui_ctx, raw_input, &frame);
        let primitives = egui_ctx.tessellate(output.shapes, output.pixels_per_point);

        render_state.prepare(gpu.queue.as_ref(), &frame.scene, &frame.camera);
        render_state.draw_frame(
            gpu.device.as_ref(),
            gpu.queue.as_ref(),
            &gpu.surface,
            UiFrame {
                primitives,
                textures_delta: output.textures_delta,
                pixels_per_point: output.pixels_per_point,
            },
        )
    })
    .start()
}

/// Apply an event and carry out whatever the frame context asks of the page.
#[cfg(target_arch = "wasm32")]
fn dispatch(frame: &RefCell<FrameContext>, document: &Document, event: InputEvent) {
    let request = frame.borrow_mut().handle_event(&event);
    if request == HostRequest::ReleasePointer {
        document.exit_pointer_lock();
    }
}

/// Setup all input event listeners
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    frame: Rc<RefCell<FrameContext>>,
) -> Result<()> {
    // Keyboard down
    {
        let frame = frame.clone();
        let doc = document.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            // Keep bound keys from scrolling the page
            if frame.borrow().input_processor.action_for(&e.code()).is_some() {
                e.prevent_default();
            }
            dispatch(&frame, &doc, input::wasm::keyboard_event_to_input(&e, true));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let frame = frame.clone();
        let doc = document.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            dispatch(&frame, &doc, input::wasm::keyboard_event_to_input(&e, false));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Canvas click to enter pointer lock
    {
        let canvas_click = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            canvas_click.request_pointer_lock();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Pointer lock change; the browser may also release on its own (Escape, tab switch)
    {
        let frame = frame.clone();
        let doc = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc.pointer_lock_element().is_some();
            dispatch(&frame, &doc, InputEvent::PointerLockChanged { locked });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    {
        let plerr = Closure::wrap(Box::new(move |_e: Event| {
            tracing::warn!("pointer lock request was refused");
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockerror", plerr.as_ref().unchecked_ref())?;
        plerr.forget();
    }

    // Mouse move
    {
        let frame = frame.clone();
        let doc = document.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            dispatch(&frame, &doc, input::wasm::mouse_move_to_input(&e));
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Focus loss - clear all keys
    {
        let frame = frame.clone();
        let doc = document.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            dispatch(&frame, &doc, InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - same as focus loss when hidden
    {
        let frame = frame.clone();
        let doc = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            if doc.hidden() {
                dispatch(&frame, &doc, InputEvent::FocusLost);
            }
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement)> {
    let window = web_sys::window().ok_or_else(|| AppError::Page("no global `window`".into()))?;
    let document = window.document().ok_or_else(|| AppError::Page("no document on window".into()))?;
    let body = document.body().ok_or_else(|| AppError::Page("no body on document".into()))?;
    body.set_attribute("style", "margin:0;overflow:hidden")?;

    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| AppError::Page("failed to create canvas".into()))?;
    canvas.set_attribute("style", "display:block;width:100vw;height:100vh")?;
    body.append_child(&canvas)?;
    Ok((window, document, canvas))
}

/// Viewport size in device pixels.
#[cfg(target_arch = "wasm32")]
fn viewport_size(window: &Window) -> (u32, u32) {
    let dpr = window.device_pixel_ratio();
    let css = |v: std::result::Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    let width = (css(window.inner_width()) * dpr).round().max(1.0) as u32;
    let height = (css(window.inner_height()) * dpr).round().max(1.0) as u32;
    (width, height)
}

#[cfg(target_arch = "wasm32")]
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// requestAnimationFrame loop. Stops rescheduling after the first failed frame.
#[cfg(target_arch = "wasm32")]
struct AnimationLoop {
    inner: Rc<RefCell<Box<dyn FnMut(f64) -> Result<()>>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl AnimationLoop {
    fn new(window: Window, f: impl FnMut(f64) -> Result<()> + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<()> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            if let Err(e) = inner.borrow_mut().as_mut()(now) {
                tracing::error!("frame loop stopped: {e}");
                return;
            }

            // Recursively schedule next frame
            if let Err(e) = request_frame(&window, &callback_clone) {
                tracing::error!("frame loop stopped: {e}");
            }
        }) as Box<dyn FnMut(f64)>));

        // The closure holds its own handle, so it outlives this function.
        request_frame(&self.window, &callback)
    }
}

#[cfg(target_arch = "wasm32")]
fn request_frame(window: &Window, callback: &FrameCallback) -> Result<()> {
    if let Some(cb) = callback.borrow().as_ref() {
        window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    Ok(())
}
