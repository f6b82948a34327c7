use std::sync::Arc;
use std::time::Instant;

use winit::{
    event::*,
    event_loop::EventLoop,
    window::{CursorGrabMode, Window},
};

use cubefall::config::{KeyBindings, SceneConfig};
use cubefall::controller::input::native::key_event_to_input;
use cubefall::controller::{FrameContext, HostRequest, InputEvent};
use cubefall::error::Result;
use cubefall::view::{GpuContext, RenderState, UiFrame};
use cubefall::{logging, ui};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,

    frame: FrameContext,
    last_frame_time: Instant,
}

impl App {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new_native(window.clone(), size.width, size.height).await?;

        let config = SceneConfig::default().with_env_overrides();
        tracing::info!(bodies = config.body_count, seed = ?config.color_seed, "building scene");
        let frame = FrameContext::new(config, KeyBindings::default(), gpu.config.width, gpu.config.height);
        let render_state = RenderState::new(gpu.device.as_ref(), &gpu.config, &frame.scene);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            render_state,
            egui_ctx,
            egui_state,
            frame,
            last_frame_time: Instant::now(),
        })
    }

    /// Capture the cursor. Not every platform supports `Locked`, so fall back to `Confined`.
    fn grab_pointer(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("cursor grab unavailable: {e}");
            return;
        }
        self.window.set_cursor_visible(false);
        self.frame.handle_event(&InputEvent::PointerLockChanged { locked: true });
    }

    fn release_pointer(&mut self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("cursor release failed: {e}");
        }
        self.window.set_cursor_visible(true);
        self.frame.handle_event(&InputEvent::PointerLockChanged { locked: false });
    }

    fn dispatch(&mut self, event: InputEvent) {
        if self.frame.handle_event(&event) == HostRequest::ReleasePointer {
            self.release_pointer();
        }
    }

    fn input(&mut self, event: &WindowEvent) {
        // egui only needs to see events; the overlay has no widgets to capture them
        let _ = self.egui_state.on_window_event(self.window.as_ref(), event);

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = key_event_to_input(event) {
                    self.dispatch(input);
                }
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if !self.frame.controls.is_locked() {
                    self.grab_pointer();
                }
            }
            WindowEvent::Focused(false) => self.dispatch(InputEvent::FocusLost),
            _ => {}
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.render_state
            .resize(self.gpu.device.as_ref(), &self.gpu.surface, new_size.width, new_size.height);
        self.frame.resize(new_size.width, new_size.height);
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.frame.update(dt);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, &self.frame);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);

        self.render_state
            .prepare(self.gpu.queue.as_ref(), &self.frame.scene, &self.frame.camera);
        self.render_state.draw_frame(
            self.gpu.device.as_ref(),
            self.gpu.queue.as_ref(),
            &self.gpu.surface,
            UiFrame {
                primitives,
                textures_delta: output.textures_delta,
                pixels_per_point: output.pixels_per_point,
            },
        )
    }
}

#[allow(deprecated)]
fn run() -> Result<()> {
    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("cubefall")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
            app.input(event);
            match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                WindowEvent::RedrawRequested => match app.redraw() {
                    Ok(()) => {}
                    Err(e) => {
                        tracing::error!("render failed, exiting: {e}");
                        elwt.exit();
                    }
                },
                _ => {}
            }
        }
        Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
            app.dispatch(InputEvent::MouseMove { dx: delta.0 as f32, dy: delta.1 as f32 });
        }
        Event::AboutToWait => app.window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
