use crate::config::{KeyBindings, SceneConfig};
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{InputEvent, InputProcessor, InputState};
use crate::controller::pointer_lock::{LockState, PointerLockControls};
use crate::model::{Camera, PhysicsWorld, Scene};

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    None,
    /// Give the cursor back (the release key was pressed while locked).
    ReleasePointer,
}

/// Rolling frame-time average for the HUD.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameStats {
    pub frames: u64,
    pub fps: f32,
    window_frames: u32,
    window_time: f32,
}

impl FrameStats {
    pub fn record(&mut self, dt: f32) {
        self.frames += 1;
        self.window_frames += 1;
        self.window_time += dt;
        if self.window_time >= 0.5 {
            self.fps = self.window_frames as f32 / self.window_time;
            self.window_frames = 0;
            self.window_time = 0.0;
        }
    }
}

/// All per-frame state, owned by whichever driver runs the frame callback.
pub struct FrameContext {
    pub config: SceneConfig,
    pub camera: Camera,
    pub input: InputState,
    pub input_processor: InputProcessor,
    pub controls: PointerLockControls,
    pub camera_controller: CameraController,
    pub world: PhysicsWorld,
    pub scene: Scene,
    pub stats: FrameStats,
}

impl FrameContext {
    pub fn new(config: SceneConfig, bindings: KeyBindings, width: u32, height: u32) -> Self {
        let world = PhysicsWorld::new(&config);
        let scene = Scene::new(&config);
        Self {
            camera: Camera::new(&config, width, height),
            input: InputState::new(),
            input_processor: InputProcessor::new(bindings),
            controls: PointerLockControls::new(config.mouse_sensitivity),
            camera_controller: CameraController::new(&config),
            world,
            scene,
            stats: FrameStats::default(),
            config,
        }
    }

    /// Apply one host input event. Safe to call any number of times between frames.
    pub fn handle_event(&mut self, event: &InputEvent) -> HostRequest {
        match event {
            InputEvent::KeyDown(code) => {
                if self.input_processor.is_release_pointer(code) && self.controls.is_locked() {
                    return HostRequest::ReleasePointer;
                }
                self.input_processor.apply_key(&mut self.input, code, true);
            }
            InputEvent::KeyUp(code) => {
                self.input_processor.apply_key(&mut self.input, code, false);
            }
            InputEvent::MouseMove { dx, dy } => {
                self.controls.look(&mut self.camera, *dx, *dy);
            }
            InputEvent::FocusLost => {
                self.input.clear();
                if self.controls.unlock().is_some() {
                    return HostRequest::ReleasePointer;
                }
            }
            InputEvent::PointerLockChanged { locked } => {
                if let Some(LockState::Unlocked) = self.controls.set_locked(*locked) {
                    // Keys held through an unlock would otherwise stick.
                    self.input.clear();
                }
            }
        }
        HostRequest::None
    }

    /// One frame, minus rendering:
    ///  1. camera movement (locked only)
    ///  2. ground body -> ground mesh
    ///  3. box bodies -> box meshes
    ///  4. physics step
    ///
    /// Meshes get the pre-step transforms, so the picture trails the
    /// simulation by one step.
    pub fn update(&mut self, dt: f32) {
        self.stats.record(dt);

        let locked = self.controls.is_locked();
        if locked {
            self.camera_controller
                .update_movement(&mut self.camera, &self.controls, &self.input);
        } else if self.config.pause_physics_when_unlocked {
            return;
        }

        self.scene.sync_from(&self.world);
        self.world.step();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::physics_world::{ground_rotation, Transform};
    use glam::Vec3;

    fn context(bodies: usize) -> FrameContext {
        let config = SceneConfig { body_count: bodies, color_seed: Some(1), ..SceneConfig::default() };
        FrameContext::new(config, KeyBindings::default(), 800, 600)
    }

    fn locked_context(bodies: usize) -> FrameContext {
        let mut ctx = context(bodies);
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        ctx
    }

    #[test]
    fn meshes_trail_bodies_by_one_step() {
        let mut ctx = context(4);
        for _ in 0..20 {
            let before: Vec<Transform> = ctx.world.body_transforms().collect();
            ctx.update(1.0 / 60.0);
            for (i, mesh) in ctx.scene.boxes.iter().enumerate() {
                assert_eq!(mesh.transform, before[i]);
            }
        }
        // The world has moved on past what is displayed.
        assert!(ctx.world.body_transform(0).position.y < ctx.scene.boxes[0].transform.position.y);
    }

    #[test]
    fn ground_mesh_keeps_fixed_orientation() {
        let mut ctx = context(2);
        for _ in 0..10 {
            ctx.update(1.0 / 60.0);
            assert!(ctx.scene.ground.transform.rotation.abs_diff_eq(ground_rotation(), 1e-6));
        }
    }

    #[test]
    fn paused_world_still_shows_flat_ground() {
        let config = SceneConfig { body_count: 1, pause_physics_when_unlocked: true, ..SceneConfig::default() };
        let mut ctx = FrameContext::new(config, KeyBindings::default(), 800, 600);
        assert!(ctx.scene.ground.transform.rotation.abs_diff_eq(ground_rotation(), 1e-6));
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.world.steps(), 0);
        assert!(ctx.scene.ground.transform.rotation.abs_diff_eq(ground_rotation(), 1e-6));
    }

    #[test]
    fn physics_runs_while_unlocked() {
        let mut ctx = context(1);
        ctx.update(1.0 / 60.0);
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.world.steps(), 2);
        assert!(ctx.scene.boxes[0].transform.position.y < 20.0);
    }

    #[test]
    fn pause_option_freezes_world_while_unlocked() {
        let config = SceneConfig { body_count: 1, pause_physics_when_unlocked: true, ..SceneConfig::default() };
        let mut ctx = FrameContext::new(config, KeyBindings::default(), 800, 600);
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.world.steps(), 0);
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.world.steps(), 1);
    }

    #[test]
    fn held_forward_moves_camera_each_frame() {
        let mut ctx = locked_context(0);
        let start = ctx.camera.eye;
        ctx.handle_event(&InputEvent::KeyDown("KeyW".into()));
        ctx.update(1.0 / 60.0);
        ctx.update(1.0 / 60.0);
        assert!(ctx.camera.eye.abs_diff_eq(start + Vec3::NEG_Z * 4.0, 1e-4));
    }

    #[test]
    fn key_released_before_tick_gives_no_movement() {
        let mut ctx = locked_context(0);
        let start = ctx.camera.eye;
        ctx.handle_event(&InputEvent::KeyDown("KeyD".into()));
        ctx.handle_event(&InputEvent::KeyUp("KeyD".into()));
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.camera.eye, start);
    }

    #[test]
    fn relock_without_keys_leaves_camera_in_place() {
        let mut ctx = locked_context(0);
        let start = ctx.camera.eye;
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: false });
        ctx.update(1.0 / 60.0);
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.camera.eye, start);
    }

    #[test]
    fn unlocked_camera_ignores_keys_and_mouse() {
        let mut ctx = context(0);
        let (eye, yaw) = (ctx.camera.eye, ctx.camera.yaw);
        ctx.handle_event(&InputEvent::KeyDown("KeyW".into()));
        ctx.handle_event(&InputEvent::MouseMove { dx: 40.0, dy: 10.0 });
        ctx.update(1.0 / 60.0);
        assert_eq!(ctx.camera.eye, eye);
        assert_eq!(ctx.camera.yaw, yaw);
    }

    #[test]
    fn escape_asks_host_to_release_only_when_locked() {
        let mut ctx = context(0);
        assert_eq!(ctx.handle_event(&InputEvent::KeyDown("Escape".into())), HostRequest::None);
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        assert_eq!(
            ctx.handle_event(&InputEvent::KeyDown("Escape".into())),
            HostRequest::ReleasePointer
        );
    }

    #[test]
    fn focus_loss_unlocks_and_clears_keys() {
        let mut ctx = locked_context(0);
        ctx.handle_event(&InputEvent::KeyDown("KeyQ".into()));
        assert_eq!(ctx.handle_event(&InputEvent::FocusLost), HostRequest::ReleasePointer);
        assert!(!ctx.input.any_held());
        assert!(ctx.controls.overlay_visible());
    }

    #[test]
    fn stats_average_over_half_a_second() {
        let mut stats = FrameStats::default();
        for _ in 0..40 {
            stats.record(1.0 / 60.0);
        }
        assert_eq!(stats.frames, 40);
        assert!((stats.fps - 60.0).abs() < 1.0);
    }
}
