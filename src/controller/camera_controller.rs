use glam::Vec3;

use crate::config::SceneConfig;
use crate::controller::input::{InputState, MoveAction};
use crate::controller::pointer_lock::PointerLockControls;
use crate::model::Camera;

/// Per-frame camera translation from held keys.
///
/// Horizontal moves are relative to look direction (fixed distance per frame,
/// not per second); up/down move straight along world Y whatever the camera faces.
pub struct CameraController {
    pub move_step: f32,
    pub vertical_step: f32,
}

impl CameraController {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            move_step: config.move_step,
            vertical_step: config.vertical_step,
        }
    }

    /// Does nothing unless `controls` is locked.
    pub fn update_movement(&self, camera: &mut Camera, controls: &PointerLockControls, input: &InputState) {
        if !controls.is_locked() {
            return;
        }

        if input.is_held(MoveAction::Left) {
            controls.move_right(camera, -self.move_step);
        }
        if input.is_held(MoveAction::Right) {
            controls.move_right(camera, self.move_step);
        }
        if input.is_held(MoveAction::Forward) {
            controls.move_forward(camera, self.move_step);
        }
        if input.is_held(MoveAction::Backward) {
            controls.move_forward(camera, -self.move_step);
        }
        if input.is_held(MoveAction::Up) {
            camera.eye += Vec3::Y * self.vertical_step;
        }
        if input.is_held(MoveAction::Down) {
            camera.eye -= Vec3::Y * self.vertical_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Camera, PointerLockControls, CameraController) {
        let config = SceneConfig::default();
        let mut controls = PointerLockControls::new(config.mouse_sensitivity);
        controls.lock();
        (Camera::new(&config, 800, 600), controls, CameraController::new(&config))
    }

    #[test]
    fn forward_moves_two_units_along_look_direction() {
        let (mut camera, controls, controller) = setup();
        camera.yaw = 0.6;
        camera.add_pitch(0.4);
        let start = camera.eye;
        let input = InputState { forward: true, ..InputState::default() };

        controller.update_movement(&mut camera, &controls, &input);

        let moved = camera.eye - start;
        assert!(moved.abs_diff_eq(camera.horizontal_forward() * 2.0, 1e-5));
        assert!((moved.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn strafing_is_perpendicular_to_forward() {
        let (mut camera, controls, controller) = setup();
        let start = camera.eye;
        let input = InputState { left: true, ..InputState::default() };

        controller.update_movement(&mut camera, &controls, &input);

        let moved = camera.eye - start;
        assert!(moved.abs_diff_eq(Vec3::new(-2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn up_raises_exactly_one_unit_regardless_of_look() {
        let (mut camera, controls, controller) = setup();
        camera.yaw = 2.1;
        camera.add_pitch(-1.0);
        let start = camera.eye;
        let input = InputState { up: true, ..InputState::default() };

        controller.update_movement(&mut camera, &controls, &input);

        assert_eq!(camera.eye, start + Vec3::Y);
    }

    #[test]
    fn opposite_keys_cancel() {
        let (mut camera, controls, controller) = setup();
        let start = camera.eye;
        let input = InputState { forward: true, backward: true, up: true, down: true, ..InputState::default() };

        controller.update_movement(&mut camera, &controls, &input);

        assert!(camera.eye.abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn unlocked_ignores_input() {
        let (mut camera, mut controls, controller) = setup();
        controls.unlock();
        let start = camera.eye;
        let input = InputState { forward: true, right: true, up: true, ..InputState::default() };

        controller.update_movement(&mut camera, &controls, &input);

        assert_eq!(camera.eye, start);
    }
}
