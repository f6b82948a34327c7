use crate::model::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

/// First-person controls over a camera, live only while the pointer is captured.
///
/// The host (winit cursor grab, DOM pointer lock) does the capturing and
/// reports the outcome; this tracks the resulting state and the overlay that
/// goes with it.
pub struct PointerLockControls {
    state: LockState,
    overlay_visible: bool,
    sensitivity: f32,
}

impl PointerLockControls {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            state: LockState::Unlocked,
            overlay_visible: true,
            sensitivity,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn lock(&mut self) -> Option<LockState> {
        self.transition(LockState::Locked)
    }

    pub fn unlock(&mut self) -> Option<LockState> {
        self.transition(LockState::Unlocked)
    }

    pub fn set_locked(&mut self, locked: bool) -> Option<LockState> {
        if locked {
            self.lock()
        } else {
            self.unlock()
        }
    }

    /// Returns the new state, or `None` if already there.
    fn transition(&mut self, next: LockState) -> Option<LockState> {
        if next == self.state {
            return None;
        }
        self.state = next;
        match next {
            LockState::Locked => self.on_lock(),
            LockState::Unlocked => self.on_unlock(),
        }
        Some(next)
    }

    fn on_lock(&mut self) {
        self.overlay_visible = false;
        tracing::info!("pointer locked");
    }

    fn on_unlock(&mut self) {
        self.overlay_visible = true;
        tracing::info!("pointer unlocked");
    }

    /// Mouse look from relative pointer deltas (pixels).
    pub fn look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        if !self.is_locked() {
            return;
        }
        camera.yaw += dx * self.sensitivity;
        camera.add_pitch(-dy * self.sensitivity);
    }

    /// Move along the horizontal look direction; pitch has no effect.
    pub fn move_forward(&self, camera: &mut Camera, distance: f32) {
        camera.eye += camera.horizontal_forward() * distance;
    }

    pub fn move_right(&self, camera: &mut Camera, distance: f32) {
        camera.eye += camera.right() * distance;
    }
}
