/// Platform-agnostic input handling
use crate::config::KeyBindings;

/// Platform-independent input events. Keys carry the physical key code
/// (`"KeyW"`, `"Escape"`), so bindings follow key position, not layout.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    MouseMove { dx: f32, dy: f32 },
    FocusLost,
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Which movement keys are held right now. Written by key events, polled once per frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, action: MoveAction, held: bool) {
        *self.flag_mut(action) = held;
    }

    pub fn is_held(&self, action: MoveAction) -> bool {
        match action {
            MoveAction::Forward => self.forward,
            MoveAction::Backward => self.backward,
            MoveAction::Left => self.left,
            MoveAction::Right => self.right,
            MoveAction::Up => self.up,
            MoveAction::Down => self.down,
        }
    }

    pub fn any_held(&self) -> bool {
        *self != Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn flag_mut(&mut self, action: MoveAction) -> &mut bool {
        match action {
            MoveAction::Forward => &mut self.forward,
            MoveAction::Backward => &mut self.backward,
            MoveAction::Left => &mut self.left,
            MoveAction::Right => &mut self.right,
            MoveAction::Up => &mut self.up,
            MoveAction::Down => &mut self.down,
        }
    }
}

/// Maps physical key codes to actions through [`KeyBindings`].
#[derive(Clone, Debug, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn action_for(&self, code: &str) -> Option<MoveAction> {
        let b = &self.bindings;
        [
            (&b.forward, MoveAction::Forward),
            (&b.backward, MoveAction::Backward),
            (&b.left, MoveAction::Left),
            (&b.right, MoveAction::Right),
            (&b.up, MoveAction::Up),
            (&b.down, MoveAction::Down),
        ]
        .into_iter()
        .find(|(key, _)| key.as_str() == code)
        .map(|(_, action)| action)
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_release_pointer(&self, code: &str) -> bool {
        code == self.bindings.release_pointer
    }

    /// Update the held flag for `code`. Unbound keys are ignored; returns whether it was bound.
    pub fn apply_key(&self, state: &mut InputState, code: &str, pressed: bool) -> bool {
        match self.action_for(code) {
            Some(action) => {
                state.set(action, pressed);
                true
            }
            None => false,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::InputEvent;
    use winit::event::{ElementState, KeyEvent};
    use winit::keyboard::PhysicalKey;

    /// winit's `KeyCode` debug names match DOM `KeyboardEvent.code` for the keys we bind.
    pub fn key_event_to_input(event: &KeyEvent) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return None;
        };
        let code = format!("{code:?}");
        Some(match event.state {
            ElementState::Pressed => InputEvent::KeyDown(code),
            ElementState::Released => InputEvent::KeyUp(code),
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::InputEvent;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        if is_down {
            InputEvent::KeyDown(e.code())
        } else {
            InputEvent::KeyUp(e.code())
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_all_six_actions() {
        let processor = InputProcessor::default();
        assert_eq!(processor.action_for("KeyW"), Some(MoveAction::Forward));
        assert_eq!(processor.action_for("KeyS"), Some(MoveAction::Backward));
        assert_eq!(processor.action_for("KeyA"), Some(MoveAction::Left));
        assert_eq!(processor.action_for("KeyD"), Some(MoveAction::Right));
        assert_eq!(processor.action_for("KeyQ"), Some(MoveAction::Up));
        assert_eq!(processor.action_for("KeyE"), Some(MoveAction::Down));
        assert!(processor.is_release_pointer("Escape"));
    }

    #[test]
    fn key_down_sets_and_key_up_clears() {
        let processor = InputProcessor::default();
        let mut state = InputState::new();
        assert!(processor.apply_key(&mut state, "KeyW", true));
        assert!(state.forward);
        assert!(processor.apply_key(&mut state, "KeyW", false));
        assert!(!state.forward);
    }

    #[test]
    fn flags_are_independent() {
        let processor = InputProcessor::default();
        let mut state = InputState::new();
        processor.apply_key(&mut state, "KeyA", true);
        processor.apply_key(&mut state, "KeyQ", true);
        processor.apply_key(&mut state, "KeyA", false);
        assert!(!state.left);
        assert!(state.up);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let processor = InputProcessor::default();
        let mut state = InputState::new();
        // Layout-dependent character names are not physical codes.
        assert!(!processor.apply_key(&mut state, "w", true));
        assert!(!processor.apply_key(&mut state, "Space", true));
        assert!(!state.any_held());
    }

    #[test]
    fn clear_releases_everything() {
        let mut state = InputState { forward: true, down: true, ..InputState::default() };
        state.clear();
        assert!(!state.any_held());
    }
}
