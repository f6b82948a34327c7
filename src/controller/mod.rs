// CONTROLLER: input, camera controls and the per-frame update
pub mod camera_controller;
pub mod frame_loop;
pub mod input;
pub mod pointer_lock;

pub use camera_controller::CameraController;
pub use frame_loop::{FrameContext, FrameStats, HostRequest};
pub use input::{InputEvent, InputProcessor, InputState, MoveAction};
pub use pointer_lock::{LockState, PointerLockControls};
