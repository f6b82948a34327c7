// MODEL: simulation and scene data
pub mod camera;
pub mod physics_world;
pub mod scene;

pub use camera::Camera;
pub use physics_world::{PhysicsWorld, Transform};
pub use scene::{Geometry, MeshInstance, Scene};
