use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SceneConfig;
use crate::model::physics_world::{ground_rotation, PhysicsWorld, Transform};
use crate::utils::hex_to_linear_rgba;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Cube with the given side length.
    Box { side: f32 },
    /// Square of the given size in the local XY plane.
    Plane { size: f32 },
}

/// A drawable: geometry, linear RGBA colour and the transform mirrored from its body.
#[derive(Clone, Debug)]
pub struct MeshInstance {
    pub geometry: Geometry,
    pub color: [f32; 4],
    pub transform: Transform,
}

#[derive(Clone, Copy, Debug)]
pub struct AmbientLight {
    pub color: [f32; 4],
}

#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub color: [f32; 4],
    pub intensity: f32,
    pub range: f32,
    pub decay: f32,
    pub position: Vec3,
}

/// Everything the renderer draws. Box `i` mirrors physics body `i`.
pub struct Scene {
    pub ground: MeshInstance,
    pub boxes: Vec<MeshInstance>,
    pub ambient: AmbientLight,
    pub point_light: PointLight,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        let mut rng = match config.color_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let side = config.box_side();
        let boxes = (0..config.body_count)
            .map(|i| MeshInstance {
                geometry: Geometry::Box { side },
                color: hex_to_linear_rgba(rng.gen_range(0..0xffffff)),
                transform: Transform {
                    position: Vec3::new(0.0, config.spawn_height(i), 0.0),
                    rotation: glam::Quat::IDENTITY,
                },
            })
            .collect();

        let light = config.point_light;
        Self {
            ground: MeshInstance {
                geometry: Geometry::Plane { size: config.ground_size },
                color: hex_to_linear_rgba(config.ground_color),
                transform: Transform { position: Vec3::ZERO, rotation: ground_rotation() },
            },
            boxes,
            ambient: AmbientLight { color: hex_to_linear_rgba(config.ambient_color) },
            point_light: PointLight {
                color: hex_to_linear_rgba(light.color),
                intensity: light.intensity,
                range: light.range,
                decay: light.decay,
                position: light.position,
            },
        }
    }

    /// Copy the ground transform, then every box transform, from the physics world.
    pub fn sync_from(&mut self, world: &PhysicsWorld) {
        debug_assert_eq!(self.boxes.len(), world.body_count());
        self.ground.transform = world.ground_transform();
        for (mesh, transform) in self.boxes.iter_mut().zip(world.body_transforms()) {
            mesh.transform = transform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SceneConfig {
        SceneConfig { body_count: 8, color_seed: Some(7), ..SceneConfig::default() }
    }

    #[test]
    fn one_mesh_per_body() {
        let config = config();
        let scene = Scene::new(&config);
        let world = PhysicsWorld::new(&config);
        assert_eq!(scene.boxes.len(), world.body_count());
        assert!(scene
            .boxes
            .iter()
            .all(|m| m.geometry == Geometry::Box { side: 2.0 }));
    }

    #[test]
    fn ground_lies_flat_before_any_sync() {
        let scene = Scene::new(&config());
        assert_eq!(scene.ground.transform.position, Vec3::ZERO);
        assert!(scene.ground.transform.rotation.abs_diff_eq(ground_rotation(), 1e-6));
    }

    #[test]
    fn seeded_colors_are_reproducible() {
        let a = Scene::new(&config());
        let b = Scene::new(&config());
        for (x, y) in a.boxes.iter().zip(&b.boxes) {
            assert_eq!(x.color, y.color);
        }
    }

    #[test]
    fn sync_mirrors_every_body() {
        let config = config();
        let mut scene = Scene::new(&config);
        let mut world = PhysicsWorld::new(&config);
        for _ in 0..10 {
            world.step();
        }
        scene.sync_from(&world);
        assert!(scene.ground.transform.rotation.abs_diff_eq(ground_rotation(), 1e-6));
        for (i, mesh) in scene.boxes.iter().enumerate() {
            assert_eq!(mesh.transform, world.body_transform(i));
        }
    }
}
