//! Rigid-body world: one fixed ground half-space and N dynamic unit boxes,
//! all integration and contact resolution delegated to rapier.

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::config::SceneConfig;

/// Position and orientation of a body or mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

impl From<&Isometry<Real>> for Transform {
    fn from(iso: &Isometry<Real>) -> Self {
        let t = iso.translation.vector;
        // nalgebra stores quaternion coords as (i, j, k, w)
        let q = iso.rotation.coords;
        Self {
            position: Vec3::new(t.x, t.y, t.z),
            rotation: Quat::from_xyzw(q.x, q.y, q.z, q.w),
        }
    }
}

/// Orientation that turns the ground's local +Z normal into world +Y.
pub fn ground_rotation() -> Quat {
    Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    ground: RigidBodyHandle,
    /// Index-aligned with the scene's box meshes.
    boxes: Vec<RigidBodyHandle>,
    steps: u64,
}

impl PhysicsWorld {
    pub fn new(config: &SceneConfig) -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        // Plane normal is local +Z; the -90 degree X rotation points it up.
        let ground = rigid_body_set.insert(
            RigidBodyBuilder::fixed()
                .rotation(vector![-std::f32::consts::FRAC_PI_2, 0.0, 0.0])
                .build(),
        );
        collider_set.insert_with_parent(
            ColliderBuilder::halfspace(Vector::z_axis()).build(),
            ground,
            &mut rigid_body_set,
        );

        let h = config.box_half_extent;
        let boxes = (0..config.body_count)
            .map(|i| {
                let handle = rigid_body_set.insert(
                    RigidBodyBuilder::dynamic()
                        .translation(vector![0.0, config.spawn_height(i), 0.0])
                        .build(),
                );
                collider_set.insert_with_parent(
                    ColliderBuilder::cuboid(h, h, h).mass(config.box_mass).build(),
                    handle,
                    &mut rigid_body_set,
                );
                handle
            })
            .collect::<Vec<_>>();

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_timestep;

        tracing::info!(
            bodies = boxes.len(),
            dt = config.fixed_timestep,
            gravity = config.gravity,
            "physics world built"
        );

        Self {
            gravity: vector![0.0, config.gravity, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            ground,
            boxes,
            steps: 0,
        }
    }

    /// Advance every body by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.steps += 1;
    }

    pub fn body_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn ground_transform(&self) -> Transform {
        Transform::from(self.rigid_body_set[self.ground].position())
    }

    /// Panics if `index` is out of range, like slice indexing.
    pub fn body_transform(&self, index: usize) -> Transform {
        Transform::from(self.rigid_body_set[self.boxes[index]].position())
    }

    pub fn body_transforms(&self) -> impl Iterator<Item = Transform> + '_ {
        self.boxes
            .iter()
            .map(|&handle| Transform::from(self.rigid_body_set[handle].position()))
    }

    pub fn body_linvel(&self, index: usize) -> Vec3 {
        let v = self.rigid_body_set[self.boxes[index]].linvel();
        Vec3::new(v.x, v.y, v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(bodies: usize) -> SceneConfig {
        SceneConfig { body_count: bodies, ..SceneConfig::default() }
    }

    #[test]
    fn boxes_spawn_at_staggered_heights() {
        let world = PhysicsWorld::new(&config_with(5));
        assert_eq!(world.body_count(), 5);
        for i in 0..5 {
            let t = world.body_transform(i);
            assert_eq!(t.position, Vec3::new(0.0, 20.0 + i as f32 * 4.0, 0.0));
            assert!(t.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn one_step_from_rest_applies_gravity_to_velocity() {
        let config = config_with(3);
        let mut world = PhysicsWorld::new(&config);
        world.step();
        let expected = config.gravity * config.fixed_timestep;
        for i in 0..3 {
            let v = world.body_linvel(i);
            assert!((v.y - expected).abs() < 1e-3, "body {i}: vy {} vs {}", v.y, expected);
            assert!(v.x.abs() < 1e-6 && v.z.abs() < 1e-6);
        }
    }

    #[test]
    fn ground_is_static_and_horizontal() {
        let mut world = PhysicsWorld::new(&config_with(2));
        for _ in 0..30 {
            world.step();
        }
        let ground = world.ground_transform();
        assert_eq!(ground.position, Vec3::ZERO);
        assert!(ground.rotation.abs_diff_eq(ground_rotation(), 1e-6));
        assert!((ground.rotation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn a_dropped_box_comes_to_rest_on_the_ground() {
        let mut world = PhysicsWorld::new(&config_with(1));
        for _ in 0..600 {
            world.step();
        }
        let y = world.body_transform(0).position.y;
        assert!((y - 1.0).abs() < 0.1, "box resting at y = {y}");
        assert_eq!(world.steps(), 600);
    }

    #[test]
    fn empty_world_steps() {
        let mut world = PhysicsWorld::new(&config_with(0));
        world.step();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.body_transforms().count(), 0);
    }
}
