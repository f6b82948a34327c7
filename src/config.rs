use glam::Vec3;

/// Scene parameters. Defaults reproduce the classic 500-cube drop.
///
/// Usage:
///   let config = SceneConfig::default();
///   // or, natively, honour CUBEFALL_BODIES / CUBEFALL_SEED:
///   let config = SceneConfig::default().with_env_overrides();
#[derive(Clone, Debug)]
pub struct SceneConfig {
    // Physics
    pub body_count: usize,
    pub gravity: f32,
    pub fixed_timestep: f32,
    pub box_half_extent: f32,
    pub box_mass: f32,
    pub spawn_base_height: f32,
    pub spawn_spacing: f32,
    /// Skip mesh sync and physics stepping while the pointer is released.
    pub pause_physics_when_unlocked: bool,

    // Camera & controls
    pub camera_start: Vec3,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub move_step: f32,
    pub vertical_step: f32,
    pub mouse_sensitivity: f32,

    // Look
    pub ground_size: f32,
    pub ground_color: u32,
    pub ambient_color: u32,
    pub point_light: PointLightConfig,
    /// Fixed seed for box colours; `None` draws from OS entropy.
    pub color_seed: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
pub struct PointLightConfig {
    pub color: u32,
    pub intensity: f32,
    pub range: f32,
    pub decay: f32,
    pub position: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            body_count: 500,
            gravity: -9.82,
            fixed_timestep: 1.0 / 60.0,
            box_half_extent: 1.0,
            box_mass: 1.0,
            spawn_base_height: 20.0,
            spawn_spacing: 4.0,
            pause_physics_when_unlocked: false,

            camera_start: Vec3::new(0.0, 10.0, 4.0),
            fov_y_degrees: 75.0,
            z_near: 0.1,
            z_far: 10_000.0,
            move_step: 2.0,
            vertical_step: 1.0,
            mouse_sensitivity: 0.002,

            ground_size: 20_000.0,
            ground_color: 0x1c1c2b,
            ambient_color: 0xededed,
            point_light: PointLightConfig {
                color: 0xffffff,
                intensity: 4.0,
                range: 100.0,
                decay: 0.2,
                position: Vec3::new(20.0, 20.0, 0.0),
            },
            color_seed: None,
        }
    }
}

impl SceneConfig {
    /// Apply `CUBEFALL_BODIES` and `CUBEFALL_SEED` when they are set and parse.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from("CUBEFALL_BODIES", "CUBEFALL_SEED")
    }

    fn with_overrides_from(mut self, bodies_var: &str, seed_var: &str) -> Self {
        if let Some(count) = env_parse::<usize>(bodies_var) {
            self.body_count = count;
        }
        if let Some(seed) = env_parse::<u64>(seed_var) {
            self.color_seed = Some(seed);
        }
        self
    }

    /// Spawn height of box `index`; spacing keeps boxes from overlapping at t=0.
    pub fn spawn_height(&self, index: usize) -> f32 {
        self.spawn_base_height + index as f32 * self.spawn_spacing
    }

    /// Visual box side, double the physics half-extent.
    pub fn box_side(&self) -> f32 {
        self.box_half_extent * 2.0
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

/// Physical key codes (DOM `KeyboardEvent.code` / winit `KeyCode` names)
/// bound to each movement action.
#[derive(Clone, Debug)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub release_pointer: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "KeyW".to_string(),
            backward: "KeyS".to_string(),
            left: "KeyA".to_string(),
            right: "KeyD".to_string(),
            up: "KeyQ".to_string(),
            down: "KeyE".to_string(),
            release_pointer: "Escape".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_heights_are_staggered() {
        let config = SceneConfig::default();
        assert_eq!(config.spawn_height(0), 20.0);
        assert_eq!(config.spawn_height(1), 24.0);
        assert_eq!(config.spawn_height(499), 20.0 + 499.0 * 4.0);
    }

    #[test]
    fn box_side_doubles_half_extent() {
        let config = SceneConfig::default();
        assert_eq!(config.box_side(), 2.0);
    }

    #[test]
    fn env_overrides_leave_defaults_when_unset() {
        // Variable names are unique to this test so parallel tests can't race on them.
        let parsed: Option<usize> = env_parse("CUBEFALL_TEST_UNSET_VARIABLE");
        assert!(parsed.is_none());
    }

    #[test]
    fn env_overrides_apply_valid_values() {
        std::env::set_var("CUBEFALL_TEST_VALID_BODIES", " 12 ");
        std::env::set_var("CUBEFALL_TEST_VALID_SEED", "99");
        let config = SceneConfig::default()
            .with_overrides_from("CUBEFALL_TEST_VALID_BODIES", "CUBEFALL_TEST_VALID_SEED");
        assert_eq!(config.body_count, 12);
        assert_eq!(config.color_seed, Some(99));
    }

    #[test]
    fn env_overrides_ignore_unparsable_values() {
        std::env::set_var("CUBEFALL_TEST_BAD_BODIES", "lots");
        std::env::set_var("CUBEFALL_TEST_BAD_SEED", "-3");
        let config = SceneConfig::default()
            .with_overrides_from("CUBEFALL_TEST_BAD_BODIES", "CUBEFALL_TEST_BAD_SEED");
        assert_eq!(config.body_count, 500);
        assert_eq!(config.color_seed, None);
    }
}
