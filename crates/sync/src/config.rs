use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tumble_physics::{PhysicsError, RigidBody, WorldConfig};
use tumble_scene::RenderView;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Material parameters applied to a freshly created body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BodyTemplate {
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub rolling_friction: f32,
}

impl Default for BodyTemplate {
    fn default() -> Self {
        Self {
            mass: 1.0,
            restitution: 0.0,
            friction: 0.5,
            rolling_friction: 0.0,
        }
    }
}

impl BodyTemplate {
    pub fn new(mass: f32, restitution: f32, friction: f32, rolling_friction: f32) -> Self {
        Self {
            mass,
            restitution,
            friction,
            rolling_friction,
        }
    }

    /// Copy the coefficients onto `body`. Mass is fixed at creation and not touched.
    pub fn apply(&self, body: &mut RigidBody) -> Result<(), PhysicsError> {
        body.set_restitution(self.restitution)?;
        body.set_friction(self.friction)?;
        body.set_rolling_friction(self.rolling_friction)?;
        Ok(())
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{section}.mass must be finite and non-negative, got {}",
                self.mass
            )));
        }
        for (name, value) in [
            ("restitution", self.restitution),
            ("friction", self.friction),
            ("rolling_friction", self.rolling_friction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{section}.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The static ground box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundConfig {
    /// Full edge lengths.
    pub size: Vec3,
    /// Center of the box.
    pub position: Vec3,
    pub restitution: f32,
    pub friction: f32,
    /// 0xRRGGBB.
    pub color: u32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: Vec3::new(100.0, 1.0, 100.0),
            position: Vec3::ZERO,
            restitution: 0.99,
            friction: 0.5,
            color: 0xff0000,
        }
    }
}

impl GroundConfig {
    /// World-space height of the ground's upper face.
    pub fn top(&self) -> f32 {
        self.position.y + self.size.y * 0.5
    }

    /// The mass-0 body for this ground.
    pub fn body(&self) -> Result<RigidBody, PhysicsError> {
        let mut body = RigidBody::create_box(0.0, self.position, Quat::IDENTITY, self.size)?;
        body.set_restitution(self.restitution)?;
        body.set_friction(self.friction)?;
        Ok(body)
    }
}

/// The initial grid of falling spheres and boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub enabled: bool,
    pub seed: u64,
    /// Grid cells run over `grid_min..grid_max` on both horizontal axes.
    pub grid_min: i32,
    pub grid_max: i32,
    pub spacing: f32,
    pub drop_height: f32,
    /// Each object starts at `drop_height + rand(0, drop_jitter)`.
    pub drop_jitter: f32,
    pub sphere_radius: f32,
    /// Edge length of the layout boxes.
    pub box_size: f32,
    pub sphere: BodyTemplate,
    #[serde(rename = "box")]
    pub cube: BodyTemplate,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 42,
            grid_min: -4,
            grid_max: 4,
            spacing: 10.0,
            drop_height: 40.0,
            drop_jitter: 20.0,
            sphere_radius: 4.0,
            box_size: 6.0,
            sphere: BodyTemplate::new(1.0, 0.5, 1.0, 1.0),
            cube: BodyTemplate::new(1.0, 0.25, 100.0, 500.0),
        }
    }
}

impl LayoutConfig {
    /// Number of objects the layout creates.
    pub fn object_count(&self) -> usize {
        if !self.enabled || self.grid_max <= self.grid_min {
            return 0;
        }
        let side = (self.grid_max - self.grid_min) as usize;
        side * side
    }
}

/// Periodic spawning of random boxes from above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnerConfig {
    pub enabled: bool,
    /// Seconds before the first spawn.
    pub initial_delay: f32,
    /// Seconds between spawns.
    pub interval: f32,
    pub max_count: u32,
    pub height: f32,
    /// Horizontal spawn offsets are drawn from `[-spread, spread)`.
    pub spread: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub seed: u64,
    pub body: BodyTemplate,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: 1.0,
            interval: 0.25,
            max_count: 1000,
            height: 200.0,
            spread: 1.0,
            min_size: 4.0,
            max_size: 8.0,
            seed: 7,
            body: BodyTemplate::new(300.0, 0.125, 1.0, 5.0),
        }
    }
}

/// Everything needed to build an [`AppContext`](crate::AppContext).
///
/// Every section is optional; missing keys take the defaults of the
/// falling-objects demo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub world: WorldConfig,
    pub ground: GroundConfig,
    pub layout: LayoutConfig,
    pub spawner: SpawnerConfig,
    pub view: RenderView,
}

impl SceneConfig {
    /// Load and validate a config file. The format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let data = std::fs::read_to_string(path)?;
        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&data)?,
            "json" => Self::from_json_str(&data)?,
            _ => return Err(ConfigError::UnsupportedFormat(ext)),
        };
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("world: {e}")))?;

        let g = &self.ground;
        if !g.size.is_finite() || g.size.min_element() <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ground.size must be positive on every axis, got {}",
                g.size
            )));
        }
        if !g.position.is_finite() {
            return Err(ConfigError::Invalid("ground.position must be finite".into()));
        }
        BodyTemplate::new(0.0, g.restitution, g.friction, 0.0).validate("ground")?;

        let l = &self.layout;
        if l.enabled {
            if l.grid_max < l.grid_min {
                return Err(ConfigError::Invalid(format!(
                    "layout.grid_min ({}) must not exceed layout.grid_max ({})",
                    l.grid_min, l.grid_max
                )));
            }
            for (name, value) in [
                ("spacing", l.spacing),
                ("sphere_radius", l.sphere_radius),
                ("box_size", l.box_size),
            ] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "layout.{name} must be positive, got {value}"
                    )));
                }
            }
            if !l.drop_height.is_finite() || !l.drop_jitter.is_finite() || l.drop_jitter < 0.0 {
                return Err(ConfigError::Invalid(
                    "layout.drop_height must be finite and layout.drop_jitter non-negative".into(),
                ));
            }
            l.sphere.validate("layout.sphere")?;
            l.cube.validate("layout.box")?;
        }

        let s = &self.spawner;
        if s.enabled {
            if !s.interval.is_finite() || s.interval <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "spawner.interval must be positive, got {}",
                    s.interval
                )));
            }
            if !s.initial_delay.is_finite() || s.initial_delay < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "spawner.initial_delay must be non-negative, got {}",
                    s.initial_delay
                )));
            }
            if !(s.min_size > 0.0 && s.min_size <= s.max_size && s.max_size.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "spawner sizes need 0 < min_size <= max_size, got {}..{}",
                    s.min_size, s.max_size
                )));
            }
            if !s.height.is_finite() || !s.spread.is_finite() || s.spread < 0.0 {
                return Err(ConfigError::Invalid(
                    "spawner.height must be finite and spawner.spread non-negative".into(),
                ));
            }
            s.body.validate("spawner.body")?;
        }

        if !(self.view.fov_degrees > 0.0 && self.view.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "view.fov_degrees must be in (0, 180), got {}",
                self.view.fov_degrees
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_demo_scene() {
        let c = SceneConfig::default();
        assert_eq!(c.world.gravity, Vec3::new(0.0, -100.0, 0.0));
        assert_eq!(c.world.max_sub_steps, 10);
        assert_eq!(c.ground.size, Vec3::new(100.0, 1.0, 100.0));
        assert_eq!(c.ground.restitution, 0.99);
        assert_eq!(c.layout.object_count(), 64);
        assert_eq!(c.spawner.max_count, 1000);
        assert_eq!(c.spawner.body.mass, 300.0);
        assert_eq!(c.view.fov_degrees, 60.0);
        c.validate().unwrap();
    }

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(SceneConfig::from_yaml_str("{}").unwrap(), SceneConfig::default());
        assert_eq!(SceneConfig::from_json_str("{}").unwrap(), SceneConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_only_named_keys() {
        let yaml = "\
world:
  gravity: [0.0, -9.81, 0.0]
  max_sub_steps: 4
layout:
  enabled: false
spawner:
  max_count: 3
  box:
    mass: 2.0
";
        // `box` belongs to layout, not spawner: rejected.
        assert!(matches!(
            SceneConfig::from_yaml_str(yaml),
            Err(ConfigError::Yaml(_))
        ));

        let yaml = "\
world:
  gravity: [0.0, -9.81, 0.0]
  max_sub_steps: 4
layout:
  enabled: false
  box:
    mass: 2.0
spawner:
  max_count: 3
";
        let c = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.world.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(c.world.max_sub_steps, 4);
        assert_eq!(c.world.fixed_time_step, 1.0 / 60.0);
        assert!(!c.layout.enabled);
        assert_eq!(c.layout.cube.mass, 2.0);
        assert_eq!(c.layout.cube.friction, 0.5);
        assert_eq!(c.spawner.max_count, 3);
        assert_eq!(c.spawner.interval, 0.25);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            SceneConfig::from_yaml_str("wrld: {}"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            SceneConfig::from_json_str(r#"{"ground": {"colour": 1}}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        let err = SceneConfig::from_yaml_str("world: { fixed_time_step: 0.0 }").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err =
            SceneConfig::from_yaml_str("spawner: { min_size: 9.0, max_size: 8.0 }").unwrap_err();
        assert!(err.to_string().contains("min_size"));

        let err = SceneConfig::from_json_str(r#"{"layout": {"sphere": {"friction": -1.0}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("layout.sphere.friction"));
    }

    #[test]
    fn disabled_sections_skip_their_checks() {
        let c = SceneConfig::from_yaml_str("spawner: { enabled: false, interval: 0.0 }").unwrap();
        assert!(!c.spawner.enabled);
    }

    #[test]
    fn yaml_and_json_writers_reload() {
        let c = SceneConfig::default();
        let yaml = c.to_yaml_string().unwrap();
        assert!(yaml.contains("box:"));
        assert_eq!(SceneConfig::from_yaml_str(&yaml).unwrap(), c);
        let json = c.to_json_string().unwrap();
        assert_eq!(SceneConfig::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("scene.yml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "ground:\n  restitution: 0.5").unwrap();
        drop(f);
        assert_eq!(SceneConfig::load(&yaml_path).unwrap().ground.restitution, 0.5);

        let json_path = dir.path().join("scene.json");
        std::fs::write(&json_path, r#"{"view": {"fov_degrees": 45.0}}"#).unwrap();
        assert_eq!(SceneConfig::load(&json_path).unwrap().view.fov_degrees, 45.0);

        let toml_path = dir.path().join("scene.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            SceneConfig::load(&toml_path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));

        assert!(matches!(
            SceneConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn ground_body_is_static_with_configured_coefficients() {
        let g = GroundConfig::default();
        let body = g.body().unwrap();
        assert!(body.is_static());
        assert_eq!(body.restitution(), 0.99);
        assert_eq!(g.top(), 0.5);
    }

    #[test]
    fn template_apply_sets_coefficients() {
        let mut body = RigidBody::create_sphere(1.0, Vec3::ZERO, 4.0).unwrap();
        LayoutConfig::default().sphere.apply(&mut body).unwrap();
        assert_eq!(body.restitution(), 0.5);
        assert_eq!(body.friction(), 1.0);
        assert_eq!(body.rolling_friction(), 1.0);
    }
}
