use glam::{Quat, Vec3};
use tumble_common::Transform;
use tumble_physics::{PhysicsError, RigidBody};
use tumble_scene::{Geometry, Material, MeshNode};

use crate::config::SpawnerConfig;
use crate::rng::SplitMix64;

/// A body and the mesh that should follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub body: RigidBody,
    pub node: MeshNode,
}

/// Countdown that drops a randomly sized box from above at a fixed cadence.
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnerConfig,
    rng: SplitMix64,
    countdown: f32,
    spawned: u32,
}

impl Spawner {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            rng: SplitMix64::new(config.seed),
            countdown: config.initial_delay,
            spawned: 0,
            config,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Seconds left until the next spawn.
    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    pub fn is_exhausted(&self) -> bool {
        self.spawned >= self.config.max_count
    }

    /// Advance by `delta_seconds`; at most one spawn per call. Negative or
    /// non-finite deltas are ignored.
    pub fn tick(&mut self, delta_seconds: f32) -> Result<Option<SpawnRequest>, PhysicsError> {
        if !self.config.enabled || !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Ok(None);
        }
        self.countdown -= delta_seconds;
        if self.countdown >= 0.0 || self.is_exhausted() {
            return Ok(None);
        }
        self.countdown = self.config.interval;

        let c = &self.config;
        let size = self.rng.range(c.min_size, c.max_size);
        let position = Vec3::new(
            self.rng.range(-c.spread, c.spread),
            c.height,
            self.rng.range(-c.spread, c.spread),
        );
        let color = self.rng.color();

        let mut body = RigidBody::create_box(c.body.mass, position, Quat::IDENTITY, Vec3::splat(size))?;
        c.body.apply(&mut body)?;
        let node = MeshNode::new(
            format!("spawn-{}", self.spawned),
            Geometry::Box {
                size: Vec3::splat(size),
            },
            Material { color },
        )
        .with_transform(Transform {
            position,
            ..Transform::default()
        });

        self.spawned += 1;
        tracing::debug!(n = self.spawned, size, y = position.y, "box spawned");
        Ok(Some(SpawnRequest { body, node }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(spawner: &mut Spawner, n: usize, dt: f32) -> usize {
        (0..n)
            .filter(|_| spawner.tick(dt).unwrap().is_some())
            .count()
    }

    #[test]
    fn nothing_before_initial_delay() {
        let mut s = Spawner::new(SpawnerConfig::default());
        // 0.9 s of frames.
        assert_eq!(frames(&mut s, 9, 0.1), 0);
        assert_eq!(s.spawned(), 0);
    }

    #[test]
    fn first_spawn_after_delay_then_every_interval() {
        let mut s = Spawner::new(SpawnerConfig::default());
        let spawn_frames: Vec<usize> = (0..20)
            .filter(|_| s.tick(0.125).unwrap().is_some())
            .collect();
        // The countdown hits exactly zero after 8 frames and fires on the 9th;
        // afterwards 0.25 s lasts two frames and fires on the third.
        assert_eq!(spawn_frames, vec![8, 11, 14, 17]);
        assert_eq!(s.countdown(), 0.0);
    }

    #[test]
    fn one_spawn_per_tick_even_on_long_frames() {
        let mut s = Spawner::new(SpawnerConfig::default());
        assert!(s.tick(10.0).unwrap().is_some());
        assert!(s.tick(10.0).unwrap().is_some());
        assert_eq!(s.spawned(), 2);
    }

    #[test]
    fn stops_at_max_count() {
        let mut s = Spawner::new(SpawnerConfig {
            max_count: 3,
            ..SpawnerConfig::default()
        });
        assert_eq!(frames(&mut s, 50, 1.0), 3);
        assert!(s.is_exhausted());
    }

    #[test]
    fn disabled_spawner_never_fires() {
        let mut s = Spawner::new(SpawnerConfig {
            enabled: false,
            ..SpawnerConfig::default()
        });
        assert_eq!(frames(&mut s, 20, 1.0), 0);
    }

    #[test]
    fn spawned_box_matches_config() {
        let cfg = SpawnerConfig::default();
        let mut s = Spawner::new(cfg);
        let req = s.tick(2.0).unwrap().unwrap();
        let pos = req.body.pose().position;
        assert_eq!(pos.y, 200.0);
        assert!(pos.x.abs() <= 1.0 && pos.z.abs() <= 1.0);
        assert_eq!(req.body.mass(), 300.0);
        assert_eq!(req.body.restitution(), 0.125);
        assert_eq!(req.body.rolling_friction(), 5.0);
        let Geometry::Box { size } = req.node.geometry else {
            panic!("spawned mesh should be a box");
        };
        assert!(size.x >= 4.0 && size.x < 8.0);
        assert_eq!(req.body.shape().size(), size);
        assert_eq!(req.node.transform.position, pos);
    }

    #[test]
    fn same_seed_same_spawns() {
        let mut a = Spawner::new(SpawnerConfig::default());
        let mut b = Spawner::new(SpawnerConfig::default());
        for _ in 0..5 {
            assert_eq!(a.tick(1.0).unwrap(), b.tick(1.0).unwrap());
        }
    }

    #[test]
    fn bad_deltas_leave_countdown_alone() {
        let mut s = Spawner::new(SpawnerConfig::default());
        for dt in [f32::NAN, f32::INFINITY, -1.0] {
            assert!(s.tick(dt).unwrap().is_none());
        }
        assert_eq!(s.countdown(), 1.0);
        assert_eq!(s.spawned(), 0);
    }
}
