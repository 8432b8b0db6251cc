//! Particle simulation driven through the ECS.
//!
//! Entities carry a position, a velocity and a pooled lifetime. `Movement`
//! integrates positions, `Aging` counts lifetimes down and removes expired
//! entities from inside its own pass, and the spawner keeps the population
//! topped up with lifetimes drawn from the pool.

use hive_core::ecs::{ComponentPool, Ecs, EcsResult, Entity, Getter, System};
use hive_core::{define_component, spawn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::settings::RuntimeSettings;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
}

define_component!(Position);
define_component!(Velocity);
define_component!(Lifetime);

#[derive(Default)]
pub struct Movement {
    position: Option<Getter<Position>>,
    velocity: Option<Getter<Velocity>>,
}

impl System for Movement {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn initialize(&mut self, ecs: &mut Ecs) -> EcsResult<()> {
        self.position = Some(ecs.getter()?);
        self.velocity = Some(ecs.getter()?);
        Ok(())
    }

    fn process_entity_dt(&mut self, ecs: &mut Ecs, entity: Entity, dt: f32) -> EcsResult<()> {
        let (Some(position), Some(velocity)) = (self.position, self.velocity) else {
            return Ok(());
        };
        let Some(&Velocity { dx, dy }) = velocity.get_unchecked(ecs, entity) else {
            return Ok(());
        };
        if let Some(position) = position.get_unchecked_mut(ecs, entity) {
            position.x += dx * dt;
            position.y += dy * dt;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Aging {
    pub expired: u64,
}

impl System for Aging {
    fn name(&self) -> &'static str {
        "aging"
    }

    fn process_entity_dt(&mut self, ecs: &mut Ecs, entity: Entity, dt: f32) -> EcsResult<()> {
        let Some(lifetime) = ecs.get_mut::<Lifetime>(entity) else {
            return Ok(());
        };
        lifetime.remaining -= dt;
        if lifetime.remaining <= 0.0 {
            ecs.remove(entity)?;
            self.expired += 1;
        }
        Ok(())
    }

    fn end(&mut self, _ecs: &mut Ecs) -> EcsResult<()> {
        debug!(expired = self.expired, "aging pass finished");
        Ok(())
    }
}

pub struct Simulation {
    ecs: Ecs,
    settings: RuntimeSettings,
    rng: ChaCha8Rng,
    spawned: u64,
}

impl Simulation {
    pub fn new(settings: RuntimeSettings) -> EcsResult<Self> {
        let mut ecs = Ecs::with_config(settings.ecs.clone());
        let pool_size = settings.entities.max(1);
        ecs.register_component_pool(
            ComponentPool::<Lifetime>::with_default(pool_size / 4, pool_size).with_reset(|lifetime| {
                lifetime.remaining = 0.0;
            }),
        )?;
        ecs.register_system_with::<(Position, Velocity), _>(Movement::default())?;
        ecs.register_system_with::<(Lifetime,), _>(Aging::default())?;
        ecs.initialize()?;

        Ok(Self {
            ecs,
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            settings,
            spawned: 0,
        })
    }

    /// One tick: top up the population, run every system, advance time.
    pub fn tick(&mut self) -> EcsResult<()> {
        self.spawn_missing()?;
        let dt = self.settings.dt;
        self.ecs.process_all(dt)?;
        self.ecs.update(dt)
    }

    fn spawn_missing(&mut self) -> EcsResult<()> {
        let missing = self.settings.entities.saturating_sub(self.ecs.entity_count());
        for _ in 0..missing {
            let mut lifetime = self.ecs.obtain::<Lifetime>()?;
            lifetime.remaining = self
                .rng
                .gen_range(self.settings.min_lifetime..=self.settings.max_lifetime);
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(1.0..10.0);
            spawn!(
                self.ecs,
                Position::default(),
                Velocity {
                    dx: angle.cos() * speed,
                    dy: angle.sin() * speed,
                },
                lifetime
            )?;
            self.spawned += 1;
        }
        Ok(())
    }

    pub fn ecs(&self) -> &Ecs {
        &self.ecs
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn expired(&self) -> u64 {
        self.ecs.get_system::<Aging>().map_or(0, |aging| aging.expired)
    }

    pub fn terminate(&mut self) -> EcsResult<()> {
        self.ecs.terminate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RuntimeSettings {
        RuntimeSettings {
            ticks: 0,
            dt: 0.25,
            entities: 20,
            min_lifetime: 0.5,
            max_lifetime: 1.0,
            ..RuntimeSettings::default()
        }
    }

    #[test]
    fn population_is_topped_up() {
        let mut simulation = Simulation::new(settings()).unwrap();
        simulation.tick().unwrap();
        assert_eq!(simulation.ecs().entity_count(), 20);
        assert_eq!(simulation.spawned(), 20);
    }

    #[test]
    fn expired_entities_are_replaced_with_recycled_lifetimes() {
        let mut simulation = Simulation::new(settings()).unwrap();
        for _ in 0..12 {
            simulation.tick().unwrap();
        }
        assert!(simulation.expired() > 0);
        assert!(simulation.spawned() > 20);

        let stats = simulation.ecs().statistics();
        assert!(stats.components_obtained >= simulation.spawned());
        let lifetime_pool = stats
            .types
            .iter()
            .find(|ty| ty.name == "Lifetime")
            .and_then(|ty| ty.pool)
            .unwrap();
        assert!(lifetime_pool.recycled > 0);
        assert!(simulation.ecs().entity_count() <= 20);
    }

    #[test]
    fn movement_integrates_velocity() {
        let mut simulation = Simulation::new(RuntimeSettings {
            entities: 1,
            min_lifetime: 100.0,
            max_lifetime: 100.0,
            ..settings()
        })
        .unwrap();
        simulation.tick().unwrap();
        simulation.tick().unwrap();

        let ecs = simulation.ecs();
        let entity = ecs
            .entity_manager()
            .entities()
            .into_iter()
            .next()
            .unwrap();
        let velocity = *ecs.get::<Velocity>(entity).unwrap();
        let position = *ecs.get::<Position>(entity).unwrap();
        assert!((position.x - velocity.dx * 0.5).abs() < 1e-4);
        assert!((position.y - velocity.dy * 0.5).abs() < 1e-4);
    }

    #[test]
    fn same_seed_spawns_the_same_velocities() {
        let velocities = |seed| {
            let mut simulation = Simulation::new(RuntimeSettings {
                entities: 3,
                seed,
                ..settings()
            })
            .unwrap();
            simulation.tick().unwrap();
            let ecs = simulation.ecs();
            let mut entities = ecs.entity_manager().entities();
            entities.sort();
            entities
                .into_iter()
                .map(|entity| *ecs.get::<Velocity>(entity).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(velocities(7), velocities(7));
        assert_ne!(velocities(7), velocities(8));
    }

    #[test]
    fn terminate_leaves_nothing_behind() {
        let mut simulation = Simulation::new(settings()).unwrap();
        simulation.tick().unwrap();
        simulation.terminate().unwrap();
        assert_eq!(simulation.ecs().entity_count(), 0);
    }
}
