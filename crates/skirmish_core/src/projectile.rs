//! Projectile resolver.
//!
//! Projectiles home on their target's current position at constant speed,
//! never stepping past it.
//! They are consumed on reaching the hit radius (damaging only enemies),
//! dropped as soon as the target is gone, and expire after their lifetime.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, ProjectileStats, TeamId};
use crate::events::{EventQueue, ProjectileId, SimEvent};
use crate::math::{non_negative, Vec3};
use crate::registry::EntityRegistry;

/// An in-flight projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Identifier.
    pub id: ProjectileId,
    /// Unit that fired it.
    pub shooter: EntityId,
    /// Team of the shooter when it fired.
    pub shooter_team: TeamId,
    /// Homing target (weak).
    pub target: EntityId,
    /// Damage dealt on impact with an enemy.
    pub damage: f32,
    /// Current position.
    pub position: Vec3,
    /// Flight parameters.
    pub stats: ProjectileStats,
    /// Seconds since it started flying.
    pub age: f32,
}

/// What a shooter hands over when it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    /// Firing unit.
    pub shooter: EntityId,
    /// Its team.
    pub shooter_team: TeamId,
    /// Target.
    pub target: EntityId,
    /// Damage on impact.
    pub damage: f32,
    /// Muzzle position.
    pub origin: Vec3,
    /// Flight parameters.
    pub stats: ProjectileStats,
}

/// Every projectile in the world.
///
/// Projectiles launched during a tick are held back and start flying on
/// the following tick.
#[derive(Debug, Clone, Default)]
pub struct ProjectileStore {
    next_id: u64,
    active: Vec<Projectile>,
    launched: Vec<Projectile>,
}

impl ProjectileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a projectile; it starts moving on the next update.
    pub fn launch(&mut self, launch: ProjectileLaunch) -> ProjectileId {
        let id = ProjectileId(self.next_id);
        self.next_id += 1;
        self.launched.push(Projectile {
            id,
            shooter: launch.shooter,
            shooter_team: launch.shooter_team,
            target: launch.target,
            damage: non_negative(launch.damage),
            position: launch.origin,
            stats: launch.stats.sanitized(),
            age: 0.0,
        });
        id
    }

    /// Look up a projectile.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.iter().find(|projectile| projectile.id == id)
    }

    /// Iterate every projectile, flying ones first.
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.active.iter().chain(self.launched.iter())
    }

    /// Number of projectiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len() + self.launched.len()
    }

    /// Check if there are no projectiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Outcome {
    Flying,
    Fizzled,
    Impact { damage: f32 },
    Expired,
}

fn step(
    projectile: &mut Projectile,
    registry: &mut EntityRegistry,
    dt: f32,
    events: &mut EventQueue,
) -> Outcome {
    let Some(target) = registry
        .get_mut(projectile.target)
        .filter(|target| target.is_alive())
    else {
        return Outcome::Fizzled;
    };

    let target_position = target.position();
    let to = target_position - projectile.position;
    let travel = (projectile.stats.speed * dt).min(to.length());
    projectile.position += to.normalize_or_zero() * travel;

    if projectile.position.distance(target_position) <= projectile.stats.hit_radius {
        let mut damage = 0.0;
        if target.team != projectile.shooter_team {
            damage = target.health.apply_damage(projectile.damage);
            events.push(SimEvent::DamageApplied {
                target: target.id,
                amount: damage,
                remaining: target.health.current(),
            });
            if target.health.is_dead() {
                tracing::debug!(target = %target.id, shooter = %projectile.shooter, "Lethal hit");
            }
        }
        return Outcome::Impact { damage };
    }

    projectile.age += dt;
    if projectile.age >= projectile.stats.max_lifetime {
        return Outcome::Expired;
    }
    Outcome::Flying
}

/// Advance every flying projectile by `dt` seconds and resolve impacts.
///
/// Same-team impacts consume the projectile without damage.
pub fn projectile_system(
    store: &mut ProjectileStore,
    registry: &mut EntityRegistry,
    dt: f32,
    events: &mut EventQueue,
) {
    let dt = non_negative(dt);
    store.active.retain_mut(|projectile| {
        match step(projectile, registry, dt, events) {
            Outcome::Flying => return true,
            Outcome::Fizzled => events.push(SimEvent::ProjectileFizzled {
                projectile: projectile.id,
            }),
            Outcome::Impact { damage } => events.push(SimEvent::ProjectileImpact {
                projectile: projectile.id,
                target: projectile.target,
                damage,
            }),
            Outcome::Expired => events.push(SimEvent::ProjectileExpired {
                projectile: projectile.id,
            }),
        }
        false
    });
    store.active.append(&mut store.launched);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntitySpawnParams;

    fn launch_at(
        store: &mut ProjectileStore,
        shooter_team: TeamId,
        target: EntityId,
        origin: Vec3,
    ) -> ProjectileId {
        store.launch(ProjectileLaunch {
            shooter: EntityId::new(99, 0),
            shooter_team,
            target,
            damage: 10.0,
            origin,
            stats: ProjectileStats::default(),
        })
    }

    #[test]
    fn test_launched_projectiles_wait_one_update() {
        let mut registry = EntityRegistry::new();
        let mut events = EventQueue::new();
        let target = registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(10.0, 0.0, 0.0)));
        let mut store = ProjectileStore::new();
        let id = launch_at(&mut store, 0, target, Vec3::ZERO);

        projectile_system(&mut store, &mut registry, 0.1, &mut events);
        assert_eq!(store.get(id).unwrap().position, Vec3::ZERO);

        projectile_system(&mut store, &mut registry, 0.1, &mut events);
        assert!((store.get(id).unwrap().position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_enemy_impact_damages() {
        let mut registry = EntityRegistry::new();
        let mut events = EventQueue::new();
        let target = registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(1.0, 0.0, 0.0)));
        let mut store = ProjectileStore::new();
        launch_at(&mut store, 0, target, Vec3::ZERO);

        projectile_system(&mut store, &mut registry, 0.0, &mut events);
        projectile_system(&mut store, &mut registry, 0.05, &mut events);

        assert!(store.is_empty());
        assert_eq!(registry.get(target).unwrap().health.current(), 90.0);
        assert!(events
            .drain()
            .iter()
            .any(|event| matches!(event, SimEvent::ProjectileImpact { damage, .. } if *damage == 10.0)));
    }

    #[test]
    fn test_friendly_impact_consumes_without_damage() {
        let mut registry = EntityRegistry::new();
        let mut events = EventQueue::new();
        let target = registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(1.0, 0.0, 0.0)));
        let mut store = ProjectileStore::new();
        launch_at(&mut store, 0, target, Vec3::ZERO);

        projectile_system(&mut store, &mut registry, 0.0, &mut events);
        projectile_system(&mut store, &mut registry, 0.05, &mut events);

        assert!(store.is_empty());
        assert_eq!(registry.get(target).unwrap().health.current(), 100.0);
        assert!(!events
            .drain()
            .iter()
            .any(|event| matches!(event, SimEvent::DamageApplied { .. })));
    }

    #[test]
    fn test_missing_target_fizzles() {
        let mut registry = EntityRegistry::new();
        let mut events = EventQueue::new();
        let target = registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(5.0, 0.0, 0.0)));
        let mut store = ProjectileStore::new();
        let id = launch_at(&mut store, 0, target, Vec3::ZERO);
        projectile_system(&mut store, &mut registry, 0.0, &mut events);
        events.drain();

        registry.remove(target);
        projectile_system(&mut store, &mut registry, 0.1, &mut events);
        assert!(store.is_empty());
        assert_eq!(events.drain(), vec![SimEvent::ProjectileFizzled { projectile: id }]);
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut registry = EntityRegistry::new();
        let mut events = EventQueue::new();
        let target = registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(500.0, 0.0, 0.0)));
        let mut store = ProjectileStore::new();
        let id = launch_at(&mut store, 0, target, Vec3::ZERO);
        projectile_system(&mut store, &mut registry, 0.0, &mut events);

        for _ in 0..4 {
            projectile_system(&mut store, &mut registry, 1.0, &mut events);
        }
        assert_eq!(store.len(), 1);
        projectile_system(&mut store, &mut registry, 1.0, &mut events);
        assert!(store.is_empty());
        assert_eq!(
            events.drain().last(),
            Some(&SimEvent::ProjectileExpired { projectile: id })
        );
    }
}
