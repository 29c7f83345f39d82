//! Entity registry.
//!
//! Owns every live unit and building. Entities are stored in a slot arena
//! addressed by generation-checked [`EntityId`] handles, so a reference held
//! by a combat controller or projectile resolves to `None` once its entity
//! is gone instead of dangling or aliasing a newer entity.
//!
//! Iteration always walks slots in index order, which keeps every system
//! deterministic without sorting.

use serde::{Deserialize, Serialize};

use crate::components::{
    CombatState, EntityId, EntityKind, Health, Selectable, TeamId, Transform, WeaponStats,
};
use crate::math::{non_negative, Vec3};
use crate::production::Producer;

/// Default collision / pick radius of a spawned entity.
pub const DEFAULT_RADIUS: f32 = 0.5;

/// Default agent speed in world units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 3.5;

/// A unit or building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Handle of this entity.
    pub id: EntityId,
    /// Unit or building.
    pub kind: EntityKind,
    /// Display name (panel titles, logs).
    pub name: String,
    /// Owning team.
    pub team: TeamId,
    /// World placement.
    pub transform: Transform,
    /// Hit points.
    pub health: Health,
    /// Selection highlight state.
    pub selectable: Selectable,
    /// Collision and pick radius.
    pub radius: f32,
    /// Navigation agent speed (world units per second).
    pub move_speed: f32,
    /// Weapon tuning for combat units.
    pub weapon: Option<WeaponStats>,
    /// Combat memory; present exactly when `weapon` is on a unit.
    pub combat: Option<CombatState>,
    /// Unit production for buildings.
    pub producer: Option<Producer>,
}

impl Entity {
    /// World position shortcut.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Check if this is a unit.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.kind == EntityKind::Unit
    }

    /// Check if this entity is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }
}

/// Parameters for spawning a new entity.
///
/// Only `kind`, `team` and `position` usually need setting; everything else
/// has prototype defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySpawnParams {
    /// Unit or building.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub team: TeamId,
    /// Initial world position.
    pub position: Vec3,
    /// Initial heading.
    pub yaw: f32,
    /// Maximum health (spawns at full health unless `health` is set).
    pub max_health: f32,
    /// Optional starting health, clamped to `[0, max_health]`.
    pub health: Option<f32>,
    /// Collision / pick radius.
    pub radius: f32,
    /// Navigation speed.
    pub move_speed: f32,
    /// Weapon for combat units. Ignored on buildings.
    pub weapon: Option<WeaponStats>,
    /// Production capability for buildings.
    pub producer: Option<Producer>,
}

impl Default for EntitySpawnParams {
    fn default() -> Self {
        Self {
            kind: EntityKind::Unit,
            name: String::from("Unit"),
            team: 0,
            position: Vec3::ZERO,
            yaw: 0.0,
            max_health: 100.0,
            health: None,
            radius: DEFAULT_RADIUS,
            move_speed: DEFAULT_MOVE_SPEED,
            weapon: None,
            producer: None,
        }
    }
}

impl EntitySpawnParams {
    /// Armed unit of `team` at `position` with default weapon stats.
    #[must_use]
    pub fn soldier(team: TeamId, position: Vec3) -> Self {
        Self {
            name: String::from("Soldier"),
            team,
            position,
            weapon: Some(WeaponStats::default()),
            ..Default::default()
        }
    }

    /// Building of `team` at `position`.
    #[must_use]
    pub fn building(team: TeamId, position: Vec3) -> Self {
        Self {
            kind: EntityKind::Building,
            name: String::from("Building"),
            team,
            position,
            max_health: 500.0,
            radius: 1.5,
            move_speed: 0.0,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Storage for all live entities.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entity and return its handle.
    pub fn spawn(&mut self, params: EntitySpawnParams) -> EntityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = EntityId::new(index, slot.generation);

        let health = match params.health {
            Some(current) => Health::with_current(params.max_health, current),
            None => Health::new(params.max_health),
        };
        let weapon = match params.kind {
            EntityKind::Unit => params.weapon.map(WeaponStats::sanitized),
            EntityKind::Building => None,
        };

        slot.entity = Some(Entity {
            id,
            kind: params.kind,
            name: params.name,
            team: params.team,
            transform: Transform {
                position: params.position,
                yaw: params.yaw,
            },
            health,
            selectable: Selectable::default(),
            radius: non_negative(params.radius),
            move_speed: non_negative(params.move_speed),
            weapon,
            combat: weapon.map(|_| CombatState::default()),
            producer: params.producer.map(Producer::sanitized),
        });
        self.live += 1;
        id
    }

    /// Remove an entity, returning it if the handle was live.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        Some(entity)
    }

    /// Resolve a handle.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Resolve a handle mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Check if a handle still resolves.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Handles of every live entity, in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|entity| entity.id).collect()
    }

    /// Iterate live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Iterate live entities mutably in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(|slot| slot.entity.as_mut())
    }

    /// Check whether `id` is something a member of `attacker_team` may shoot:
    /// it exists, is alive, and is not allied.
    #[must_use]
    pub fn is_valid_target(&self, attacker_team: TeamId, id: EntityId) -> bool {
        self.get(id)
            .is_some_and(|target| target.is_alive() && target.team != attacker_team)
    }

    /// Move an entity to another team. Returns `false` for a stale handle.
    pub fn set_team(&mut self, id: EntityId, team: TeamId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.team = team;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_get() {
        let mut registry = EntityRegistry::new();
        let id = registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(2.0, 0.0, 3.0)));

        let entity = registry.get(id).unwrap();
        assert_eq!(entity.team, 1);
        assert_eq!(entity.position(), Vec3::new(2.0, 0.0, 3.0));
        assert!(entity.combat.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut registry = EntityRegistry::new();
        let first = registry.spawn(EntitySpawnParams::default());
        assert!(registry.remove(first).is_some());
        assert!(registry.remove(first).is_none());

        let second = registry.spawn(EntitySpawnParams::default());
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(registry.get(second).is_some());
    }

    #[test]
    fn test_buildings_never_get_weapons() {
        let mut registry = EntityRegistry::new();
        let id = registry.spawn(EntitySpawnParams {
            weapon: Some(WeaponStats::default()),
            ..EntitySpawnParams::building(0, Vec3::ZERO)
        });
        let building = registry.get(id).unwrap();
        assert!(building.weapon.is_none());
        assert!(building.combat.is_none());
    }

    #[test]
    fn test_target_validity() {
        let mut registry = EntityRegistry::new();
        let enemy = registry.spawn(EntitySpawnParams::soldier(1, Vec3::ZERO));
        let corpse = registry.spawn(EntitySpawnParams {
            health: Some(0.0),
            ..EntitySpawnParams::soldier(1, Vec3::ZERO)
        });

        assert!(registry.is_valid_target(0, enemy));
        assert!(!registry.is_valid_target(1, enemy));
        assert!(!registry.is_valid_target(0, corpse));

        assert!(registry.set_team(enemy, 0));
        assert!(!registry.is_valid_target(0, enemy));

        registry.remove(enemy);
        assert!(!registry.is_valid_target(0, enemy));
        assert!(!registry.set_team(enemy, 3));
    }

    #[test]
    fn test_iteration_is_slot_ordered() {
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(EntitySpawnParams::default());
        let b = registry.spawn(EntitySpawnParams::default());
        let c = registry.spawn(EntitySpawnParams::default());
        registry.remove(b);
        let d = registry.spawn(EntitySpawnParams::default());

        assert_eq!(registry.ids(), vec![a, d, c]);
    }
}
