//! Unit production for buildings.
//!
//! A producing building holds an explicit countdown. The cost is paid when
//! production starts; when the countdown runs out a unit of the building's
//! team is spawned at the spawn point, snapped onto walkable ground.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, EntityKind, TeamId, WeaponStats};
use crate::economy::ResourceLedger;
use crate::error::{Result, SimError};
use crate::events::{EventQueue, SimEvent};
use crate::math::{non_negative, Vec3};
use crate::navigation::Navigation;
use crate::registry::{EntityRegistry, EntitySpawnParams, DEFAULT_MOVE_SPEED, DEFAULT_RADIUS};

/// Search radius when placing a freshly built unit on walkable ground.
pub const SPAWN_CLAMP_RADIUS: f32 = 2.0;

/// The unit a building turns out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitTemplate {
    /// Display name of produced units.
    pub name: String,
    /// Maximum health.
    pub max_health: f32,
    /// Collision / pick radius.
    pub radius: f32,
    /// Navigation speed.
    pub move_speed: f32,
    /// Weapon, if the unit fights.
    pub weapon: Option<WeaponStats>,
}

impl Default for UnitTemplate {
    fn default() -> Self {
        Self {
            name: String::from("Soldier"),
            max_health: 100.0,
            radius: DEFAULT_RADIUS,
            move_speed: DEFAULT_MOVE_SPEED,
            weapon: Some(WeaponStats::default()),
        }
    }
}

impl UnitTemplate {
    fn spawn_params(&self, team: TeamId, position: Vec3) -> EntitySpawnParams {
        EntitySpawnParams {
            kind: EntityKind::Unit,
            name: self.name.clone(),
            team,
            position,
            max_health: self.max_health,
            radius: self.radius,
            move_speed: self.move_speed,
            weapon: self.weapon,
            ..Default::default()
        }
    }
}

/// Production tuning of a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerStats {
    /// Seconds from start to spawn.
    pub build_time: f32,
    /// Metal paid up front.
    pub cost_metal: u32,
    /// Energy paid up front.
    pub cost_energy: u32,
    /// Spawn point relative to the building.
    pub spawn_offset: Vec3,
    /// What gets built.
    pub unit: UnitTemplate,
}

impl Default for ProducerStats {
    fn default() -> Self {
        Self {
            build_time: 1.5,
            cost_metal: 50,
            cost_energy: 20,
            spawn_offset: Vec3::new(0.0, 0.0, 2.5),
            unit: UnitTemplate::default(),
        }
    }
}

/// Production state of a building.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Producer {
    /// Tuning.
    pub stats: ProducerStats,
    /// Seconds left on the unit in progress.
    pub remaining: Option<f32>,
}

impl Producer {
    /// Idle producer with the given stats.
    #[must_use]
    pub fn new(stats: ProducerStats) -> Self {
        Self {
            stats,
            remaining: None,
        }
    }

    /// Copy with durations and template values clamped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let mut clean = self.clone();
        clean.stats.build_time = non_negative(clean.stats.build_time);
        clean.stats.unit.radius = non_negative(clean.stats.unit.radius);
        clean.stats.unit.move_speed = non_negative(clean.stats.unit.move_speed);
        clean.remaining = clean.remaining.map(non_negative);
        if clean != self {
            tracing::warn!(stats = ?self.stats, "Clamped invalid producer stats");
        }
        clean
    }

    /// Check if a unit is in progress.
    #[must_use]
    pub fn is_producing(&self) -> bool {
        self.remaining.is_some()
    }

    /// Fraction of the current build completed, for progress bars.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        let remaining = self.remaining?;
        if self.stats.build_time <= 0.0 {
            return Some(1.0);
        }
        Some((1.0 - remaining / self.stats.build_time).clamp(0.0, 1.0))
    }
}

/// Check whether `building` could start production right now.
#[must_use]
pub fn can_start_production(
    registry: &EntityRegistry,
    ledger: &ResourceLedger,
    building: EntityId,
) -> bool {
    registry
        .get(building)
        .filter(|entity| entity.is_alive())
        .and_then(|entity| entity.producer.as_ref())
        .is_some_and(|producer| {
            !producer.is_producing()
                && ledger.can_afford(producer.stats.cost_metal, producer.stats.cost_energy)
        })
}

/// Pay for and start a unit at `building`.
///
/// Leaves every balance and timer untouched on error.
pub fn start_production(
    registry: &mut EntityRegistry,
    ledger: &mut ResourceLedger,
    building: EntityId,
    events: &mut EventQueue,
) -> Result<()> {
    let entity = registry
        .get_mut(building)
        .filter(|entity| entity.is_alive())
        .ok_or(SimError::EntityNotFound(building))?;
    let producer = entity
        .producer
        .as_mut()
        .ok_or(SimError::NotAProducer(building))?;
    if producer.is_producing() {
        return Err(SimError::AlreadyProducing(building));
    }

    let (metal, energy) = (producer.stats.cost_metal, producer.stats.cost_energy);
    if !ledger.try_spend(metal, energy, events) {
        return Err(SimError::InsufficientResources {
            metal,
            energy,
            available_metal: ledger.metal(),
            available_energy: ledger.energy(),
        });
    }

    producer.remaining = Some(producer.stats.build_time);
    tracing::info!(%building, build_time = producer.stats.build_time, "Production started");
    events.push(SimEvent::ProductionStarted { building });
    Ok(())
}

/// Advance every production timer and spawn finished units.
pub fn production_system<N: Navigation + ?Sized>(
    registry: &mut EntityRegistry,
    nav: &N,
    dt: f32,
    events: &mut EventQueue,
) {
    let dt = non_negative(dt);
    let mut finished = Vec::new();

    for entity in registry.iter_mut() {
        if !entity.is_alive() {
            continue;
        }
        let Some(producer) = entity.producer.as_mut() else {
            continue;
        };
        let Some(remaining) = producer.remaining.as_mut() else {
            continue;
        };
        *remaining -= dt;
        if *remaining <= 0.0 {
            producer.remaining = None;
            let spawn_point = entity.transform.position + producer.stats.spawn_offset;
            finished.push((
                entity.id,
                entity.team,
                spawn_point,
                producer.stats.unit.clone(),
            ));
        }
    }

    for (building, team, spawn_point, template) in finished {
        let position = nav
            .clamp_to_walkable(spawn_point, SPAWN_CLAMP_RADIUS)
            .unwrap_or(spawn_point);
        let unit = registry.spawn(template.spawn_params(team, position));
        tracing::info!(%building, %unit, team, "Production completed");
        events.push(SimEvent::ProductionCompleted { building, unit });
    }
}
