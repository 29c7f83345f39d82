//! Per-unit combat controller.
//!
//! Each armed unit, every tick:
//! 1. counts its weapon cooldown down,
//! 2. resolves a target (forced, then auto, then nearest enemy in range),
//! 3. walks toward an out-of-range forced target,
//! 4. fires when the target is in range and the weapon is ready,
//! 5. turns to face the target.
//!
//! Pursuit and firing are independent: a unit may shoot while a pursuit
//! move is still outstanding.

use crate::components::{CombatState, EntityId, TeamId, WeaponStats};
use crate::events::{EventQueue, SimEvent};
use crate::math::{flatten, non_negative, turn_towards, yaw_of, Vec3};
use crate::navigation::Navigation;
use crate::projectile::{ProjectileLaunch, ProjectileStore};
use crate::registry::EntityRegistry;
use crate::spatial::SpatialQuery;

/// Closest a pursuing unit aims to get to its target.
pub const MIN_PURSUIT_DISTANCE: f32 = 0.5;

/// Assign or clear a unit's forced target.
///
/// An invalid target (missing, dead or allied) clears the forced target.
/// Returns `true` if the unit now holds `target` as its forced target.
pub fn set_forced_target(
    registry: &mut EntityRegistry,
    unit: EntityId,
    target: Option<EntityId>,
) -> bool {
    let Some(team) = registry.get(unit).map(|entity| entity.team) else {
        return false;
    };
    let accepted = target.filter(|&id| registry.is_valid_target(team, id));
    let Some(state) = registry
        .get_mut(unit)
        .and_then(|entity| entity.combat.as_mut())
    else {
        return false;
    };
    state.forced_target = accepted;
    accepted.is_some()
}

/// Check whether `target` is within `range` of `from`, center to center.
#[must_use]
pub fn in_range(from: Vec3, target: Vec3, range: f32) -> bool {
    from.distance_squared(target) <= range * range
}

/// Nearest live enemy of `team` within `range` of `position`.
///
/// Ties keep the first candidate the spatial query reported.
pub fn acquire_closest_enemy<S: SpatialQuery + ?Sized>(
    registry: &EntityRegistry,
    spatial: &S,
    team: TeamId,
    position: Vec3,
    range: f32,
) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for id in spatial.overlap_sphere(registry, position, range) {
        if !registry.is_valid_target(team, id) {
            continue;
        }
        let Some(candidate) = registry.get(id) else {
            continue;
        };
        let distance = candidate.position().distance_squared(position);
        if best.map_or(true, |(_, nearest)| distance < nearest) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}

/// Resolve the target for this tick, updating target memory.
///
/// A forced target that became invalid is dropped. The auto target is only
/// re-acquired when there is no valid forced target.
pub fn resolve_target<S: SpatialQuery + ?Sized>(
    registry: &EntityRegistry,
    spatial: &S,
    team: TeamId,
    position: Vec3,
    weapon: &WeaponStats,
    state: &mut CombatState,
) -> Option<EntityId> {
    if let Some(forced) = state.forced_target {
        if registry.is_valid_target(team, forced) {
            return Some(forced);
        }
        state.forced_target = None;
    }

    let auto_valid = state
        .auto_target
        .is_some_and(|id| registry.is_valid_target(team, id));
    if !auto_valid {
        state.auto_target =
            acquire_closest_enemy(registry, spatial, team, position, weapon.attack_range);
    }
    state.auto_target
}

/// Where a pursuer standing at `from` should go to bring `target` into range.
///
/// `None` when the two are on top of each other.
#[must_use]
pub fn pursuit_destination(from: Vec3, target: Vec3, weapon: &WeaponStats) -> Option<Vec3> {
    let to = flatten(target - from);
    let distance = to.length();
    if distance < f32::EPSILON {
        return None;
    }
    let desired = (weapon.attack_range - weapon.pursue_stop_buffer).max(MIN_PURSUIT_DISTANCE);
    Some(target - to / distance * desired)
}

/// Run every combat controller for one tick.
///
/// # Arguments
/// * `registry` - All entities; combat memory and headings are written back
/// * `spatial` - Overlap queries for target acquisition
/// * `nav` - Receives pursuit moves
/// * `projectiles` - Receives launched shots
/// * `dt` - Elapsed seconds
/// * `events` - Receives `ProjectileFired`
pub fn combat_system<S, N>(
    registry: &mut EntityRegistry,
    spatial: &S,
    nav: &mut N,
    projectiles: &mut ProjectileStore,
    dt: f32,
    events: &mut EventQueue,
) where
    S: SpatialQuery + ?Sized,
    N: Navigation + ?Sized,
{
    let dt = non_negative(dt);

    for id in registry.ids() {
        let Some(unit) = registry.get(id).filter(|unit| unit.is_alive()) else {
            continue;
        };
        let (Some(weapon), Some(mut state)) = (unit.weapon, unit.combat) else {
            continue;
        };
        let (team, position, yaw) = (unit.team, unit.position(), unit.transform.yaw);

        state.fire_cooldown_remaining -= dt;
        let target = resolve_target(registry, spatial, team, position, &weapon, &mut state);
        let target_position = target
            .and_then(|target| registry.get(target))
            .map(|target| target.position());

        if weapon.pursue_forced_target {
            let forced_position = state
                .forced_target
                .and_then(|forced| registry.get(forced))
                .map(|forced| forced.position());
            if let Some(forced_position) = forced_position {
                if !in_range(position, forced_position, weapon.attack_range) {
                    if let Some(destination) =
                        pursuit_destination(position, forced_position, &weapon)
                    {
                        tracing::trace!(unit = %id, ?destination, "Pursuing forced target");
                        nav.move_agent_to(id, destination);
                    }
                }
            }
        }

        if let (Some(target), Some(target_position)) = (target, target_position) {
            if state.is_ready() && in_range(position, target_position, weapon.attack_range) {
                let projectile = projectiles.launch(ProjectileLaunch {
                    shooter: id,
                    shooter_team: team,
                    target,
                    damage: weapon.damage_per_shot,
                    origin: position,
                    stats: weapon.projectile,
                });
                state.fire_cooldown_remaining = weapon.fire_cooldown;
                tracing::debug!(shooter = %id, target = %target, ?projectile, "Fired");
                events.push(SimEvent::ProjectileFired {
                    projectile,
                    shooter: id,
                    target,
                });
            }
        }

        let new_yaw = target_position
            .and_then(|target_position| yaw_of(target_position - position))
            .map(|desired| turn_towards(yaw, desired, weapon.turn_rate * dt));

        if let Some(unit) = registry.get_mut(id) {
            unit.combat = Some(state);
            if let Some(new_yaw) = new_yaw {
                unit.transform.yaw = new_yaw;
            }
        }
    }
}
