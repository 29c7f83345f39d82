//! Component definitions.
//!
//! Components are plain data attached to registry entities. Behavior that
//! needs more than one entity lives in the systems (`selection`, `orders`,
//! `combat`, `projectile`, `production`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{non_negative, Vec3};

/// Team identifier. Entities with equal team ids are allied and never
/// target each other.
pub type TeamId = u32;

/// Generation-checked handle to a registry entity.
///
/// A handle outlives the entity it names: once the slot is freed and reused
/// the generation no longer matches and lookups resolve to `None`. Target
/// references are always stored as handles, never as borrowed entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the registry.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// What an entity is, for selection and ordering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityKind {
    /// Mobile, orderable unit. Eligible for box selection.
    #[default]
    Unit,
    /// Static structure. Selected only by single click.
    Building,
}

/// World placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec3,
    /// Heading in radians around +Y (0 faces +Z).
    pub yaw: f32,
}

impl Transform {
    /// Transform at `position` facing +Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Smallest accepted maximum health.
pub const MIN_MAX_HEALTH: f32 = 1.0;

/// Hit points of a damageable entity.
///
/// `current` is kept inside `[0, max]` by every mutator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Create a health component at full health.
    ///
    /// A non-positive or non-finite `max` is raised to [`MIN_MAX_HEALTH`].
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max >= MIN_MAX_HEALTH {
            max
        } else {
            MIN_MAX_HEALTH
        };
        Self { current: max, max }
    }

    /// Create a health component with a specific starting value, clamped.
    #[must_use]
    pub fn with_current(max: f32, current: f32) -> Self {
        let mut health = Self::new(max);
        health.current = non_negative(current).min(health.max);
        health
    }

    /// Current hit points.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Check if the entity is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Apply damage, returning the amount actually removed.
    ///
    /// Dead entities take no further damage; negative amounts are ignored.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let actual = non_negative(amount).min(self.current);
        self.current = (self.current - actual).clamp(0.0, self.max);
        actual
    }

    /// Restore hit points, returning the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let actual = non_negative(amount).min(self.max - self.current);
        self.current = (self.current + actual).clamp(0.0, self.max);
        actual
    }

    /// Health as a fraction in `[0, 1]`, for health bars.
    #[must_use]
    pub fn normalized(&self) -> f32 {
        self.current / self.max
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Selection visual state.
///
/// The flag only flips on an actual change so highlight effects activate
/// once per selection, not once per re-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selectable {
    selected: bool,
}

impl Selectable {
    /// Whether the selection highlight is on.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Turn the highlight on. Returns `true` if it was off.
    pub fn select(&mut self) -> bool {
        let changed = !self.selected;
        self.selected = true;
        changed
    }

    /// Turn the highlight off. Returns `true` if it was on.
    pub fn deselect(&mut self) -> bool {
        let changed = self.selected;
        self.selected = false;
        changed
    }
}

/// Flight parameters of the projectiles a weapon fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileStats {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Seconds before the projectile self-destructs.
    pub max_lifetime: f32,
    /// Distance at which the projectile counts as an impact.
    pub hit_radius: f32,
}

impl ProjectileStats {
    /// Copy with every value clamped to be non-negative.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            speed: non_negative(self.speed),
            max_lifetime: non_negative(self.max_lifetime),
            hit_radius: non_negative(self.hit_radius),
        }
    }
}

impl Default for ProjectileStats {
    fn default() -> Self {
        Self {
            speed: 20.0,
            max_lifetime: 5.0,
            hit_radius: 0.25,
        }
    }
}

/// Weapon and pursuit tuning for a combat unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Firing range, measured center to center.
    pub attack_range: f32,
    /// Seconds between shots.
    pub fire_cooldown: f32,
    /// Damage carried by each projectile.
    pub damage_per_shot: f32,
    /// Whether the unit walks toward an out-of-range forced target.
    pub pursue_forced_target: bool,
    /// How far inside `attack_range` pursuit aims to stop.
    pub pursue_stop_buffer: f32,
    /// Heading interpolation rate toward the current target (per second).
    pub turn_rate: f32,
    /// Projectile flight parameters.
    pub projectile: ProjectileStats,
}

impl WeaponStats {
    /// Copy with every radius, duration and amount clamped to be non-negative.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = Self {
            attack_range: non_negative(self.attack_range),
            fire_cooldown: non_negative(self.fire_cooldown),
            damage_per_shot: non_negative(self.damage_per_shot),
            pursue_forced_target: self.pursue_forced_target,
            pursue_stop_buffer: non_negative(self.pursue_stop_buffer),
            turn_rate: non_negative(self.turn_rate),
            projectile: self.projectile.sanitized(),
        };
        if clean != self {
            tracing::warn!(?self, "Clamped invalid weapon stats");
        }
        clean
    }
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            attack_range: 8.0,
            fire_cooldown: 0.75,
            damage_per_shot: 10.0,
            pursue_forced_target: true,
            pursue_stop_buffer: 0.6,
            turn_rate: 10.0,
            projectile: ProjectileStats::default(),
        }
    }
}

/// Per-unit combat memory.
///
/// Both targets are weak handles, re-validated through the registry on
/// every read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatState {
    /// Target assigned by a player attack order.
    pub forced_target: Option<EntityId>,
    /// Target picked by nearest-enemy acquisition.
    pub auto_target: Option<EntityId>,
    /// Seconds until the weapon is ready; ready whenever `<= 0`.
    pub fire_cooldown_remaining: f32,
}

impl CombatState {
    /// Check if the weapon may fire this tick.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.fire_cooldown_remaining <= 0.0
    }

    /// Drop every reference to `id` from target memory.
    pub fn forget(&mut self, id: EntityId) {
        if self.forced_target == Some(id) {
            self.forced_target = None;
        }
        if self.auto_target == Some(id) {
            self.auto_target = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_damage() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(30.0), 30.0);
        assert_eq!(health.current(), 70.0);

        assert_eq!(health.apply_damage(500.0), 70.0);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_dead());

        // Already dead: nothing more to take
        assert_eq!(health.apply_damage(10.0), 0.0);
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_health_ignores_negative_damage() {
        let mut health = Health::with_current(100.0, 90.0);
        assert_eq!(health.apply_damage(-50.0), 0.0);
        assert_eq!(health.current(), 90.0);
    }

    #[test]
    fn test_health_heal_caps_at_max() {
        let mut health = Health::with_current(100.0, 95.0);
        assert_eq!(health.heal(20.0), 5.0);
        assert_eq!(health.current(), 100.0);
        assert_eq!(health.normalized(), 1.0);
    }

    #[test]
    fn test_health_rejects_bad_max() {
        let health = Health::new(0.0);
        assert_eq!(health.max(), MIN_MAX_HEALTH);
        let health = Health::with_current(50.0, 80.0);
        assert_eq!(health.current(), 50.0);
        let health = Health::with_current(50.0, -3.0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_selectable_reports_changes_once() {
        let mut mark = Selectable::default();
        assert!(mark.select());
        assert!(!mark.select());
        assert!(mark.is_selected());
        assert!(mark.deselect());
        assert!(!mark.deselect());
    }

    #[test]
    fn test_weapon_defaults() {
        let weapon = WeaponStats::default();
        assert_eq!(weapon.attack_range, 8.0);
        assert_eq!(weapon.fire_cooldown, 0.75);
        assert_eq!(weapon.damage_per_shot, 10.0);
        assert_eq!(weapon.pursue_stop_buffer, 0.6);
        assert_eq!(weapon.projectile.speed, 20.0);
        assert_eq!(weapon.projectile.max_lifetime, 5.0);
        assert_eq!(weapon.projectile.hit_radius, 0.25);
    }

    #[test]
    fn test_weapon_sanitized_clamps_negatives() {
        let weapon = WeaponStats {
            attack_range: -4.0,
            fire_cooldown: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(weapon.attack_range, 0.0);
        assert_eq!(weapon.fire_cooldown, 0.0);
        assert_eq!(weapon.damage_per_shot, 10.0);
    }

    #[test]
    fn test_combat_state_forget() {
        let a = EntityId::new(1, 0);
        let b = EntityId::new(2, 0);
        let mut state = CombatState {
            forced_target: Some(a),
            auto_target: Some(b),
            fire_cooldown_remaining: 0.0,
        };
        state.forget(a);
        assert_eq!(state.forced_target, None);
        assert_eq!(state.auto_target, Some(b));
        assert!(state.is_ready());
    }
}
