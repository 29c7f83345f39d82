//! Core simulation loop.
//!
//! The [`Simulation`] is the explicit context object that owns every
//! subsystem: the entity registry, selection controller, order dispatcher,
//! projectiles and resource ledger. The engine-side capabilities (spatial
//! queries and navigation) are injected at construction.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::combat::{self, combat_system};
use crate::components::{EntityId, TeamId};
use crate::config::SimConfig;
use crate::economy::{ResourceKind, ResourceLedger};
use crate::error::{Result, SimError};
use crate::events::{EventQueue, SimEvent, TickEvents};
use crate::input::PointerInput;
use crate::math::non_negative;
use crate::navigation::Navigation;
use crate::orders::OrderDispatcher;
use crate::production::{self, production_system};
use crate::projectile::{projectile_system, ProjectileStore};
use crate::registry::{Entity, EntityRegistry, EntitySpawnParams};
use crate::selection::SelectionController;
use crate::spatial::SpatialQuery;

/// The simulation state.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Selection** - Left-button input mutates the selection set
/// 2. **Orders** - A right-click becomes an attack or move order
/// 3. **Combat** - Target resolution, pursuit and firing
/// 4. **Projectiles** - Flight, impact and expiry
/// 5. **Production / income** - Build timers and passive resources
/// 6. **Navigation** - Agents advance toward their destinations
/// 7. **Removal** - Dead entities leave the registry
///
/// Steps 1 and 2 are skipped while the pointer is over UI.
#[derive(Debug, Clone)]
pub struct Simulation<S, N> {
    tick: u64,
    config: SimConfig,
    registry: EntityRegistry,
    selection: SelectionController,
    orders: OrderDispatcher,
    projectiles: ProjectileStore,
    ledger: ResourceLedger,
    spatial: S,
    nav: N,
    events: EventQueue,
}

impl<S: SpatialQuery, N: Navigation> Simulation<S, N> {
    /// Create an empty simulation at tick 0.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::prelude::*;
    ///
    /// let sim = Simulation::new(
    ///     SimConfig::default(),
    ///     TopDownCamera::default(),
    ///     FlatNavigation::square(50.0),
    /// );
    /// assert_eq!(sim.get_tick(), 0);
    /// assert!(sim.selection().is_empty());
    /// ```
    #[must_use]
    pub fn new(config: SimConfig, spatial: S, nav: N) -> Self {
        let config = config.sanitized();
        Self {
            tick: 0,
            registry: EntityRegistry::new(),
            selection: SelectionController::new(config.selection),
            orders: OrderDispatcher::new(config.orders, config.rng_seed),
            projectiles: ProjectileStore::new(),
            ledger: ResourceLedger::new(config.economy),
            spatial,
            nav,
            events: EventQueue::new(),
            config,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// All live entities.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    /// The current selection, first-selected first.
    #[must_use]
    pub fn selection(&self) -> &[EntityId] {
        self.selection.selection().as_slice()
    }

    /// Check if a selection box is being dragged.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.selection.is_dragging()
    }

    /// In-flight projectiles.
    #[must_use]
    pub fn projectiles(&self) -> &ProjectileStore {
        &self.projectiles
    }

    /// Resource balances.
    #[must_use]
    pub fn resources(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// The spatial query provider.
    #[must_use]
    pub fn spatial(&self) -> &S {
        &self.spatial
    }

    /// The spatial query provider, e.g. to move the camera.
    pub fn spatial_mut(&mut self) -> &mut S {
        &mut self.spatial
    }

    /// The navigation provider.
    #[must_use]
    pub fn navigation(&self) -> &N {
        &self.nav
    }

    /// The navigation provider, mutably.
    pub fn navigation_mut(&mut self) -> &mut N {
        &mut self.nav
    }

    /// Add an entity to the world.
    pub fn spawn_entity(&mut self, params: EntitySpawnParams) -> EntityId {
        let id = self.registry.spawn(params);
        tracing::debug!(entity = %id, "Spawned entity");
        id
    }

    /// Remove an entity immediately, with the same cleanup as a death.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if the handle is stale.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<()> {
        self.purge(id).ok_or(SimError::EntityNotFound(id))?;
        self.selection.forget(id, &mut self.events);
        Ok(())
    }

    /// Move an entity to another team. Targets that become allied are
    /// dropped on their next read.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if the handle is stale.
    pub fn set_team(&mut self, id: EntityId, team: TeamId) -> Result<()> {
        if self.registry.set_team(id, team) {
            Ok(())
        } else {
            Err(SimError::EntityNotFound(id))
        }
    }

    /// Assign or clear a unit's forced target.
    ///
    /// Returns whether the target was accepted; an invalid target clears
    /// the forced target.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if `unit` is stale.
    pub fn set_forced_target(&mut self, unit: EntityId, target: Option<EntityId>) -> Result<bool> {
        if !self.registry.contains(unit) {
            return Err(SimError::EntityNotFound(unit));
        }
        Ok(combat::set_forced_target(&mut self.registry, unit, target))
    }

    /// Check whether `building` can start producing right now.
    #[must_use]
    pub fn can_start_production(&self, building: EntityId) -> bool {
        production::can_start_production(&self.registry, &self.ledger, building)
    }

    /// Pay for and start a unit at `building`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`], [`SimError::NotAProducer`],
    /// [`SimError::AlreadyProducing`] or [`SimError::InsufficientResources`];
    /// nothing changes on error.
    pub fn start_production(&mut self, building: EntityId) -> Result<()> {
        production::start_production(
            &mut self.registry,
            &mut self.ledger,
            building,
            &mut self.events,
        )
    }

    /// Credit (or debit) resources; balances never go below zero.
    pub fn add_resources(&mut self, kind: ResourceKind, amount: i64) {
        self.ledger.add(kind, amount, &mut self.events);
    }

    /// Advance the simulation by one tick of `dt` seconds.
    ///
    /// Returns every event emitted since the previous tick, including any
    /// queued by API calls in between.
    pub fn tick(&mut self, input: &PointerInput, dt: f32) -> TickEvents {
        let dt = non_negative(dt);

        if input.over_ui {
            tracing::trace!(tick = self.tick, "Pointer over UI, world input skipped");
        } else {
            self.selection
                .handle_input(input, &mut self.registry, &self.spatial, &mut self.events);
            self.orders.dispatch(
                input,
                self.selection.selection().as_slice(),
                &mut self.registry,
                &self.spatial,
                &mut self.nav,
                &mut self.events,
            );
        }

        combat_system(
            &mut self.registry,
            &self.spatial,
            &mut self.nav,
            &mut self.projectiles,
            dt,
            &mut self.events,
        );
        projectile_system(&mut self.projectiles, &mut self.registry, dt, &mut self.events);
        production_system(&mut self.registry, &self.nav, dt, &mut self.events);
        self.ledger.tick(dt, &mut self.events);
        self.nav.advance(&mut self.registry, dt);
        self.remove_dead();

        let events = TickEvents {
            tick: self.tick,
            events: self.events.drain(),
        };
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn remove_dead(&mut self) {
        let dead: Vec<EntityId> = self
            .registry
            .iter()
            .filter(|entity| !entity.is_alive())
            .map(|entity| entity.id)
            .collect();

        for &id in &dead {
            if let Some(entity) = self.purge(id) {
                tracing::info!(entity = %id, team = entity.team, name = %entity.name, "Entity died");
                self.events.push(SimEvent::EntityDied {
                    entity: id,
                    team: entity.team,
                });
            }
        }
        // One notification for the whole batch, after every death is settled
        self.selection.forget_all(&dead, &mut self.events);
    }

    /// Remove an entity and every reference the core holds to it, except
    /// selection, which callers settle themselves.
    fn purge(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.registry.remove(id)?;
        for other in self.registry.iter_mut() {
            if let Some(state) = other.combat.as_mut() {
                state.forget(id);
            }
        }
        self.nav.forget_agent(id);
        Some(entity)
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations fed the same setup and input produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);

        self.registry.len().hash(&mut hasher);
        for entity in self.registry.iter() {
            entity.id.hash(&mut hasher);
            entity.team.hash(&mut hasher);
            entity.transform.position.x.to_bits().hash(&mut hasher);
            entity.transform.position.y.to_bits().hash(&mut hasher);
            entity.transform.position.z.to_bits().hash(&mut hasher);
            entity.transform.yaw.to_bits().hash(&mut hasher);
            entity.health.current().to_bits().hash(&mut hasher);
            entity.selectable.is_selected().hash(&mut hasher);
            if let Some(state) = &entity.combat {
                state.forced_target.hash(&mut hasher);
                state.auto_target.hash(&mut hasher);
                state.fire_cooldown_remaining.to_bits().hash(&mut hasher);
            }
            if let Some(producer) = &entity.producer {
                producer.remaining.map(f32::to_bits).hash(&mut hasher);
            }
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in self.projectiles.iter() {
            projectile.id.hash(&mut hasher);
            projectile.target.hash(&mut hasher);
            projectile.position.x.to_bits().hash(&mut hasher);
            projectile.position.y.to_bits().hash(&mut hasher);
            projectile.position.z.to_bits().hash(&mut hasher);
        }

        self.selection().hash(&mut hasher);
        self.ledger.metal().hash(&mut hasher);
        self.ledger.energy().hash(&mut hasher);

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonState;
    use crate::math::Vec3;
    use crate::navigation::FlatNavigation;
    use crate::spatial::TopDownCamera;

    fn sim() -> Simulation<TopDownCamera, FlatNavigation> {
        Simulation::new(
            SimConfig::default(),
            TopDownCamera::default(),
            FlatNavigation::square(50.0),
        )
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = sim();
        let events = sim.tick(&PointerInput::default(), 0.1);
        assert_eq!(events.tick, 0);
        assert_eq!(sim.get_tick(), 1);
    }

    #[test]
    fn test_despawn_entity() {
        let mut sim = sim();
        let id = sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::ZERO));
        assert!(sim.despawn_entity(id).is_ok());
        assert!(sim.get_entity(id).is_none());
        assert!(matches!(
            sim.despawn_entity(id),
            Err(SimError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_dead_entities_removed_at_tick_end() {
        let mut sim = sim();
        let unit = sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::ZERO));
        let doomed = sim.spawn_entity(EntitySpawnParams::soldier(1, Vec3::new(30.0, 0.0, 0.0)));
        assert!(sim.set_forced_target(unit, Some(doomed)).unwrap());
        sim.registry
            .get_mut(doomed)
            .unwrap()
            .health
            .apply_damage(1_000.0);

        let events = sim.tick(&PointerInput::default(), 0.1);
        assert_eq!(events.deaths(), vec![doomed]);
        assert!(sim.get_entity(doomed).is_none());
        assert_eq!(sim.get_entity(unit).unwrap().combat.unwrap().forced_target, None);
    }

    #[test]
    fn test_set_team_on_stale_handle() {
        let mut sim = sim();
        let id = sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::ZERO));
        sim.set_team(id, 3).unwrap();
        assert_eq!(sim.get_entity(id).unwrap().team, 3);
        sim.despawn_entity(id).unwrap();
        assert!(sim.set_team(id, 1).is_err());
        assert!(sim.set_forced_target(id, None).is_err());
    }

    #[test]
    fn test_over_ui_skips_world_input() {
        let mut sim = sim();
        sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::ZERO));
        let at = sim.spatial().screen_point_of(Vec3::ZERO);

        sim.tick(&PointerInput::at(at).with_left(ButtonState::PRESS).over_ui(), 0.0);
        let events = sim.tick(
            &PointerInput::at(at).with_left(ButtonState::RELEASE).over_ui(),
            0.0,
        );
        assert!(events.last_selection().is_none());
        assert!(sim.selection().is_empty());
    }

    #[test]
    fn test_deterministic_hash() {
        let run = || {
            let mut sim = sim();
            sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::ZERO));
            sim.spawn_entity(EntitySpawnParams::soldier(1, Vec3::new(6.0, 0.0, 1.0)));
            for _ in 0..30 {
                sim.tick(&PointerInput::default(), 1.0 / 30.0);
            }
            sim.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_api_events_flush_with_next_tick() {
        let mut sim = sim();
        let building = sim.spawn_entity(EntitySpawnParams {
            producer: Some(crate::production::Producer::default()),
            ..EntitySpawnParams::building(0, Vec3::ZERO)
        });
        sim.start_production(building).unwrap();

        let events = sim.tick(&PointerInput::default(), 0.1);
        assert!(events
            .iter()
            .any(|event| matches!(event, SimEvent::ProductionStarted { .. })));
        assert_eq!(sim.resources().metal(), 150);
    }
}
