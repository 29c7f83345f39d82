//! Order dispatcher.
//!
//! A right-click with a non-empty selection becomes either an attack order
//! (clicked an enemy unit) or a move order (clicked walkable ground).
//! Anything else is dropped.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combat::set_forced_target;
use crate::components::{EntityId, TeamId};
use crate::config::OrderConfig;
use crate::events::{EventQueue, SimEvent};
use crate::input::PointerInput;
use crate::math::{random_ground_offset, Vec3};
use crate::navigation::Navigation;
use crate::registry::EntityRegistry;
use crate::spatial::{Ray, SpatialQuery};

/// Team used when no selected entity can vouch for one.
pub const FALLBACK_TEAM: TeamId = 0;

/// An order that was carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    /// Selected units were given a forced target.
    Attack {
        /// The enemy clicked on.
        target: EntityId,
        /// Units that accepted it.
        attackers: Vec<EntityId>,
    },
    /// Selected units were sent to the ground.
    Move {
        /// Walkable point nearest the click.
        destination: Vec3,
        /// Each unit with its own destination.
        moves: Vec<(EntityId, Vec3)>,
    },
}

/// Translates right-clicks into orders.
#[derive(Debug, Clone)]
pub struct OrderDispatcher {
    config: OrderConfig,
    rng: ChaCha8Rng,
}

impl OrderDispatcher {
    /// Create a dispatcher; `seed` drives the group-move spread.
    #[must_use]
    pub fn new(config: OrderConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Team the player is acting as: the team of the first live selected entity.
    #[must_use]
    pub fn acting_team(selection: &[EntityId], registry: &EntityRegistry) -> TeamId {
        selection
            .iter()
            .filter_map(|&id| registry.get(id))
            .find(|entity| entity.is_alive())
            .map_or(FALLBACK_TEAM, |entity| entity.team)
    }

    /// Handle one tick of right-button input.
    ///
    /// Returns the order that was issued, if any.
    pub fn dispatch<S, N>(
        &mut self,
        input: &PointerInput,
        selection: &[EntityId],
        registry: &mut EntityRegistry,
        spatial: &S,
        nav: &mut N,
        events: &mut EventQueue,
    ) -> Option<Order>
    where
        S: SpatialQuery + ?Sized,
        N: Navigation + ?Sized,
    {
        if !input.right_just_pressed || selection.is_empty() {
            return None;
        }

        let ray = spatial.screen_point_to_ray(input.position);
        if let Some(order) = Self::try_attack(&ray, selection, registry, spatial, events) {
            return Some(order);
        }
        self.try_move(&ray, selection, registry, spatial, nav, events)
    }

    fn try_attack<S: SpatialQuery + ?Sized>(
        ray: &Ray,
        selection: &[EntityId],
        registry: &mut EntityRegistry,
        spatial: &S,
        events: &mut EventQueue,
    ) -> Option<Order> {
        let target = spatial.raycast_selectable(registry, ray)?;
        let hit = registry.get(target)?;
        let team = Self::acting_team(selection, registry);
        if !hit.is_unit() || !hit.is_alive() || hit.team == team {
            return None;
        }

        let units: Vec<EntityId> = selection
            .iter()
            .copied()
            .filter(|&id| registry.get(id).is_some_and(|entity| entity.is_unit()))
            .collect();
        let attackers: Vec<EntityId> = units
            .into_iter()
            .filter(|&id| set_forced_target(registry, id, Some(target)))
            .collect();

        tracing::debug!(%target, attackers = attackers.len(), "Attack order");
        events.push(SimEvent::AttackOrdered {
            target,
            attackers: attackers.clone(),
        });
        Some(Order::Attack { target, attackers })
    }

    fn try_move<S, N>(
        &mut self,
        ray: &Ray,
        selection: &[EntityId],
        registry: &mut EntityRegistry,
        spatial: &S,
        nav: &mut N,
        events: &mut EventQueue,
    ) -> Option<Order>
    where
        S: SpatialQuery + ?Sized,
        N: Navigation + ?Sized,
    {
        let ground = spatial.raycast_ground(ray)?;
        let Some(destination) = nav.clamp_to_walkable(ground, self.config.nav_mesh_clamp_radius)
        else {
            tracing::debug!(?ground, "Move click off walkable ground");
            return None;
        };

        let units: Vec<EntityId> = selection
            .iter()
            .copied()
            .filter(|&id| registry.get(id).is_some_and(|entity| entity.is_unit()))
            .collect();
        let spread = units.len() > 1 && self.config.multi_select_offset_radius > 0.0;

        let mut moves = Vec::with_capacity(units.len());
        for id in units {
            let mut unit_destination = destination;
            if spread {
                unit_destination +=
                    random_ground_offset(&mut self.rng, self.config.multi_select_offset_radius);
            }
            nav.move_agent_to(id, unit_destination);
            set_forced_target(registry, id, None);
            events.push(SimEvent::MoveOrdered {
                entity: id,
                destination: unit_destination,
            });
            moves.push((id, unit_destination));
        }

        tracing::debug!(?destination, units = moves.len(), "Move order");
        Some(Order::Move { destination, moves })
    }
}

impl Default for OrderDispatcher {
    fn default() -> Self {
        Self::new(OrderConfig::default(), 0)
    }
}
