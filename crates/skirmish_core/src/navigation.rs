//! Navigation capability.
//!
//! Pathfinding is an external collaborator: the core only asks for the
//! nearest walkable point and hands out fire-and-forget move requests.
//! [`FlatNavigation`] is a reference implementation for an open,
//! obstacle-free rectangular field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{flatten, yaw_of, Vec2, Vec3};
use crate::registry::EntityRegistry;

/// Navigation services the core consumes.
pub trait Navigation {
    /// Nearest walkable point within `radius` of `point`, if any.
    fn clamp_to_walkable(&self, point: Vec3, radius: f32) -> Option<Vec3>;

    /// Start driving `entity` toward `destination`. Completion is not reported.
    fn move_agent_to(&mut self, entity: EntityId, destination: Vec3);

    /// Advance agents by `dt` seconds.
    fn advance(&mut self, _registry: &mut EntityRegistry, _dt: f32) {}

    /// Drop any state kept for a removed entity.
    fn forget_agent(&mut self, _entity: EntityId) {}
}

/// A move request as received by the navigation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Agent being moved.
    pub entity: EntityId,
    /// Requested destination.
    pub destination: Vec3,
}

/// Distance at which an agent counts as arrived.
pub const STOPPING_DISTANCE: f32 = 0.05;

/// Most move requests [`FlatNavigation`] remembers.
pub const HISTORY_CAPACITY: usize = 256;

/// Straight-line navigation over a rectangular walkable area on the ground.
#[derive(Debug, Clone, Default)]
pub struct FlatNavigation {
    min: Vec2,
    max: Vec2,
    destinations: BTreeMap<EntityId, Vec3>,
    history: Vec<MoveRequest>,
}

impl FlatNavigation {
    /// Walkable area spanning `min..=max` in world XZ.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            destinations: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Square walkable area of `half_extent` around the origin.
    #[must_use]
    pub fn square(half_extent: f32) -> Self {
        Self::new(Vec2::splat(-half_extent), Vec2::splat(half_extent))
    }

    /// Current destination of an agent, if it is still moving.
    #[must_use]
    pub fn destination_of(&self, entity: EntityId) -> Option<Vec3> {
        self.destinations.get(&entity).copied()
    }

    /// Recent move requests, oldest first. At most [`HISTORY_CAPACITY`]
    /// are kept; older ones are dropped.
    #[must_use]
    pub fn history(&self) -> &[MoveRequest] {
        &self.history
    }

    /// Forget the request history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn nearest_walkable(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            0.0,
            point.z.clamp(self.min.y, self.max.y),
        )
    }
}

impl Navigation for FlatNavigation {
    fn clamp_to_walkable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let nearest = self.nearest_walkable(point);
        (nearest.distance(point) <= radius.max(0.0)).then_some(nearest)
    }

    fn move_agent_to(&mut self, entity: EntityId, destination: Vec3) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.drain(..HISTORY_CAPACITY / 2);
        }
        self.history.push(MoveRequest {
            entity,
            destination,
        });
        self.destinations.insert(entity, destination);
    }

    fn advance(&mut self, registry: &mut EntityRegistry, dt: f32) {
        let dt = dt.max(0.0);
        self.destinations.retain(|&id, destination| {
            let Some(entity) = registry.get_mut(id) else {
                return false;
            };
            let position = entity.transform.position;
            let to = flatten(*destination - position);
            let distance = to.length();
            let step = entity.move_speed * dt;

            if distance <= STOPPING_DISTANCE || distance <= step {
                entity.transform.position = Vec3::new(destination.x, position.y, destination.z);
                return false;
            }
            if let Some(yaw) = yaw_of(to) {
                entity.transform.yaw = yaw;
            }
            entity.transform.position = position + to / distance * step;
            true
        });
    }

    fn forget_agent(&mut self, entity: EntityId) {
        self.destinations.remove(&entity);
    }
}
