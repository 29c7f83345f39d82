//! Notifications emitted by the simulation.
//!
//! Systems push events into a queue while they run; the queue is drained
//! into [`TickEvents`] once the tick has fully settled, so consumers (UI
//! panels, audio, logs) never observe a half-applied mutation.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, TeamId};
use crate::math::{ScreenRect, Vec2, Vec3};

/// Identifier of an in-flight projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u64);

/// A single notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// The selection set changed; carries the full set in selection order.
    SelectionChanged {
        /// Current selection, first-selected first.
        selection: Vec<EntityId>,
    },
    /// An entity's selection highlight turned on or off.
    SelectionHighlight {
        /// Affected entity.
        entity: EntityId,
        /// New highlight state.
        selected: bool,
    },
    /// Drag threshold exceeded; start drawing the selection box.
    SelectionBoxBegan {
        /// Screen position where the button went down.
        start: Vec2,
    },
    /// The selection box was resized.
    SelectionBoxDragged {
        /// Current box in screen pixels.
        rect: ScreenRect,
    },
    /// The button was released; hide the selection box.
    SelectionBoxEnded,
    /// Selected units were ordered to attack a target.
    AttackOrdered {
        /// Forced target.
        target: EntityId,
        /// Units that accepted the target.
        attackers: Vec<EntityId>,
    },
    /// A unit was sent to a destination by a player move order.
    MoveOrdered {
        /// Ordered unit.
        entity: EntityId,
        /// Final destination including any spread offset.
        destination: Vec3,
    },
    /// A unit fired a projectile.
    ProjectileFired {
        /// New projectile.
        projectile: ProjectileId,
        /// Firing unit.
        shooter: EntityId,
        /// Homing target.
        target: EntityId,
    },
    /// A projectile reached its target's hit radius and was consumed.
    ProjectileImpact {
        /// Consumed projectile.
        projectile: ProjectileId,
        /// Entity that was reached.
        target: EntityId,
        /// Damage applied (zero when the target was allied).
        damage: f32,
    },
    /// A projectile lost its target and was removed without effect.
    ProjectileFizzled {
        /// Removed projectile.
        projectile: ProjectileId,
    },
    /// A projectile exceeded its lifetime.
    ProjectileExpired {
        /// Removed projectile.
        projectile: ProjectileId,
    },
    /// Health was removed from an entity.
    DamageApplied {
        /// Damaged entity.
        target: EntityId,
        /// Health removed.
        amount: f32,
        /// Health left afterwards.
        remaining: f32,
    },
    /// An entity reached zero health and was removed at the tick boundary.
    EntityDied {
        /// Removed entity.
        entity: EntityId,
        /// Its team.
        team: TeamId,
    },
    /// Resource balances changed.
    ResourcesChanged {
        /// Metal balance.
        metal: u32,
        /// Energy balance.
        energy: u32,
    },
    /// A building started producing a unit.
    ProductionStarted {
        /// Producing building.
        building: EntityId,
    },
    /// A building finished producing a unit.
    ProductionCompleted {
        /// Producing building.
        building: EntityId,
        /// Spawned unit.
        unit: EntityId,
    },
}

/// Pending notifications for the current tick.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Events generated during a simulation tick, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick that produced these events.
    pub tick: u64,
    /// Events in the order they were emitted.
    pub events: Vec<SimEvent>,
}

impl TickEvents {
    /// Iterate over all events.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    /// The last selection set reported this tick, if the selection changed.
    #[must_use]
    pub fn last_selection(&self) -> Option<&[EntityId]> {
        self.events.iter().rev().find_map(|event| match event {
            SimEvent::SelectionChanged { selection } => Some(selection.as_slice()),
            _ => None,
        })
    }

    /// Number of selection-changed notifications this tick.
    #[must_use]
    pub fn selection_change_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SimEvent::SelectionChanged { .. }))
            .count()
    }

    /// Entities that died this tick.
    #[must_use]
    pub fn deaths(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::EntityDied { entity, .. } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    /// Shooters of every projectile fired this tick.
    #[must_use]
    pub fn shooters(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::ProjectileFired { shooter, .. } => Some(*shooter),
                _ => None,
            })
            .collect()
    }

    /// Move orders issued this tick as `(unit, destination)` pairs.
    #[must_use]
    pub fn move_orders(&self) -> Vec<(EntityId, Vec3)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::MoveOrdered {
                    entity,
                    destination,
                } => Some((*entity, *destination)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = EventQueue::new();
        queue.push(SimEvent::SelectionBoxEnded);
        assert_eq!(queue.len(), 1);
        let drained = queue.drain();
        assert_eq!(drained, vec![SimEvent::SelectionBoxEnded]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_last_selection_prefers_latest() {
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        let events = TickEvents {
            tick: 3,
            events: vec![
                SimEvent::SelectionChanged { selection: vec![a] },
                SimEvent::SelectionBoxEnded,
                SimEvent::SelectionChanged {
                    selection: vec![a, b],
                },
            ],
        };
        assert_eq!(events.last_selection(), Some(&[a, b][..]));
        assert_eq!(events.selection_change_count(), 2);
        assert!(events.deaths().is_empty());
    }
}
