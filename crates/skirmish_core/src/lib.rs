//! # Skirmish Core
//!
//! Simulation core for a real-time-strategy skirmish prototype.
//!
//! This crate contains the gameplay rules only:
//! - No rendering
//! - No IO beyond loading config files
//! - No global state (every subsystem lives in a [`simulation::Simulation`])
//! - No system randomness (group-move spread uses a seeded RNG)
//!
//! The engine supplies scene queries and pathfinding through the
//! [`spatial::SpatialQuery`] and [`navigation::Navigation`] traits. Simple
//! reference implementations of both ship with the crate for tests and the
//! headless runner.
//!
//! ## Crate Structure
//!
//! - [`registry`] - Entity storage with generation-checked handles
//! - [`components`] - Health, selection flag, weapon tuning, combat memory
//! - [`selection`] - Click / shift-click / box selection state machine
//! - [`orders`] - Right-click attack and move orders
//! - [`combat`] - Per-unit targeting, pursuit and firing
//! - [`projectile`] - Homing projectiles and damage
//! - [`economy`] / [`production`] - Resources and building production
//! - [`simulation`] - The tick loop tying it all together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod input;
pub mod math;
pub mod navigation;
pub mod orders;
pub mod production;
pub mod projectile;
pub mod registry;
pub mod selection;
pub mod simulation;
pub mod spatial;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::{
        CombatState, EntityId, EntityKind, Health, ProjectileStats, Selectable, TeamId,
        Transform, WeaponStats,
    };
    pub use crate::config::{OrderConfig, SelectionConfig, SimConfig};
    pub use crate::economy::{EconomyConfig, ResourceKind, ResourceLedger};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{ProjectileId, SimEvent, TickEvents};
    pub use crate::input::{ButtonState, PointerInput};
    pub use crate::math::{ScreenRect, Vec2, Vec3};
    pub use crate::navigation::{FlatNavigation, Navigation};
    pub use crate::orders::Order;
    pub use crate::production::{Producer, ProducerStats, UnitTemplate};
    pub use crate::registry::{Entity, EntityRegistry, EntitySpawnParams};
    pub use crate::selection::SelectionSet;
    pub use crate::simulation::Simulation;
    pub use crate::spatial::{Ray, SpatialQuery, TopDownCamera};
}
