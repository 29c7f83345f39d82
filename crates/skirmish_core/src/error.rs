//! Error types for the skirmish simulation.
//!
//! The tick loop itself never fails: missing references, empty selections
//! and invalid targets are silent no-ops. These errors only surface from the
//! explicit API (despawning, production requests, configuration loading)
//! where the caller may want to know why nothing happened.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for the simulation API.
#[derive(Debug, Error)]
pub enum SimError {
    /// The referenced entity is not (or no longer) in the registry.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but has no production capability.
    #[error("Entity {0} cannot produce units")]
    NotAProducer(EntityId),

    /// The building already has a unit in production.
    #[error("Entity {0} is already producing")]
    AlreadyProducing(EntityId),

    /// Not enough resources to pay the requested cost.
    #[error("Insufficient resources: need {metal} metal and {energy} energy, have {available_metal} and {available_energy}")]
    InsufficientResources {
        /// Metal required.
        metal: u32,
        /// Energy required.
        energy: u32,
        /// Metal available.
        available_metal: u32,
        /// Energy available.
        available_energy: u32,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration data.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}
