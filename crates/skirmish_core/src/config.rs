//! Simulation configuration.
//!
//! All values have prototype defaults, so a config file only needs the
//! fields it changes:
//!
//! ```ron
//! SimConfig(
//!     selection: (drag_threshold_pixels: 8.0),
//!     rng_seed: 42,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::economy::EconomyConfig;
use crate::error::{Result, SimError};
use crate::math::non_negative;

/// Selection controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Pointer travel (pixels) before a press becomes a box drag.
    pub drag_threshold_pixels: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_pixels: 5.0,
        }
    }
}

/// Order dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Search radius when snapping a move click to walkable ground.
    pub nav_mesh_clamp_radius: f32,
    /// Radius of the random spread applied per unit in group moves.
    pub multi_select_offset_radius: f32,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            nav_mesh_clamp_radius: 0.5,
            multi_select_offset_radius: 1.0,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Selection tuning.
    pub selection: SelectionConfig,
    /// Order tuning.
    pub orders: OrderConfig,
    /// Starting resources and passive income.
    pub economy: EconomyConfig,
    /// Seed for the order-spread RNG.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            orders: OrderConfig::default(),
            economy: EconomyConfig::default(),
            rng_seed: 0,
        }
    }
}

impl SimConfig {
    /// Parse a config from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: SimConfig = ron::from_str(ron)?;
        Ok(config.sanitized())
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Copy with negative or non-finite radii clamped to zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = Self {
            selection: SelectionConfig {
                drag_threshold_pixels: non_negative(self.selection.drag_threshold_pixels),
            },
            orders: OrderConfig {
                nav_mesh_clamp_radius: non_negative(self.orders.nav_mesh_clamp_radius),
                multi_select_offset_radius: non_negative(self.orders.multi_select_offset_radius),
            },
            economy: self.economy.sanitized(),
            rng_seed: self.rng_seed,
        };
        if clean != self {
            tracing::warn!(?clean, "Clamped invalid simulation config values");
        }
        clean
    }
}
