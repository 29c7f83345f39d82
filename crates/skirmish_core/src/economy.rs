//! Resource bookkeeping.
//!
//! Two integer stockpiles (metal and energy) with all-or-nothing spending
//! and fractional passive income that is credited in whole units.

use serde::{Deserialize, Serialize};

use crate::events::{EventQueue, SimEvent};
use crate::math::non_negative;

/// Resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Metal.
    Metal,
    /// Energy.
    Energy,
}

/// Starting stockpiles and passive income.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Metal at game start.
    pub start_metal: u32,
    /// Energy at game start.
    pub start_energy: u32,
    /// Metal credited per second.
    pub passive_metal_per_second: f32,
    /// Energy credited per second.
    pub passive_energy_per_second: f32,
}

impl EconomyConfig {
    /// Copy with negative income rates clamped to zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            passive_metal_per_second: non_negative(self.passive_metal_per_second),
            passive_energy_per_second: non_negative(self.passive_energy_per_second),
            ..self
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            start_metal: 200,
            start_energy: 200,
            passive_metal_per_second: 0.0,
            passive_energy_per_second: 0.0,
        }
    }
}

/// The player's resource stockpiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    metal: u32,
    energy: u32,
    metal_rate: f32,
    energy_rate: f32,
    metal_fraction: f32,
    energy_fraction: f32,
}

impl ResourceLedger {
    /// Create a ledger from config.
    #[must_use]
    pub fn new(config: EconomyConfig) -> Self {
        let config = config.sanitized();
        Self {
            metal: config.start_metal,
            energy: config.start_energy,
            metal_rate: config.passive_metal_per_second,
            energy_rate: config.passive_energy_per_second,
            metal_fraction: 0.0,
            energy_fraction: 0.0,
        }
    }

    /// Current metal.
    #[must_use]
    pub const fn metal(&self) -> u32 {
        self.metal
    }

    /// Current energy.
    #[must_use]
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Check if both costs can be paid.
    #[must_use]
    pub const fn can_afford(&self, metal: u32, energy: u32) -> bool {
        self.metal >= metal && self.energy >= energy
    }

    /// Pay both costs, or nothing. Returns whether the payment went through.
    pub fn try_spend(&mut self, metal: u32, energy: u32, events: &mut EventQueue) -> bool {
        if !self.can_afford(metal, energy) {
            tracing::debug!(
                metal,
                energy,
                have_metal = self.metal,
                have_energy = self.energy,
                "Cannot afford cost"
            );
            return false;
        }
        self.metal -= metal;
        self.energy -= energy;
        self.notify(events);
        true
    }

    /// Add (or with a negative amount, remove) resources; never drops below zero.
    pub fn add(&mut self, kind: ResourceKind, amount: i64, events: &mut EventQueue) {
        if amount == 0 {
            return;
        }
        let slot = match kind {
            ResourceKind::Metal => &mut self.metal,
            ResourceKind::Energy => &mut self.energy,
        };
        let updated = (i64::from(*slot) + amount).clamp(0, i64::from(u32::MAX));
        *slot = u32::try_from(updated).unwrap_or(u32::MAX);
        self.notify(events);
    }

    /// Accumulate passive income for `dt` seconds.
    pub fn tick(&mut self, dt: f32, events: &mut EventQueue) {
        let dt = non_negative(dt);
        let metal = Self::accrue(&mut self.metal_fraction, self.metal_rate, dt);
        let energy = Self::accrue(&mut self.energy_fraction, self.energy_rate, dt);
        if metal > 0 {
            self.add(ResourceKind::Metal, metal, events);
        }
        if energy > 0 {
            self.add(ResourceKind::Energy, energy, events);
        }
    }

    fn accrue(fraction: &mut f32, rate: f32, dt: f32) -> i64 {
        if rate <= 0.0 {
            return 0;
        }
        *fraction += rate * dt;
        if *fraction < 1.0 {
            return 0;
        }
        let whole = fraction.floor();
        *fraction -= whole;
        // whole is finite and positive here
        #[allow(clippy::cast_possible_truncation)]
        {
            whole as i64
        }
    }

    fn notify(&self, events: &mut EventQueue) {
        events.push(SimEvent::ResourcesChanged {
            metal: self.metal,
            energy: self.energy,
        });
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(EconomyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut events = EventQueue::new();
        let mut ledger = ResourceLedger::default();

        assert!(ledger.try_spend(50, 20, &mut events));
        assert_eq!((ledger.metal(), ledger.energy()), (150, 180));
        assert_eq!(events.len(), 1);

        assert!(!ledger.try_spend(10, 500, &mut events));
        assert_eq!((ledger.metal(), ledger.energy()), (150, 180));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_add_never_goes_negative() {
        let mut events = EventQueue::new();
        let mut ledger = ResourceLedger::default();
        ledger.add(ResourceKind::Metal, -1_000, &mut events);
        assert_eq!(ledger.metal(), 0);
        ledger.add(ResourceKind::Energy, 0, &mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_passive_income_credits_whole_units() {
        let mut events = EventQueue::new();
        let mut ledger = ResourceLedger::new(EconomyConfig {
            start_metal: 0,
            start_energy: 0,
            passive_metal_per_second: 2.5,
            passive_energy_per_second: 0.0,
        });

        ledger.tick(0.2, &mut events);
        assert_eq!(ledger.metal(), 0);
        assert!(events.is_empty());

        ledger.tick(0.2, &mut events);
        assert_eq!(ledger.metal(), 1);

        ledger.tick(1.0, &mut events);
        assert_eq!(ledger.metal(), 3);
        assert_eq!(ledger.energy(), 0);
    }
}
