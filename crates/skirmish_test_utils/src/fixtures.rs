//! Test fixtures and helpers.
//!
//! A [`Harness`] wraps a simulation wired to the reference collaborators
//! (top-down camera, flat navigation) and drives it with scripted pointer
//! input expressed in world coordinates.

use skirmish_core::components::{CombatState, EntityId, TeamId};
use skirmish_core::config::SimConfig;
use skirmish_core::events::TickEvents;
use skirmish_core::input::{ButtonState, PointerInput};
use skirmish_core::math::{Vec2, Vec3};
use skirmish_core::navigation::FlatNavigation;
use skirmish_core::registry::{Entity, EntitySpawnParams};
use skirmish_core::simulation::Simulation;
use skirmish_core::spatial::TopDownCamera;

/// Simulation type used throughout the tests.
pub type TestSim = Simulation<TopDownCamera, FlatNavigation>;

/// Half size of the walkable test arena.
pub const ARENA_HALF_EXTENT: f32 = 50.0;

/// Tick length used by the harness (30 Hz).
pub const DT: f32 = 1.0 / 30.0;

/// Create a simulation with default config over the test arena.
#[must_use]
pub fn test_sim() -> TestSim {
    test_sim_with(SimConfig::default())
}

/// Create a simulation with `config` over the test arena.
#[must_use]
pub fn test_sim_with(config: SimConfig) -> TestSim {
    Simulation::new(
        config,
        TopDownCamera::default(),
        FlatNavigation::square(ARENA_HALF_EXTENT),
    )
}

/// Left button pressed at `position`.
#[must_use]
pub fn press_at(position: Vec2) -> PointerInput {
    PointerInput::at(position).with_left(ButtonState::PRESS)
}

/// Left button held at `position`.
#[must_use]
pub fn hold_at(position: Vec2) -> PointerInput {
    PointerInput::at(position).with_left(ButtonState::HOLD)
}

/// Left button released at `position`.
#[must_use]
pub fn release_at(position: Vec2) -> PointerInput {
    PointerInput::at(position).with_left(ButtonState::RELEASE)
}

fn shifted(input: PointerInput, shift: bool) -> PointerInput {
    if shift {
        input.with_shift()
    } else {
        input
    }
}

/// A simulation plus input helpers.
#[derive(Debug, Clone)]
pub struct Harness {
    /// The simulation under test.
    pub sim: TestSim,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Harness over a default simulation.
    #[must_use]
    pub fn new() -> Self {
        Self { sim: test_sim() }
    }

    /// Harness with a custom config.
    #[must_use]
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            sim: test_sim_with(config),
        }
    }

    /// Spawn an entity.
    pub fn spawn(&mut self, params: EntitySpawnParams) -> EntityId {
        self.sim.spawn_entity(params)
    }

    /// Spawn an armed unit on the ground at `(x, z)`.
    pub fn soldier(&mut self, team: TeamId, x: f32, z: f32) -> EntityId {
        self.spawn(EntitySpawnParams::soldier(team, Vec3::new(x, 0.0, z)))
    }

    /// Spawn an unarmed unit on the ground at `(x, z)`.
    pub fn dummy(&mut self, team: TeamId, x: f32, z: f32) -> EntityId {
        self.spawn(EntitySpawnParams {
            team,
            position: Vec3::new(x, 0.0, z),
            ..Default::default()
        })
    }

    /// Spawn a building on the ground at `(x, z)`.
    pub fn building(&mut self, team: TeamId, x: f32, z: f32) -> EntityId {
        self.spawn(EntitySpawnParams::building(team, Vec3::new(x, 0.0, z)))
    }

    /// Screen pixel above a ground point.
    #[must_use]
    pub fn screen(&self, x: f32, z: f32) -> Vec2 {
        self.sim.spatial().screen_point_of(Vec3::new(x, 0.0, z))
    }

    /// Resolve an entity that must exist.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> &Entity {
        self.sim
            .get_entity(id)
            .unwrap_or_else(|| panic!("entity {id} is gone"))
    }

    /// Combat memory of a unit that must exist and be armed.
    ///
    /// # Panics
    ///
    /// Panics if the unit is gone or has no combat state.
    #[must_use]
    pub fn combat(&self, id: EntityId) -> CombatState {
        self.entity(id)
            .combat
            .unwrap_or_else(|| panic!("entity {id} cannot fight"))
    }

    /// Advance one tick with `input`.
    pub fn step(&mut self, input: &PointerInput) -> TickEvents {
        self.sim.tick(input, DT)
    }

    /// Advance one tick with the pointer idle.
    pub fn idle(&mut self) -> TickEvents {
        self.step(&PointerInput::default())
    }

    /// Advance `ticks` idle ticks, returning every tick's events.
    pub fn run(&mut self, ticks: usize) -> Vec<TickEvents> {
        (0..ticks).map(|_| self.idle()).collect()
    }

    /// Left-click the ground point `(x, z)`; returns the release tick's events.
    pub fn click(&mut self, x: f32, z: f32, shift: bool) -> TickEvents {
        let at = self.screen(x, z);
        self.step(&shifted(press_at(at), shift));
        self.step(&shifted(release_at(at), shift))
    }

    /// Drag a selection box between two ground points; returns the release
    /// tick's events.
    pub fn drag(&mut self, from: (f32, f32), to: (f32, f32), shift: bool) -> TickEvents {
        let start = self.screen(from.0, from.1);
        let end = self.screen(to.0, to.1);
        self.step(&shifted(press_at(start), shift));
        self.step(&shifted(hold_at(end), shift));
        self.step(&shifted(release_at(end), shift))
    }

    /// Right-click the ground point `(x, z)`.
    pub fn right_click(&mut self, x: f32, z: f32) -> TickEvents {
        let at = self.screen(x, z);
        self.step(&PointerInput::at(at).with_right_click())
    }

    /// Select exactly `ids` by clicking the first and shift-clicking the rest.
    pub fn select(&mut self, ids: &[EntityId]) {
        for (i, &id) in ids.iter().enumerate() {
            let position = self.entity(id).position();
            self.click(position.x, position.z, i > 0);
        }
    }
}
