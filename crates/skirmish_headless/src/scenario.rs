//! Scenario loading and configuration.
//!
//! A scenario is the full input of a headless run: simulation config,
//! camera, walkable area, starting entities and a scripted input timeline.
//! Everything has a default, so a RON file only spells out what it needs:
//!
//! ```ron
//! Scenario(
//!     name: "Two on one",
//!     entities: [
//!         (name: "Soldier", team: 0, position: (-4.0, 0.0, 0.0), weapon: Some(())),
//!         (name: "Soldier", team: 0, position: (-4.0, 0.0, 2.0), weapon: Some(())),
//!         (team: 1, position: (4.0, 0.0, 1.0)),
//!     ],
//!     timeline: [
//!         (tick: 2, action: Drag(from: (-6.0, -2.0), to: (-2.0, 4.0))),
//!         (tick: 10, action: RightClick(at: (4.0, 1.0))),
//!     ],
//!     ticks: 300,
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::config::SimConfig;
use skirmish_core::input::{ButtonState, PointerInput};
use skirmish_core::math::{Vec2, Vec3};
use skirmish_core::navigation::FlatNavigation;
use skirmish_core::production::Producer;
use skirmish_core::registry::EntitySpawnParams;
use skirmish_core::spatial::TopDownCamera;

/// Default number of ticks to run.
pub const DEFAULT_TICKS: u64 = 600;

/// Default tick length (60 Hz).
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Walkable rectangle on the ground plane, in world XZ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkableBounds {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Default for WalkableBounds {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-50.0),
            max: Vec2::splat(50.0),
        }
    }
}

impl WalkableBounds {
    /// Navigation over this area.
    #[must_use]
    pub fn navigation(&self) -> FlatNavigation {
        FlatNavigation::new(self.min, self.max)
    }
}

/// A scripted player action. World actions are given as ground `(x, z)`
/// coordinates and converted to screen input through the scenario camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Left click: press on the scheduled tick, release on the next.
    Click {
        /// Ground point.
        at: (f32, f32),
        /// Hold shift.
        #[serde(default)]
        shift: bool,
    },
    /// Box drag: press, hold at the far corner, release; three ticks.
    Drag {
        /// First corner.
        from: (f32, f32),
        /// Second corner.
        to: (f32, f32),
        /// Hold shift.
        #[serde(default)]
        shift: bool,
    },
    /// Right click on a ground point.
    RightClick {
        /// Ground point.
        at: (f32, f32),
    },
    /// A raw pointer snapshot in screen pixels, for one tick.
    Pointer(PointerInput),
}

/// An action scheduled on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Tick the action starts on.
    pub tick: u64,
    /// What the player does.
    pub action: Action,
}

/// A production request scheduled on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledProduction {
    /// Tick to issue the request on.
    pub tick: u64,
    /// Index into [`Scenario::entities`] of the producing building.
    pub building: usize,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Simulation tuning.
    pub config: SimConfig,
    /// Camera the scripted input is expressed through.
    pub camera: TopDownCamera,
    /// Walkable ground.
    pub walkable: WalkableBounds,
    /// Entities present at tick 0, in spawn order.
    pub entities: Vec<EntitySpawnParams>,
    /// Scripted player input.
    pub timeline: Vec<ScriptedInput>,
    /// Scripted production requests.
    pub production: Vec<ScheduledProduction>,
    /// Ticks to run.
    pub ticks: u64,
    /// Seconds per tick.
    pub dt: f32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Empty".to_string(),
            description: String::new(),
            config: SimConfig::default(),
            camera: TopDownCamera::default(),
            walkable: WalkableBounds::default(),
            entities: Vec::new(),
            timeline: Vec::new(),
            production: Vec::new(),
            ticks: DEFAULT_TICKS,
            dt: DEFAULT_DT,
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Built-in demo: a squad with a factory is box-selected, ordered onto
    /// an enemy and reinforced while the fight plays out.
    #[must_use]
    pub fn demo() -> Self {
        let mut entities = vec![EntitySpawnParams {
            name: "Factory".to_string(),
            producer: Some(Producer::default()),
            ..EntitySpawnParams::building(0, Vec3::new(-14.0, 0.0, 0.0))
        }];
        for i in 0..3 {
            let z = i as f32 * 2.0 - 2.0;
            entities.push(EntitySpawnParams::soldier(0, Vec3::new(-8.0, 0.0, z)));
        }
        for i in 0..3 {
            let z = i as f32 * 2.5 - 2.5;
            entities.push(EntitySpawnParams::soldier(1, Vec3::new(10.0, 0.0, z)));
        }

        Self {
            name: "Demo skirmish".to_string(),
            description: "Three soldiers and a factory against three soldiers".to_string(),
            config: SimConfig {
                rng_seed: 7,
                ..SimConfig::default()
            },
            entities,
            timeline: vec![
                ScriptedInput {
                    tick: 2,
                    action: Action::Drag {
                        from: (-10.0, -4.0),
                        to: (-6.0, 4.0),
                        shift: false,
                    },
                },
                ScriptedInput {
                    tick: 8,
                    action: Action::RightClick { at: (10.0, 0.0) },
                },
            ],
            production: vec![ScheduledProduction {
                tick: 1,
                building: 0,
            }],
            ticks: 900,
            ..Self::default()
        }
    }

    /// Expand the timeline into one pointer snapshot per tick.
    ///
    /// When actions overlap, the later entry in the timeline wins the tick.
    #[must_use]
    pub fn pointer_schedule(&self) -> BTreeMap<u64, PointerInput> {
        let mut schedule = BTreeMap::new();
        let screen = |(x, z): (f32, f32)| self.camera.screen_point_of(Vec3::new(x, 0.0, z));
        let shifted = |input: PointerInput, shift: bool| {
            if shift {
                input.with_shift()
            } else {
                input
            }
        };

        for scripted in &self.timeline {
            let tick = scripted.tick;
            match scripted.action {
                Action::Click { at, shift } => {
                    let at = screen(at);
                    let press = PointerInput::at(at).with_left(ButtonState::PRESS);
                    let release = PointerInput::at(at).with_left(ButtonState::RELEASE);
                    schedule.insert(tick, shifted(press, shift));
                    schedule.insert(tick + 1, shifted(release, shift));
                }
                Action::Drag { from, to, shift } => {
                    let (start, end) = (screen(from), screen(to));
                    let press = PointerInput::at(start).with_left(ButtonState::PRESS);
                    let hold = PointerInput::at(end).with_left(ButtonState::HOLD);
                    let release = PointerInput::at(end).with_left(ButtonState::RELEASE);
                    schedule.insert(tick, shifted(press, shift));
                    schedule.insert(tick + 1, shifted(hold, shift));
                    schedule.insert(tick + 2, shifted(release, shift));
                }
                Action::RightClick { at } => {
                    schedule.insert(tick, PointerInput::at(screen(at)).with_right_click());
                }
                Action::Pointer(input) => {
                    schedule.insert(tick, input);
                }
            }
        }
        schedule
    }
}
