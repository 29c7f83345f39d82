//! Headless scenario runner.
//!
//! Drives a [`Simulation`] through a [`Scenario`] and writes the event log
//! as JSON lines, one object per event, followed by a summary line:
//!
//! ```text
//! {"type":"event","tick":2,"event":"selection_box_began","start":[440.0,280.0]}
//! {"type":"event","tick":31,"event":"entity_died","entity":{"index":5,"generation":0},"team":1}
//! {"type":"summary","ticks":900,"state_hash":1234,"survivors":{"0":4},...}
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use skirmish_core::components::{EntityId, TeamId};
use skirmish_core::events::{SimEvent, TickEvents};
use skirmish_core::input::PointerInput;
use skirmish_core::navigation::FlatNavigation;
use skirmish_core::simulation::Simulation;
use skirmish_core::spatial::TopDownCamera;

use crate::scenario::Scenario;

/// Simulation type the runner drives.
pub type HeadlessSim = Simulation<TopDownCamera, FlatNavigation>;

/// Command-line overrides for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunOptions {
    /// Replace the scenario's tick count.
    pub ticks: Option<u64>,
    /// Replace the scenario's tick length.
    pub dt: Option<f32>,
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Hash of the final simulation state.
    pub state_hash: u64,
    /// Live entities per team.
    pub survivors: BTreeMap<TeamId, usize>,
    /// Deaths over the whole run.
    pub deaths: usize,
    /// Shots fired over the whole run.
    pub shots_fired: usize,
    /// Final metal balance.
    pub metal: u32,
    /// Final energy balance.
    pub energy: u32,
}

/// An event tagged with the tick it was emitted on.
#[derive(Debug, Clone, Serialize)]
pub struct EventLine<'a> {
    /// Tick the event belongs to.
    pub tick: u64,
    /// The event itself.
    #[serde(flatten)]
    pub event: &'a SimEvent,
}

/// One line of runner output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    /// An event emitted during a tick.
    Event(EventLine<'a>),
    /// The end-of-run summary.
    Summary(&'a RunSummary),
}

impl OutputLine<'_> {
    /// Serialize to a JSON line (with trailing newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

/// Runs one scenario to completion.
#[derive(Debug)]
pub struct ScenarioRunner {
    sim: HeadlessSim,
    pointer: BTreeMap<u64, PointerInput>,
    production: BTreeMap<u64, Vec<EntityId>>,
    ticks: u64,
    dt: f32,
    deaths: usize,
    shots_fired: usize,
}

impl ScenarioRunner {
    /// Build the world described by `scenario`.
    #[must_use]
    pub fn new(scenario: &Scenario, options: RunOptions) -> Self {
        let mut sim = Simulation::new(
            scenario.config.clone(),
            scenario.camera,
            scenario.walkable.navigation(),
        );
        let spawned: Vec<EntityId> = scenario
            .entities
            .iter()
            .map(|params| sim.spawn_entity(params.clone()))
            .collect();

        let mut production: BTreeMap<u64, Vec<EntityId>> = BTreeMap::new();
        for request in &scenario.production {
            match spawned.get(request.building) {
                Some(&building) => production.entry(request.tick).or_default().push(building),
                None => tracing::warn!(
                    index = request.building,
                    "Production request for an entity the scenario does not place"
                ),
            }
        }

        tracing::info!(
            name = %scenario.name,
            entities = spawned.len(),
            "Scenario loaded"
        );

        Self {
            sim,
            pointer: scenario.pointer_schedule(),
            production,
            ticks: options.ticks.unwrap_or(scenario.ticks),
            dt: options.dt.unwrap_or(scenario.dt),
            deaths: 0,
            shots_fired: 0,
        }
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &HeadlessSim {
        &self.sim
    }

    /// Ticks this run will simulate in total.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    /// Check whether every scheduled tick has run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.sim.get_tick() >= self.ticks
    }

    /// Advance one tick, applying whatever the scenario schedules for it.
    pub fn step(&mut self) -> TickEvents {
        let tick = self.sim.get_tick();

        if let Some(buildings) = self.production.remove(&tick) {
            for building in buildings {
                if let Err(err) = self.sim.start_production(building) {
                    tracing::warn!(%building, %err, "Scheduled production refused");
                }
            }
        }

        let input = self.pointer.get(&tick).copied().unwrap_or_default();
        let events = self.sim.tick(&input, self.dt);
        self.deaths += events.deaths().len();
        self.shots_fired += events.shooters().len();
        events
    }

    /// Run to completion, writing every event as a JSON line to `out`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> io::Result<RunSummary> {
        while !self.is_finished() {
            let events = self.step();
            for event in events.iter() {
                let line = OutputLine::Event(EventLine {
                    tick: events.tick,
                    event,
                });
                out.write_all(line.to_json_line().as_bytes())?;
            }
        }

        let summary = self.summary();
        out.write_all(OutputLine::Summary(&summary).to_json_line().as_bytes())?;
        out.flush()?;
        tracing::info!(
            ticks = summary.ticks,
            deaths = summary.deaths,
            state_hash = summary.state_hash,
            "Scenario finished"
        );
        Ok(summary)
    }

    /// Summarize the current state.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut survivors = BTreeMap::new();
        for entity in self.sim.registry().iter() {
            *survivors.entry(entity.team).or_insert(0) += 1;
        }
        RunSummary {
            ticks: self.sim.get_tick(),
            state_hash: self.sim.state_hash(),
            survivors,
            deaths: self.deaths,
            shots_fired: self.shots_fired,
            metal: self.sim.resources().metal(),
            energy: self.sim.resources().energy(),
        }
    }
}

/// Run `scenario` to completion, writing its event log to `out`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn run_scenario<W: Write>(
    scenario: &Scenario,
    options: RunOptions,
    out: &mut W,
) -> io::Result<RunSummary> {
    ScenarioRunner::new(scenario, options).run(out)
}
