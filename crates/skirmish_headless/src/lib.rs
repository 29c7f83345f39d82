//! Headless scenario runner for scripted skirmishes and CI verification.
//!
//! A [`Scenario`] describes a starting world and a timeline of player
//! input; the [`ScenarioRunner`] plays it through the simulation core and
//! streams the event log as JSON lines:
//!
//! - **stdout**: one JSON object per event, then a summary object
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run the built-in demo
//! cargo run -p skirmish_headless -- demo
//!
//! # Run a scenario file for 300 ticks
//! cargo run -p skirmish_headless -- run --scenario scenarios/ambush.ron --ticks 300
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, RunOptions, RunSummary, ScenarioRunner};
pub use scenario::{Action, Scenario, ScenarioError, ScriptedInput};
