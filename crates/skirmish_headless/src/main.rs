//! Headless skirmish runner.
//!
//! Plays a scenario without graphics and prints the event log as JSON
//! lines on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario file
//! cargo run -p skirmish_headless -- run --scenario ambush.ron
//!
//! # Override its length and tick rate
//! cargo run -p skirmish_headless -- run --scenario ambush.ron --ticks 120 --dt 0.033
//!
//! # Built-in demo with debug logs
//! cargo run -p skirmish_headless -- --verbose demo
//! ```

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{run_scenario, RunOptions, Scenario};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for scripted scenarios and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file
    Run {
        /// Scenario file to load (RON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Ticks to simulate (defaults to the scenario's)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Seconds per tick (defaults to the scenario's)
        #[arg(long)]
        dt: Option<f32>,
    },

    /// Run the built-in demo scenario
    Demo {
        /// Ticks to simulate
        #[arg(short, long)]
        ticks: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries the event stream
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let (scenario, options) = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            dt,
        } => match Scenario::load(&scenario) {
            Ok(loaded) => (loaded, RunOptions { ticks, dt }),
            Err(err) => {
                tracing::error!(path = %scenario.display(), %err, "Could not load scenario");
                return ExitCode::FAILURE;
            }
        },
        Commands::Demo { ticks } => (Scenario::demo(), RunOptions { ticks, dt: None }),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match run_scenario(&scenario, options, &mut out) {
        Ok(summary) => {
            tracing::debug!(?summary.survivors, "Survivors by team");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "Failed to write event log");
            ExitCode::FAILURE
        }
    }
}
