//! Replay checks for the skirmish core.
//!
//! A skirmish is reproducible when the same spawns and the same pointer
//! script always end on the same [`Simulation::state_hash`]. Ordering that
//! could break this is pinned down in the core:
//!
//! - the registry iterates slots in index order and navigation keys agents
//!   in a `BTreeMap`
//! - the group-move spread draws from a ChaCha RNG seeded from
//!   `SimConfig::rng_seed`, never from the OS
//!
//! [`Simulation::state_hash`]: skirmish_core::simulation::Simulation::state_hash

use crate::fixtures::TestSim;

/// Final state hashes of repeated replays of one scripted skirmish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Final state hash of each replay, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each replay ran for.
    pub ticks: u64,
}

impl ReplayReport {
    /// Check that every replay ended on the same state.
    #[must_use]
    pub fn is_reproducible(&self) -> bool {
        self.first_divergence().is_none()
    }

    /// Index of the first replay whose final hash differs from replay 0.
    #[must_use]
    pub fn first_divergence(&self) -> Option<usize> {
        let reference = *self.hashes.first()?;
        self.hashes.iter().position(|&hash| hash != reference)
    }

    /// Panic with the diverging replay if the runs disagree.
    ///
    /// # Panics
    ///
    /// Panics if any replay ended on a different state hash than the first.
    pub fn assert_reproducible(&self) {
        if let Some(run) = self.first_divergence() {
            panic!(
                "skirmish replay {run} of {} diverged after {} ticks: \
                 hash {:#018x} vs {:#018x} for replay 0 (all: {:x?})",
                self.hashes.len(),
                self.ticks,
                self.hashes[run],
                self.hashes[0],
                self.hashes
            );
        }
    }
}

/// Replay the same setup `runs` times and collect each final state hash.
///
/// `step` receives the tick index, so scripted input can be keyed on it.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> ReplayReport
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            for tick in 0..ticks {
                step(&mut state, tick);
            }
            hash(&state)
        })
        .collect();

    ReplayReport { hashes, ticks }
}

/// Run a [`TestSim`] twice with idle input and compare final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> TestSim,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, _| {
            sim.tick(&skirmish_core::input::PointerInput::default(), crate::fixtures::DT);
        },
        |sim| sim.state_hash(),
    )
    .is_reproducible()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::components::{EntityKind, TeamId};
    use skirmish_core::math::Vec3;

    use crate::fixtures::ARENA_HALF_EXTENT;

    /// A ground point inside the test arena, on a 0.25 grid.
    pub fn arb_ground_point() -> impl Strategy<Value = Vec3> {
        #[allow(clippy::cast_possible_truncation)]
        let cells = (ARENA_HALF_EXTENT * 4.0) as i32 - 4;
        (-cells..cells, -cells..cells)
            .prop_map(|(x, z)| Vec3::new(x as f32 * 0.25, 0.0, z as f32 * 0.25))
    }

    /// Team id 0..4.
    pub fn arb_team() -> impl Strategy<Value = TeamId> {
        0u32..4u32
    }

    /// Maximum health values (1-1000).
    pub fn arb_max_health() -> impl Strategy<Value = f32> {
        1.0f32..1000.0f32
    }

    /// Damage values, including the negative and oversized ones a bad
    /// config could produce.
    pub fn arb_damage() -> impl Strategy<Value = f32> {
        prop_oneof![
            8 => 0.0f32..200.0f32,
            1 => -50.0f32..0.0f32,
            1 => Just(f32::INFINITY),
        ]
    }

    /// A sequence of damage amounts.
    pub fn arb_damage_sequence(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(arb_damage(), 0..max_len)
    }

    /// Unit or building.
    pub fn arb_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![Just(EntityKind::Unit), Just(EntityKind::Building)]
    }

    /// Placement of one test entity.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Placement {
        /// Unit or building.
        pub kind: EntityKind,
        /// Team.
        pub team: TeamId,
        /// Ground position.
        pub position: Vec3,
    }

    /// One entity placement.
    pub fn arb_placement() -> impl Strategy<Value = Placement> {
        (arb_kind(), arb_team(), arb_ground_point()).prop_map(|(kind, team, position)| {
            Placement {
                kind,
                team,
                position,
            }
        })
    }

    /// A list of placements.
    pub fn arb_layout(max_entities: usize) -> impl Strategy<Value = Vec<Placement>> {
        proptest::collection::vec(arb_placement(), 1..max_entities)
    }
}
