//! Determinism verification harness.
//!
//! Runs the same simulation multiple times and compares state hashes
//! tick by tick. Any divergence between runs from the same seed and
//! input history is a simulation bug.

use gridfall_core::level::Level;
use gridfall_core::player::PlayerInput;
use gridfall_core::world::World;
use std::collections::HashSet;

/// Outcome of a determinism check across several identical runs.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// True when every run produced the same hash at every tick.
    pub is_deterministic: bool,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Number of ticks each run was stepped.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Number of distinct final hashes observed.
    #[must_use]
    pub fn unique_hashes(&self) -> usize {
        self.hashes.iter().collect::<HashSet<_>>().len()
    }

    /// Panic with a diagnostic when the runs diverged.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "simulation diverged after {} ticks: {} distinct final hashes across {} runs",
            self.ticks,
            self.unique_hashes(),
            self.hashes.len()
        );
    }
}

/// Generic determinism check over any simulation state.
///
/// Builds `runs` states with `setup`, advances each one `ticks` times
/// with `step` and hashes after every tick. Hashes are compared across
/// runs per tick, so the result also reports divergence that a later
/// tick happens to cancel out.
pub fn verify_determinism<S>(
    runs: usize,
    ticks: u64,
    setup: impl Fn() -> S,
    step: impl Fn(&mut S),
    hash: impl Fn(&S) -> u64,
) -> DeterminismResult {
    assert!(runs >= 2, "need at least two runs to compare");
    let mut states: Vec<S> = (0..runs).map(|_| setup()).collect();
    let mut is_deterministic = true;

    for _ in 0..ticks {
        for state in &mut states {
            step(state);
        }
        let first = hash(&states[0]);
        if states[1..].iter().any(|s| hash(s) != first) {
            is_deterministic = false;
        }
    }

    DeterminismResult {
        is_deterministic,
        hashes: states.iter().map(&hash).collect(),
        ticks,
    }
}

/// Determinism check for a world replaying a fixed input history.
///
/// Each run recreates the world from the same seed and level, then
/// replays `inputs` cycled out to `ticks` entries.
pub fn verify_world_determinism(
    runs: usize,
    ticks: u64,
    seed: u64,
    level: &Level,
    inputs: &[PlayerInput],
) -> DeterminismResult {
    let mut next_input = {
        let mut cursors = vec![0usize; runs];
        move |run: usize| {
            let input = if inputs.is_empty() {
                PlayerInput::idle()
            } else {
                inputs[cursors[run] % inputs.len()]
            };
            cursors[run] += 1;
            input
        }
    };

    let mut worlds: Vec<World> = (0..runs).map(|_| World::new(seed, level)).collect();
    let mut is_deterministic = true;
    for _ in 0..ticks {
        for (run, world) in worlds.iter_mut().enumerate() {
            let input = next_input(run);
            world.step(&input);
        }
        let first = worlds[0].state_hash();
        if worlds[1..].iter().any(|w| w.state_hash() != first) {
            is_deterministic = false;
        }
    }

    DeterminismResult {
        is_deterministic,
        hashes: worlds.iter().map(World::state_hash).collect(),
        ticks,
    }
}

/// Replay the same run twice and report the first tick whose hashes
/// differ, or `None` when the runs agree throughout.
///
/// Useful when a determinism test fails: the returned tick points at
/// the sub-step to bisect.
#[must_use]
pub fn find_first_divergence(
    seed: u64,
    level: &Level,
    inputs: &[PlayerInput],
) -> Option<u64> {
    let mut a = World::new(seed, level);
    let mut b = World::new(seed, level);
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for input in inputs {
        a.step(input);
        b.step(input);
        if a.state_hash() != b.state_hash() {
            return Some(a.tick());
        }
    }
    None
}

/// Result of running identical simulations on separate threads.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final hash from each thread.
    pub hashes: Vec<u64>,
}

impl ParallelSimResult {
    /// True when all threads agree on the final hash.
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run the same replay on `threads` OS threads simultaneously.
///
/// Catches accidental dependence on ambient global state; a correct
/// simulation touches nothing outside the world value.
#[must_use]
pub fn run_parallel_simulations(
    threads: usize,
    seed: u64,
    level: &Level,
    inputs: &[PlayerInput],
) -> ParallelSimResult {
    let hashes = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    let mut world = World::new(seed, level);
                    for input in inputs {
                        world.step(input);
                    }
                    world.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });
    ParallelSimResult { hashes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_verify_determinism_passes_for_pure_state() {
        let result = verify_determinism(
            3,
            50,
            || 0u64,
            |n| *n = n.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1),
            |n| *n,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes(), 1);
    }

    #[test]
    fn test_verify_determinism_catches_divergence() {
        use std::cell::Cell;
        let counter = Cell::new(0u64);
        let result = verify_determinism(
            2,
            10,
            || 0u64,
            |n| {
                counter.set(counter.get() + 1);
                *n += counter.get();
            },
            |n| *n,
        );
        assert!(!result.is_deterministic);
    }

    #[test]
    fn test_world_determinism_on_busy_level() {
        let level = fixtures::busy_level();
        let inputs = fixtures::walkabout_inputs(&level);
        verify_world_determinism(3, 60, 99, &level, &inputs).assert_deterministic();
    }

    #[test]
    fn test_no_divergence_on_replay() {
        let level = fixtures::busy_level();
        let inputs = fixtures::walkabout_inputs(&level);
        assert_eq!(find_first_divergence(7, &level, &inputs), None);
    }

    #[test]
    fn test_parallel_runs_agree() {
        let level = fixtures::busy_level();
        let inputs = fixtures::walkabout_inputs(&level);
        assert!(run_parallel_simulations(4, 42, &level, &inputs).all_match());
    }
}
