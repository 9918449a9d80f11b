//! Versioned recordings of complete runs.
//!
//! A playthrough is just a seed, the level and the ordered input
//! history; everything else is re-derived by simulation. That keeps
//! recordings tiny and makes scrubbing trivial: reconstructing tick N
//! is creating a fresh world and stepping N inputs into it.

use crate::error::{GameError, Result};
use crate::level::Level;
use crate::player::PlayerInput;
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Format version written into every recording. Bump on any change to
/// simulation semantics: an old recording replayed under new rules
/// would silently produce a different run.
pub const PLAYTHROUGH_VERSION: u32 = 1;

/// A recorded run: seed, level and input history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playthrough {
    /// Format version, checked on load.
    pub version: u32,
    /// World seed.
    pub seed: u64,
    /// The level the run was played on.
    pub level: Level,
    /// One input per tick, in order.
    pub inputs: Vec<PlayerInput>,
}

impl Playthrough {
    /// Start an empty recording.
    #[must_use]
    pub fn new(seed: u64, level: Level) -> Self {
        Self {
            version: PLAYTHROUGH_VERSION,
            seed,
            level,
            inputs: Vec::new(),
        }
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Append one tick's input.
    pub fn record(&mut self, input: PlayerInput) {
        self.inputs.push(input);
    }

    /// Record the input and step the world with it, keeping recording
    /// and live world in lockstep.
    pub fn step_recorded(&mut self, world: &mut World, input: &PlayerInput) {
        self.record(*input);
        world.step(input);
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::PlaythroughEncode(e.to_string()))
    }

    /// Deserialize from bytes, rejecting incompatible versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let playthrough: Self =
            bincode::deserialize(bytes).map_err(|e| GameError::PlaythroughDecode(e.to_string()))?;
        if playthrough.version != PLAYTHROUGH_VERSION {
            return Err(GameError::VersionMismatch {
                expected: PLAYTHROUGH_VERSION,
                found: playthrough.version,
            });
        }
        Ok(playthrough)
    }

    /// Re-simulate the whole recording into a fresh world.
    #[must_use]
    pub fn reconstruct(&self) -> World {
        let mut world = World::new(self.seed, &self.level);
        for input in &self.inputs {
            world.step(input);
        }
        world
    }

    /// Re-simulate the first `tick` inputs, for scrubbing.
    pub fn reconstruct_at(&self, tick: u64) -> Result<World> {
        let available = self.inputs.len() as u64;
        if tick > available {
            return Err(GameError::TickOutOfRange {
                requested: tick,
                available,
            });
        }
        let mut world = World::new(self.seed, &self.level);
        for input in &self.inputs[..tick as usize] {
            world.step(input);
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::Archetype;
    use crate::math::{Fixed, TilePos};

    fn tp(x: i64, y: i64) -> TilePos {
        TilePos::from_raw(x, y)
    }

    fn test_level() -> Level {
        let mut level = Level::empty(Fixed::new(6), Fixed::new(6));
        level.enemy_move_cooldown = Fixed::ZERO;
        level.tuning.player_cooldown = Fixed::ZERO;
        level.enemies.push((Archetype::Hound, tp(5, 5)));
        level.enemies.push((Archetype::Question, tp(0, 5)));
        level
    }

    fn test_inputs() -> Vec<PlayerInput> {
        vec![
            PlayerInput::move_to(tp(0, 0)),
            PlayerInput::idle(),
            PlayerInput::move_to(tp(1, 0)),
            PlayerInput::idle(),
            PlayerInput::idle(),
            PlayerInput::move_to(tp(2, 1)),
        ]
    }

    #[test]
    fn test_byte_round_trip() {
        let mut playthrough = Playthrough::new(42, test_level());
        for input in test_inputs() {
            playthrough.record(input);
        }
        let bytes = playthrough.to_bytes().unwrap();
        let loaded = Playthrough::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, playthrough);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut playthrough = Playthrough::new(42, test_level());
        playthrough.version = PLAYTHROUGH_VERSION + 1;
        let bytes = playthrough.to_bytes().unwrap();
        match Playthrough::from_bytes(&bytes) {
            Err(GameError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, PLAYTHROUGH_VERSION);
                assert_eq!(found, PLAYTHROUGH_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        assert!(matches!(
            Playthrough::from_bytes(&[0xFF, 0x01, 0x02]),
            Err(GameError::PlaythroughDecode(_))
        ));
    }

    #[test]
    fn test_reconstruct_matches_live_run() {
        let level = test_level();
        let mut playthrough = Playthrough::new(7, level.clone());
        let mut live = World::new(7, &level);
        for input in test_inputs() {
            playthrough.step_recorded(&mut live, &input);
        }
        let replayed = playthrough.reconstruct();
        assert_eq!(replayed.tick(), live.tick());
        assert_eq!(replayed.state_hash(), live.state_hash());
    }

    #[test]
    fn test_scrubbing_matches_prefix() {
        let level = test_level();
        let mut playthrough = Playthrough::new(7, level.clone());
        let mut live = World::new(7, &level);
        let inputs = test_inputs();
        let mut prefix_hashes = vec![live.state_hash()];
        for input in &inputs {
            playthrough.step_recorded(&mut live, input);
            prefix_hashes.push(live.state_hash());
        }
        for (tick, expected) in prefix_hashes.iter().enumerate() {
            let world = playthrough.reconstruct_at(tick as u64).unwrap();
            assert_eq!(world.state_hash(), *expected, "scrub to tick {tick}");
        }
    }

    #[test]
    fn test_scrub_past_end_is_an_error() {
        let playthrough = Playthrough::new(7, test_level());
        assert!(matches!(
            playthrough.reconstruct_at(1),
            Err(GameError::TickOutOfRange { .. })
        ));
        assert!(playthrough.reconstruct_at(0).is_ok());
    }
}
