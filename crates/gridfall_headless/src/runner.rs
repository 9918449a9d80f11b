//! Loading and re-simulating recorded playthroughs.

use gridfall_core::error::GameError;
use gridfall_core::playthrough::Playthrough;
use gridfall_core::world::{World, WorldStatus};
use std::path::Path;
use thiserror::Error;

/// Errors from loading or replaying a recording file.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The recording failed to decode or replay.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Summary of one re-simulated recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Ticks simulated.
    pub ticks: u64,
    /// Outcome after the last recorded input.
    pub status: WorldStatus,
    /// Hash of the final world state.
    pub final_hash: u64,
    /// Enemies still alive at the end.
    pub enemies_alive: usize,
    /// Portals still standing at the end.
    pub portals_alive: usize,
}

impl ReplayReport {
    fn from_world(world: &World) -> Self {
        Self {
            ticks: world.tick(),
            status: world.status(),
            final_hash: world.state_hash(),
            enemies_alive: world.enemies().len(),
            portals_alive: world.portals().len(),
        }
    }
}

fn load(path: &Path) -> Result<Playthrough, HeadlessError> {
    let bytes = std::fs::read(path).map_err(|source| HeadlessError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Playthrough::from_bytes(&bytes)?)
}

/// Load a recording and re-simulate it to the end.
pub fn verify_file(path: &Path) -> Result<ReplayReport, HeadlessError> {
    let playthrough = load(path)?;
    tracing::debug!(
        ticks = playthrough.len(),
        seed = playthrough.seed,
        "replaying recording"
    );
    let world = playthrough.reconstruct();
    Ok(ReplayReport::from_world(&world))
}

/// Load a recording and re-simulate the first `tick` inputs.
pub fn inspect_at(path: &Path, tick: u64) -> Result<World, HeadlessError> {
    let playthrough = load(path)?;
    Ok(playthrough.reconstruct_at(tick)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_test_utils::fixtures::{busy_level, walkabout_inputs};

    fn recorded_run() -> Playthrough {
        let level = busy_level();
        let mut playthrough = Playthrough::new(31, level.clone());
        let mut world = World::new(31, &level);
        for input in walkabout_inputs(&level) {
            playthrough.step_recorded(&mut world, &input);
        }
        playthrough
    }

    #[test]
    fn test_verify_round_trips_through_disk() {
        let playthrough = recorded_run();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gfp");
        std::fs::write(&path, playthrough.to_bytes().unwrap()).unwrap();

        let report = verify_file(&path).unwrap();
        let expected = playthrough.reconstruct();
        assert_eq!(report.ticks, expected.tick());
        assert_eq!(report.final_hash, expected.state_hash());
        assert_eq!(report.status, expected.status());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = verify_file(Path::new("/nonexistent/run.gfp")).unwrap_err();
        assert!(matches!(err, HeadlessError::Io { .. }));
    }

    #[test]
    fn test_corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.gfp");
        std::fs::write(&path, [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let err = verify_file(&path).unwrap_err();
        assert!(matches!(
            err,
            HeadlessError::Game(GameError::PlaythroughDecode(_))
        ));
    }

    #[test]
    fn test_inspect_lands_on_prefix_state() {
        let playthrough = recorded_run();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gfp");
        std::fs::write(&path, playthrough.to_bytes().unwrap()).unwrap();

        let world = inspect_at(&path, 3).unwrap();
        assert_eq!(world.tick(), 3);
        assert_eq!(
            world.state_hash(),
            playthrough.reconstruct_at(3).unwrap().state_hash()
        );
    }

    #[test]
    fn test_inspect_past_end_fails() {
        let playthrough = recorded_run();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gfp");
        std::fs::write(&path, playthrough.to_bytes().unwrap()).unwrap();

        let err = inspect_at(&path, 10_000).unwrap_err();
        assert!(matches!(
            err,
            HeadlessError::Game(GameError::TickOutOfRange { .. })
        ));
    }
}
