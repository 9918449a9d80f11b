//! Error types for the game simulation.
//!
//! Only recoverable conditions live here. Programmer and data errors
//! (division by zero, out-of-bounds tile access, tick counter
//! exhaustion) panic: recovering from them would let a corrupted state
//! keep stepping and silently break determinism for every recorded
//! playthrough.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all recoverable simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Playthrough was recorded by an incompatible engine version.
    #[error("Playthrough version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this engine writes and reads.
        expected: u32,
        /// Version found in the data.
        found: u32,
    },

    /// Playthrough bytes failed to decode.
    #[error("Failed to decode playthrough: {0}")]
    PlaythroughDecode(String),

    /// Playthrough failed to encode.
    #[error("Failed to encode playthrough: {0}")]
    PlaythroughEncode(String),

    /// Level description is internally inconsistent.
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Requested tick lies beyond the recorded input history.
    #[error("Tick {requested} is out of range: playthrough has {available} inputs")]
    TickOutOfRange {
        /// Tick asked for.
        requested: u64,
        /// Number of recorded inputs.
        available: u64,
    },
}
