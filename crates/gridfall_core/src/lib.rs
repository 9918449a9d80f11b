//! # Gridfall Core
//!
//! Deterministic tick-based simulation core for the Gridfall tile-grid
//! combat game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (all randomness flows from an explicit seed)
//! - No floating-point math (uses integer fixed-point)
//!
//! Given a seed, a [`level::Level`] and an ordered sequence of
//! [`player::PlayerInput`] values, the engine reproduces an identical
//! sequence of world states on any machine. This separation enables:
//! - Replay files that stay valid forever
//! - Regression testing against recorded state hashes
//! - Offline analysis of playthroughs
//!
//! ## Crate Structure
//!
//! - [`math`] - Integer fixed-point arithmetic and exact geometry
//! - [`grid`] - Dense grids and boolean occupancy sets
//! - [`pathfinding`] - Breadth-first shortest paths on the tile grid
//! - [`vision`] - Line-of-sight visibility engine with memoized caches
//! - [`enemy`] - Enemy archetypes and their state machines
//! - [`portal`] - Wave-based spawn portals
//! - [`player`] - Player action resolution
//! - [`world`] - The world step loop
//! - [`playthrough`] - Versioned seed + input recordings

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod enemy;
pub mod error;
pub mod grid;
pub mod items;
pub mod level;
pub mod math;
pub mod pathfinding;
pub mod player;
pub mod playthrough;
pub mod portal;
pub mod rng;
pub mod vision;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::enemy::{Archetype, Enemy};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Grid, TileSet, DIRECTIONS_8};
    pub use crate::items::{Ammo, HitPermissions, Key};
    pub use crate::level::{Level, Tuning, Wave};
    pub use crate::math::{Fixed, TilePos};
    pub use crate::player::{Player, PlayerInput};
    pub use crate::playthrough::Playthrough;
    pub use crate::portal::SpawnPortal;
    pub use crate::world::{World, WorldStatus};
}
