//! Static level descriptions.
//!
//! A [`Level`] is immutable input to the simulation: board layout,
//! tuning knobs, initial enemy placements and spawn portal definitions.
//! Together with a seed it fully determines a run.

use crate::enemy::Archetype;
use crate::error::{GameError, Result};
use crate::grid::TileSet;
use crate::math::{Fixed, TilePos};
use serde::{Deserialize, Serialize};

/// One wave of a spawn portal's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Ticks between the previous wave's start and this one's.
    pub ticks_after_last: Fixed,
    /// Kings to spawn during this wave.
    pub n_kings: Fixed,
    /// Ultra hounds to spawn during this wave.
    pub n_ultra_hounds: Fixed,
    /// Hounds to spawn during this wave.
    pub n_hounds: Fixed,
}

impl Wave {
    /// A wave of hounds only.
    #[must_use]
    pub fn hounds(ticks_after_last: Fixed, n_hounds: Fixed) -> Self {
        Self {
            ticks_after_last,
            n_kings: Fixed::ZERO,
            n_ultra_hounds: Fixed::ZERO,
            n_hounds,
        }
    }
}

/// Placement and schedule of one spawn portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSpec {
    /// Tile the portal sits on.
    pub pos: TilePos,
    /// Ticks between spawns once a wave is underway.
    pub cooldown: Fixed,
    /// Wave schedule, in order.
    pub waves: Vec<Wave>,
}

/// Per-archetype tuning knobs.
///
/// Cooldown "multipliers" are speed tiers: the per-entity movement
/// countdown reloads to the multiplier, and only counts down on ticks
/// when the world's shared enemy-move clock is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Tuning {
    pub hound_max_health: Fixed,
    pub hound_move_cooldown_multiplier: Fixed,
    pub hound_attack_cooldown_multiplier: Fixed,
    pub hound_preparing_cooldown: Fixed,
    pub hound_hit_cooldown: Fixed,
    /// Whether a hound reaching the player's tile damages the player.
    pub hound_hits_player: bool,
    pub ultra_hound_max_health: Fixed,
    pub ultra_hound_move_cooldown_multiplier: Fixed,
    pub ultra_hound_freeze_cooldown: Fixed,
    pub pillar_max_health: Fixed,
    pub king_max_health: Fixed,
    pub king_move_cooldown_multiplier: Fixed,
    pub king_freeze_cooldown: Fixed,
    pub question_max_health: Fixed,
    pub player_max_health: Fixed,
    /// Ticks of action cooldown / invulnerability after a move, shot or hit.
    pub player_cooldown: Fixed,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hound_max_health: Fixed::new(2),
            hound_move_cooldown_multiplier: Fixed::TWO,
            hound_attack_cooldown_multiplier: Fixed::ONE,
            hound_preparing_cooldown: Fixed::new(30),
            hound_hit_cooldown: Fixed::new(30),
            hound_hits_player: true,
            ultra_hound_max_health: Fixed::new(3),
            ultra_hound_move_cooldown_multiplier: Fixed::new(3),
            ultra_hound_freeze_cooldown: Fixed::new(30),
            pillar_max_health: Fixed::new(3),
            king_max_health: Fixed::new(3),
            king_move_cooldown_multiplier: Fixed::new(3),
            king_freeze_cooldown: Fixed::new(30),
            question_max_health: Fixed::ONE,
            player_max_health: Fixed::new(3),
            player_cooldown: Fixed::new(15),
        }
    }
}

/// Immutable description of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Board width in tiles.
    pub num_cols: Fixed,
    /// Board height in tiles.
    pub num_rows: Fixed,
    /// Static obstacle layout.
    pub obstacles: TileSet,
    /// Simulate every tick, or only on ticks where the player acted.
    pub always_simulate: bool,
    /// Whether shooting consumes ammo (and ammo packs spawn).
    pub use_ammo: bool,
    /// Total shots (carried + on the ground) the world tops up to.
    pub ammo_limit: Fixed,
    /// Cycle length of the shared enemy-move clock.
    pub enemy_move_cooldown: Fixed,
    /// Archetype tuning.
    pub tuning: Tuning,
    /// Enemies present when the world is created.
    pub enemies: Vec<(Archetype, TilePos)>,
    /// Spawn portals.
    pub portals: Vec<PortalSpec>,
}

impl Level {
    /// An empty always-simulated board with default tuning. The usual
    /// starting point for tests and generated levels.
    #[must_use]
    pub fn empty(num_cols: Fixed, num_rows: Fixed) -> Self {
        Self {
            num_cols,
            num_rows,
            obstacles: TileSet::new(num_cols, num_rows),
            always_simulate: true,
            use_ammo: false,
            ammo_limit: Fixed::new(6),
            enemy_move_cooldown: Fixed::new(8),
            tuning: Tuning::default(),
            enemies: Vec::new(),
            portals: Vec::new(),
        }
    }

    /// Parse a board sketch into a level.
    ///
    /// One line per row: `.` free tile, `#` obstacle, `h` hound,
    /// `u` ultra hound, `p` pillar, `k` king, `?` question. Portals
    /// carry schedules and are added separately.
    pub fn from_ascii(sketch: &str) -> Result<Self> {
        let rows: Vec<&str> = sketch
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(GameError::InvalidLevel("empty sketch".into()));
        }
        let num_rows = Fixed::new(rows.len() as i64);
        let num_cols = Fixed::new(rows[0].chars().count() as i64);
        let mut level = Self::empty(num_cols, num_rows);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != num_cols.as_index() {
                return Err(GameError::InvalidLevel(format!(
                    "row {y} has {} tiles, expected {num_cols}",
                    row.chars().count()
                )));
            }
            for (x, c) in row.chars().enumerate() {
                let pos = TilePos::from_raw(x as i64, y as i64);
                match c {
                    '.' => {}
                    '#' => level.obstacles.set(pos),
                    'h' => level.enemies.push((Archetype::Hound, pos)),
                    'u' => level.enemies.push((Archetype::UltraHound, pos)),
                    'p' => level.enemies.push((Archetype::Pillar, pos)),
                    'k' => level.enemies.push((Archetype::King, pos)),
                    '?' => level.enemies.push((Archetype::Question, pos)),
                    other => {
                        return Err(GameError::InvalidLevel(format!(
                            "unknown tile '{other}' at {pos}"
                        )))
                    }
                }
            }
        }
        Ok(level)
    }

    /// Check the level for internal consistency: placements in bounds
    /// and off obstacles, and every free tile reachable from every
    /// other (no sealed-off pockets).
    pub fn validate(&self) -> Result<()> {
        for (archetype, pos) in &self.enemies {
            if !self.obstacles.in_bounds(*pos) {
                return Err(GameError::InvalidLevel(format!(
                    "{archetype:?} placed out of bounds at {pos}"
                )));
            }
            if self.obstacles.at(*pos) {
                return Err(GameError::InvalidLevel(format!(
                    "{archetype:?} placed on an obstacle at {pos}"
                )));
            }
        }
        for portal in &self.portals {
            if !self.obstacles.in_bounds(portal.pos) {
                return Err(GameError::InvalidLevel(format!(
                    "portal placed out of bounds at {}",
                    portal.pos
                )));
            }
            if self.obstacles.at(portal.pos) {
                return Err(GameError::InvalidLevel(format!(
                    "portal placed on an obstacle at {}",
                    portal.pos
                )));
            }
        }
        if let Some(&free) = self.free_tiles().first() {
            let mut reachable = self.obstacles.connected_region(free);
            reachable.union_with(&self.obstacles);
            let mut everything = TileSet::new(self.num_cols, self.num_rows);
            everything.negate();
            if reachable != everything {
                return Err(GameError::InvalidLevel(
                    "free tiles are not fully connected".into(),
                ));
            }
        }
        Ok(())
    }

    fn free_tiles(&self) -> Vec<TilePos> {
        let mut free = self.obstacles.clone();
        free.negate();
        free.to_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: i64) -> Fixed {
        Fixed::new(v)
    }

    fn tp(x: i64, y: i64) -> TilePos {
        TilePos::from_raw(x, y)
    }

    #[test]
    fn test_from_ascii() {
        let level = Level::from_ascii(
            "..#
             .h.
             ..?",
        )
        .unwrap();
        assert_eq!(level.num_cols, fx(3));
        assert_eq!(level.num_rows, fx(3));
        assert!(level.obstacles.at(tp(2, 0)));
        assert_eq!(
            level.enemies,
            vec![(Archetype::Hound, tp(1, 1)), (Archetype::Question, tp(2, 2))]
        );
    }

    #[test]
    fn test_from_ascii_rejects_ragged_rows() {
        assert!(Level::from_ascii("...\n..").is_err());
        assert!(Level::from_ascii("").is_err());
        assert!(Level::from_ascii("..x").is_err());
    }

    #[test]
    fn test_validate_accepts_connected_level() {
        let level = Level::from_ascii(
            "....
             .##.
             ....",
        )
        .unwrap();
        assert!(level.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_sealed_pocket() {
        let level = Level::from_ascii(
            ".....
             .###.
             .#.#.
             .###.
             .....",
        )
        .unwrap();
        assert!(level.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_enemy_on_obstacle() {
        let mut level = Level::from_ascii("#..").unwrap();
        level.enemies.push((Archetype::Pillar, tp(0, 0)));
        assert!(level.validate().is_err());
    }
}
