//! Player action resolution.
//!
//! The player is not a tile-by-tile walker: each move teleports to any
//! currently visible free tile (or anywhere when off the map), and each
//! action starts a shared cooldown that doubles as post-hit
//! invulnerability. Invalid inputs are silent no-ops; a display layer
//! that wants to explain a rejected action re-derives the reason from
//! the query surface.

use crate::math::{Fixed, TilePos};
use crate::world::{Beam, World, BEAM_MAX_COUNTDOWN};
use serde::{Deserialize, Serialize};

/// One tick's worth of player intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Tile to move to, if any.
    pub move_to: Option<TilePos>,
    /// Tile to shoot at, if any.
    pub shoot_at: Option<TilePos>,
}

impl PlayerInput {
    /// No action this tick.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Move to a tile.
    #[must_use]
    pub fn move_to(target: TilePos) -> Self {
        Self {
            move_to: Some(target),
            shoot_at: None,
        }
    }

    /// Shoot at a tile.
    #[must_use]
    pub fn shoot_at(target: TilePos) -> Self {
        Self {
            move_to: None,
            shoot_at: Some(target),
        }
    }

    /// Whether this input carries any action.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.move_to.is_some() || self.shoot_at.is_some()
    }
}

/// The player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Current tile. Meaningless while `on_map` is false.
    pub pos: TilePos,
    /// Whether the player currently stands on the board.
    pub on_map: bool,
    /// Remaining health.
    pub health: Fixed,
    /// Health at the start of the run.
    pub max_health: Fixed,
    /// Shared action cooldown and post-hit invulnerability countdown.
    pub timeout_idx: Fixed,
    /// Shots carried.
    pub ammo_count: Fixed,
    /// Set for the remainder of the tick on which the player was hit.
    pub just_hit: bool,
    /// Which targets the beam can damage.
    pub permissions: crate::items::HitPermissions,
}

impl Player {
    pub(crate) fn new(max_health: Fixed) -> Self {
        Self {
            pos: TilePos::ZERO,
            on_map: false,
            health: max_health,
            max_health,
            timeout_idx: Fixed::ZERO,
            ammo_count: Fixed::ZERO,
            just_hit: false,
            permissions: crate::items::HitPermissions::starting(),
        }
    }

    /// Resolve one tick of input. Called with the player taken out of
    /// the world, which stays freely borrowable.
    pub(crate) fn step(&mut self, w: &mut World, input: &PlayerInput) {
        if w.beam.countdown.is_positive() {
            w.beam.countdown -= Fixed::ONE;
        }
        if self.timeout_idx.is_positive() {
            self.timeout_idx -= Fixed::ONE;
            if self.timeout_idx.is_positive() {
                return;
            }
        }
        if let Some(target) = input.move_to {
            self.try_move(w, target);
        }
        if let Some(target) = input.shoot_at {
            self.try_shoot(w, target);
        }
    }

    fn try_move(&mut self, w: &mut World, target: TilePos) {
        if !w.obstacles().in_bounds(target)
            || w.obstacles().at(target)
            || w.enemy_at(target)
            || (self.on_map && !w.visible_tiles().at(target))
        {
            return;
        }
        self.pos = target;
        self.on_map = true;
        self.timeout_idx = w.tuning().player_cooldown;
        self.collect_pickups(w);
    }

    fn collect_pickups(&mut self, w: &mut World) {
        let pos = self.pos;
        let mut i = 0;
        while i < w.ammos.len() {
            if w.ammos[i].pos == pos {
                self.ammo_count += w.ammos[i].count;
                w.ammos.remove(i);
            } else {
                i += 1;
            }
        }
        let mut i = 0;
        while i < w.keys.len() {
            if w.keys[i].pos == pos {
                self.permissions.merge(w.keys[i].grants);
                w.keys.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn try_shoot(&mut self, w: &mut World, target: TilePos) {
        if self.timeout_idx.is_positive() {
            // A move in the same input already spent the action.
            return;
        }
        if w.level().use_ammo && !self.ammo_count.is_positive() {
            return;
        }
        if !w.obstacles().in_bounds(target) || !w.visible_tiles().at(target) {
            return;
        }
        if !w.vulnerable_enemy_at(target, self.permissions) && !w.portal_at(target) {
            return;
        }
        w.beam = Beam {
            countdown: BEAM_MAX_COUNTDOWN,
            end: target,
        };
        self.timeout_idx = w.tuning().player_cooldown;
        if w.level().use_ammo {
            self.ammo_count -= Fixed::ONE;
        }
    }

    /// Take a hit: knocked off the map, one health lost, invulnerable
    /// while the countdown runs.
    pub(crate) fn hit(&mut self, invulnerability: Fixed) {
        self.just_hit = true;
        self.on_map = false;
        self.health -= Fixed::ONE;
        self.timeout_idx = invulnerability;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Ammo, Key};
    use crate::level::Level;

    fn fx(v: i64) -> Fixed {
        Fixed::new(v)
    }

    fn tp(x: i64, y: i64) -> TilePos {
        TilePos::from_raw(x, y)
    }

    fn open_level() -> Level {
        let mut level = Level::empty(fx(5), fx(5));
        level.tuning.player_cooldown = Fixed::ZERO;
        level
    }

    #[test]
    fn test_enters_map_anywhere_free() {
        let mut world = World::new(1, &open_level());
        assert!(!world.player.on_map);
        world.step(&PlayerInput::move_to(tp(4, 4)));
        assert!(world.player.on_map);
        assert_eq!(world.player.pos, tp(4, 4));
    }

    #[test]
    fn test_cannot_enter_on_obstacle() {
        let mut level = open_level();
        level.obstacles.set(tp(2, 2));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(2, 2)));
        assert!(!world.player.on_map, "invalid input is a silent no-op");
    }

    #[test]
    fn test_on_map_move_requires_visibility() {
        let mut level = open_level();
        // Wall column with a passage at the bottom.
        level.obstacles.set(tp(2, 0));
        level.obstacles.set(tp(2, 1));
        level.obstacles.set(tp(2, 2));
        level.obstacles.set(tp(2, 3));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::move_to(tp(4, 0)));
        assert_eq!(world.player.pos, tp(0, 0), "tile behind the wall is not visible");
        world.step(&PlayerInput::move_to(tp(1, 0)));
        assert_eq!(world.player.pos, tp(1, 0));
    }

    #[test]
    fn test_move_out_of_bounds_is_noop() {
        let mut world = World::new(1, &open_level());
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::move_to(tp(9, 9)));
        assert_eq!(world.player.pos, tp(0, 0));
        world.step(&PlayerInput::move_to(tp(-1, 0)));
        assert_eq!(world.player.pos, tp(0, 0));
    }

    #[test]
    fn test_action_cooldown_blocks_next_action() {
        let mut level = open_level();
        level.tuning.player_cooldown = fx(3);
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::move_to(tp(1, 0)));
        assert_eq!(world.player.pos, tp(0, 0), "still cooling down");
        world.step(&PlayerInput::idle());
        world.step(&PlayerInput::move_to(tp(1, 0)));
        assert_eq!(world.player.pos, tp(1, 0), "countdown reached zero this tick");
    }

    #[test]
    fn test_collects_ammo_and_keys_on_arrival() {
        let mut world = World::new(1, &open_level());
        world.ammos.push(Ammo::pack(tp(3, 3)));
        world.keys.push(Key::pillar_key(tp(3, 3)));
        world.step(&PlayerInput::move_to(tp(3, 3)));
        assert_eq!(world.player.ammo_count, fx(3));
        assert!(world.player.permissions.pillar);
        assert!(world.ammos.is_empty());
        assert!(world.keys.is_empty());
    }

    #[test]
    fn test_shoot_arms_beam_and_it_cools_down() {
        let mut level = open_level();
        level.enemies.push((crate::enemy::Archetype::Hound, tp(4, 4)));
        level.enemy_move_cooldown = fx(1000); // keep the hound still
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::shoot_at(tp(4, 4)));
        assert_eq!(world.beam.countdown, BEAM_MAX_COUNTDOWN);
        assert_eq!(world.beam.end, tp(4, 4));
        world.step(&PlayerInput::idle());
        assert_eq!(world.beam.countdown, BEAM_MAX_COUNTDOWN - Fixed::ONE);
    }

    #[test]
    fn test_shoot_empty_tile_is_noop() {
        let mut world = World::new(1, &open_level());
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::shoot_at(tp(3, 3)));
        assert!(world.beam.countdown.is_zero());
    }

    #[test]
    fn test_shoot_requires_ammo_when_level_uses_it() {
        let mut level = open_level();
        level.use_ammo = true;
        level.enemies.push((crate::enemy::Archetype::Hound, tp(4, 4)));
        level.enemy_move_cooldown = fx(1000);
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        let carried = world.player.ammo_count;
        world.step(&PlayerInput::shoot_at(tp(4, 4)));
        if carried.is_zero() {
            assert!(world.beam.countdown.is_zero());
        } else {
            assert_eq!(world.player.ammo_count, carried - Fixed::ONE);
        }
    }

    #[test]
    fn test_hit_knocks_player_off_map() {
        let mut world = World::new(1, &open_level());
        world.step(&PlayerInput::move_to(tp(0, 0)));
        let health = world.player.health;
        world.player.hit(fx(10));
        assert!(world.player.just_hit);
        assert!(!world.player.on_map);
        assert_eq!(world.player.health, health - Fixed::ONE);
        assert_eq!(world.player.timeout_idx, fx(10));
    }
}
