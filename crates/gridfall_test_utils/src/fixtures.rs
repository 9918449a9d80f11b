//! Shared fixtures and property-testing strategies.

use gridfall_core::enemy::Archetype;
use gridfall_core::level::{Level, PortalSpec, Wave};
use gridfall_core::math::{Fixed, TilePos};
use gridfall_core::player::PlayerInput;
use proptest::prelude::*;

/// Shorthand tile constructor.
#[must_use]
pub fn tp(x: i64, y: i64) -> TilePos {
    TilePos::from_raw(x, y)
}

/// Shorthand fixed-point constructor.
#[must_use]
pub fn fx(n: i64) -> Fixed {
    Fixed::new(n)
}

/// An open board with every timing knob collapsed to make enemies act
/// every simulated tick. Most behavioral tests want this.
#[must_use]
pub fn fast_level(cols: i64, rows: i64) -> Level {
    let mut level = Level::empty(fx(cols), fx(rows));
    level.enemy_move_cooldown = Fixed::ZERO;
    level.tuning.player_cooldown = Fixed::ZERO;
    level.tuning.hound_move_cooldown_multiplier = Fixed::ONE;
    level.tuning.hound_preparing_cooldown = Fixed::ONE;
    level.tuning.hound_hit_cooldown = Fixed::ONE;
    level.tuning.ultra_hound_move_cooldown_multiplier = Fixed::ONE;
    level.tuning.ultra_hound_freeze_cooldown = Fixed::ONE;
    level.tuning.king_move_cooldown_multiplier = Fixed::ONE;
    level.tuning.king_freeze_cooldown = Fixed::ONE;
    level
}

/// A 12x12 board with a wall segment, a mixed pack of enemies and a
/// single portal. Exercises most of the simulation in one world.
#[must_use]
pub fn busy_level() -> Level {
    let mut level = fast_level(12, 12);
    for y in 3..9 {
        level.obstacles.set(tp(6, y));
    }
    level.enemies.push((Archetype::Hound, tp(11, 0)));
    level.enemies.push((Archetype::Hound, tp(11, 11)));
    level.enemies.push((Archetype::UltraHound, tp(0, 11)));
    level.enemies.push((Archetype::Pillar, tp(3, 3)));
    level.enemies.push((Archetype::Question, tp(9, 2)));
    level.portals.push(PortalSpec {
        pos: tp(11, 5),
        cooldown: fx(4),
        waves: vec![
            Wave {
                ticks_after_last: fx(10),
                n_kings: Fixed::ZERO,
                n_ultra_hounds: Fixed::ZERO,
                n_hounds: fx(2),
            },
            Wave {
                ticks_after_last: fx(30),
                n_kings: Fixed::ONE,
                n_ultra_hounds: Fixed::ONE,
                n_hounds: Fixed::ZERO,
            },
        ],
    });
    level
}

/// A scripted input history that enters the board and pokes around the
/// left half of `level`, long enough to trigger enemy reactions.
#[must_use]
pub fn walkabout_inputs(level: &Level) -> Vec<PlayerInput> {
    let rows = level.num_rows.raw();
    let mut inputs = vec![PlayerInput::move_to(tp(0, 0))];
    for y in 1..rows.min(6) {
        inputs.push(PlayerInput::move_to(tp(0, y)));
        inputs.push(PlayerInput::idle());
        inputs.push(PlayerInput::move_to(tp(1, y)));
        inputs.push(PlayerInput::idle());
    }
    inputs.push(PlayerInput::idle());
    inputs
}

/// Strategy producing in-bounds tile positions for a board size.
pub fn arb_tile_pos(cols: i64, rows: i64) -> impl Strategy<Value = TilePos> {
    (0..cols, 0..rows).prop_map(|(x, y)| tp(x, y))
}

/// Strategy producing arbitrary single-tick inputs, weighted towards
/// moves since those drive most of the state space.
pub fn arb_input(cols: i64, rows: i64) -> impl Strategy<Value = PlayerInput> {
    prop_oneof![
        2 => Just(PlayerInput::idle()),
        5 => arb_tile_pos(cols, rows).prop_map(PlayerInput::move_to),
        2 => arb_tile_pos(cols, rows).prop_map(PlayerInput::shoot_at),
    ]
}

/// Strategy producing input histories of up to `max_len` ticks.
pub fn arb_input_history(
    cols: i64,
    rows: i64,
    max_len: usize,
) -> impl Strategy<Value = Vec<PlayerInput>> {
    prop::collection::vec(arb_input(cols, rows), 1..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_core::world::World;

    #[test]
    fn test_busy_level_validates() {
        busy_level().validate().unwrap();
    }

    #[test]
    fn test_walkabout_replays_to_the_end() {
        let level = busy_level();
        let inputs = walkabout_inputs(&level);
        let mut world = World::new(1, &level);
        for input in &inputs {
            world.step(input);
        }
        assert_eq!(world.tick(), inputs.len() as u64);
        assert!(world.player.health <= world.player.max_health);
    }
}
