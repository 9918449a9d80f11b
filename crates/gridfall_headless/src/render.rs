//! ASCII rendering of a world snapshot.
//!
//! Same glyphs as the level sketch format, plus `@` for the player,
//! `O` for portals, `a`/`*` for pickups. Tiles outside the player's
//! sight are dimmed to `~` so a rendered frame also shows what the
//! player could actually see.

use gridfall_core::enemy::Archetype;
use gridfall_core::math::TilePos;
use gridfall_core::world::World;
use std::fmt::Write;

fn glyph(archetype: Archetype) -> char {
    match archetype {
        Archetype::Hound => 'h',
        Archetype::UltraHound => 'u',
        Archetype::Pillar => 'p',
        Archetype::King => 'k',
        Archetype::Question => '?',
    }
}

/// Render the board, one row per line.
#[must_use]
pub fn render_ascii(world: &World) -> String {
    let cols = world.level().num_cols.raw();
    let rows = world.level().num_rows.raw();
    let mut out = String::with_capacity(((cols + 1) * rows) as usize);
    for y in 0..rows {
        for x in 0..cols {
            let pos = TilePos::from_raw(x, y);
            out.push(glyph_at(world, pos));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "tick {} | status {:?} | hp {} | ammo {}",
        world.tick(),
        world.status(),
        world.player.health,
        world.player.ammo_count
    );
    out
}

fn glyph_at(world: &World, pos: TilePos) -> char {
    if world.player.on_map && world.player.pos == pos {
        return '@';
    }
    if let Some(enemy) = world.enemies().iter().find(|e| e.pos() == pos) {
        return glyph(enemy.archetype());
    }
    if world.portals().iter().any(|p| p.pos() == pos) {
        return 'O';
    }
    if world.keys().iter().any(|k| k.pos == pos) {
        return '*';
    }
    if world.ammos().iter().any(|a| a.pos == pos) {
        return 'a';
    }
    if world.obstacles().at(pos) {
        return '#';
    }
    if world.player.on_map && !world.visible_tiles().at(pos) {
        return '~';
    }
    '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfall_core::level::Level;
    use gridfall_core::math::Fixed;
    use gridfall_core::player::PlayerInput;

    #[test]
    fn test_render_shows_board_contents() {
        let level = Level::from_ascii(
            "..#
             ...
             ..h",
        )
        .unwrap();
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(TilePos::from_raw(0, 0)));
        let frame = render_ascii(&world);
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines[0].chars().next(), Some('@'));
        assert_eq!(lines[0].chars().nth(2), Some('#'));
        assert_eq!(lines[2].chars().nth(2), Some('h'));
        assert!(lines[3].starts_with("tick 1"));
    }

    #[test]
    fn test_render_dims_unseen_tiles() {
        let level = Level::from_ascii(
            ".#.
             .#.
             ...",
        )
        .unwrap();
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(TilePos::from_raw(0, 0)));
        let frame = render_ascii(&world);
        let lines: Vec<&str> = frame.lines().collect();
        // (2, 0) is walled off from the viewer's line of sight.
        assert_eq!(lines[0].chars().nth(2), Some('~'));
    }

    #[test]
    fn test_render_off_map_player_sees_everything() {
        let level = Level::empty(Fixed::new(3), Fixed::new(3));
        let world = World::new(1, &level);
        let frame = render_ascii(&world);
        assert!(!frame.contains('@'));
        assert!(!frame.contains('~'));
    }
}
