//! The world step loop.
//!
//! [`World::step`] is the only mutator, and its sub-step order is part
//! of the determinism contract:
//!
//! 1. reset the player's just-hit flag
//! 2. resolve player input
//! 3. recompute the visible-tile set
//! 4. when the level always simulates, or the input carried an action:
//!    advance the shared enemy-move clock, spawn due ammo, step every
//!    enemy (in storage order, over the tick-initial count), step every
//!    portal, then reload the clock when its cycle completed
//! 5. compact dead enemies and dead portals, preserving order
//! 6. advance the tick counter (exhaustion is fatal)

use crate::enemy::{blocking_archetypes, positions_as_set, Archetype, Enemy, EntityId};
use crate::grid::TileSet;
use crate::items::{Ammo, Key, HitPermissions, AMMO_PACK_SIZE};
use crate::level::{Level, Tuning};
use crate::math::{Fixed, TilePos};
use crate::player::{Player, PlayerInput};
use crate::portal::SpawnPortal;
use crate::rng::GameRng;
use crate::vision::Vision;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Beam countdown value on the tick a shot is fired. An entity is hit
/// exactly when the countdown still equals this maximum and the beam
/// endpoint is the entity's tile; afterwards the beam only lingers for
/// display.
pub const BEAM_MAX_COUNTDOWN: Fixed = Fixed::new(15);

/// The player's beam, armed by a shot and cooling down afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Beam {
    /// Ticks of visible lingering left.
    pub countdown: Fixed,
    /// Tile the beam ends on.
    pub end: TilePos,
}

/// Outcome query for a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldStatus {
    /// The run continues.
    Ongoing,
    /// No enemies remain and no portal will produce more.
    Won,
    /// The player ran out of health.
    Lost,
}

/// The full simulation state of one run.
///
/// Deep-clones cleanly; two clones stepped with the same inputs stay
/// identical forever.
#[derive(Debug, Clone)]
pub struct World {
    level: Level,
    /// The player. Read-only outside of [`World::step`].
    pub player: Player,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) portals: Vec<SpawnPortal>,
    pub(crate) ammos: Vec<Ammo>,
    pub(crate) keys: Vec<Key>,
    pub(crate) beam: Beam,
    obstacles: TileSet,
    visible_tiles: TileSet,
    tick: u64,
    enemy_clock_idx: Fixed,
    rng: GameRng,
    vision: Vision,
    next_entity_id: EntityId,
    pillar_key_dropped: bool,
    ultra_key_dropped: bool,
    portal_key_dropped: bool,
    question_deaths: Fixed,
}

impl World {
    /// Create a world from a seed and a level. A pure function of its
    /// inputs: equal arguments always produce identical worlds.
    #[must_use]
    pub fn new(seed: u64, level: &Level) -> Self {
        let mut world = Self {
            level: level.clone(),
            player: Player::new(level.tuning.player_max_health),
            enemies: Vec::new(),
            portals: Vec::new(),
            ammos: Vec::new(),
            keys: Vec::new(),
            beam: Beam::default(),
            obstacles: level.obstacles.clone(),
            visible_tiles: TileSet::new(level.num_cols, level.num_rows),
            tick: 0,
            enemy_clock_idx: Fixed::ZERO,
            rng: GameRng::seeded(seed),
            vision: Vision::new(level.num_cols, level.num_rows),
            next_entity_id: 0,
            pillar_key_dropped: false,
            ultra_key_dropped: false,
            portal_key_dropped: false,
            question_deaths: Fixed::ZERO,
        };
        for &(archetype, pos) in &level.enemies {
            world.spawn_enemy(archetype, pos);
        }
        for spec in &level.portals {
            let id = world.next_entity_id;
            world.next_entity_id += 1;
            world.portals.push(SpawnPortal::new(id, spec));
        }
        world.refresh_visible_tiles();
        tracing::debug!(
            seed,
            enemies = world.enemies.len(),
            portals = world.portals.len(),
            "world created"
        );
        world
    }

    /// Advance the world by one tick.
    pub fn step(&mut self, input: &PlayerInput) {
        self.player.just_hit = false;

        // The player is taken out for the duration of its sub-step so
        // the world stays freely borrowable; player code never reads
        // the world's player slot.
        let mut player = self.player.clone();
        player.step(self, input);
        self.player = player;

        self.refresh_visible_tiles();

        if self.level.always_simulate || input.is_action() {
            if self.enemy_clock_idx.is_positive() {
                self.enemy_clock_idx -= Fixed::ONE;
            }
            if self.level.use_ammo {
                self.spawn_ammo();
            }
            // Enemies spawned mid-tick wait until the next one.
            let enemy_count = self.enemies.len();
            for i in 0..enemy_count {
                let mut enemy = self.enemies[i].clone();
                enemy.step(self);
                self.enemies[i] = enemy;
            }
            let portal_count = self.portals.len();
            for i in 0..portal_count {
                let mut portal = self.portals[i].clone();
                portal.step(self);
                self.portals[i] = portal;
            }
            if self.enemy_clock_idx.is_zero() {
                self.enemy_clock_idx = self.level.enemy_move_cooldown;
            }
        }

        self.enemies.retain(Enemy::is_alive);
        self.portals.retain(|p| p.health().is_positive());

        self.tick = self.tick.checked_add(1).expect("tick counter exhausted");
        #[cfg(debug_assertions)]
        tracing::trace!(tick = self.tick, hash = self.state_hash(), "stepped");
    }

    /// Ticks elapsed since creation.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The level this world was created from.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Static obstacles, including pillar wrecks and question debris.
    #[must_use]
    pub fn obstacles(&self) -> &TileSet {
        &self.obstacles
    }

    /// Tiles visible from the player's position, as of the last step.
    #[must_use]
    pub fn visible_tiles(&self) -> &TileSet {
        &self.visible_tiles
    }

    /// Live enemies, in stable storage order.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Live portals, in stable storage order.
    #[must_use]
    pub fn portals(&self) -> &[SpawnPortal] {
        &self.portals
    }

    /// Ammo packs on the ground.
    #[must_use]
    pub fn ammos(&self) -> &[Ammo] {
        &self.ammos
    }

    /// Keys on the ground.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The beam, for display layers.
    #[must_use]
    pub fn beam(&self) -> Beam {
        self.beam
    }

    /// Visible tiles holding something the beam could damage right now.
    #[must_use]
    pub fn attackable_tiles(&self) -> TileSet {
        let mut targets = TileSet::new(self.level.num_cols, self.level.num_rows);
        for enemy in &self.enemies {
            if enemy.is_vulnerable(self.player.permissions) {
                targets.set(enemy.pos());
            }
        }
        for portal in &self.portals {
            targets.set(portal.pos());
        }
        targets.intersect_with(&self.visible_tiles);
        targets
    }

    /// Outcome of the run so far.
    #[must_use]
    pub fn status(&self) -> WorldStatus {
        if !self.player.health.is_positive() {
            WorldStatus::Lost
        } else if self.enemies.is_empty() && self.portals.iter().all(|p| !p.is_active()) {
            WorldStatus::Won
        } else {
            WorldStatus::Ongoing
        }
    }

    /// Hash over all observable state, for regression testing and
    /// divergence detection. Identical runs produce identical hash
    /// sequences.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.player.pos.hash(&mut hasher);
        self.player.on_map.hash(&mut hasher);
        self.player.health.hash(&mut hasher);
        self.player.timeout_idx.hash(&mut hasher);
        self.player.ammo_count.hash(&mut hasher);
        self.player.permissions.hash(&mut hasher);
        for enemy in &self.enemies {
            enemy.id().hash(&mut hasher);
            enemy.archetype().hash(&mut hasher);
            enemy.pos().hash(&mut hasher);
            enemy.health().hash(&mut hasher);
            enemy.state_name().hash(&mut hasher);
        }
        for portal in &self.portals {
            portal.id().hash(&mut hasher);
            portal.pos().hash(&mut hasher);
            portal.health().hash(&mut hasher);
        }
        self.obstacles.to_list().hash(&mut hasher);
        self.ammos.hash(&mut hasher);
        self.keys.hash(&mut hasher);
        self.beam.countdown.hash(&mut hasher);
        self.beam.end.hash(&mut hasher);
        self.enemy_clock_idx.hash(&mut hasher);
        self.question_deaths.hash(&mut hasher);
        hasher.finish()
    }

    // ---- internals shared with entity code ----

    pub(crate) fn tuning(&self) -> Tuning {
        self.level.tuning
    }

    pub(crate) fn obstacles_mut(&mut self) -> &mut TileSet {
        &mut self.obstacles
    }

    /// Whether the shared enemy-move clock is ready this tick.
    pub(crate) fn clock_ready(&self) -> bool {
        self.enemy_clock_idx.is_zero()
    }

    /// The beam-hit rule: an entity is hit this tick iff the beam was
    /// armed this very tick and ends on the entity's tile.
    pub(crate) fn beam_just_hit(&self, pos: TilePos) -> bool {
        self.beam.countdown == BEAM_MAX_COUNTDOWN && self.beam.end == pos
    }

    /// Player on the map and its tile mutually visible with `pos`.
    ///
    /// Sight is symmetric, so the per-tick visible set doubles as the
    /// enemies' player detector; it was refreshed before any enemy
    /// steps.
    pub(crate) fn player_spotted(&self, pos: TilePos) -> bool {
        self.player.on_map && self.visible_tiles.at(pos)
    }

    pub(crate) fn enemy_at(&self, pos: TilePos) -> bool {
        self.enemies.iter().any(|e| e.pos() == pos)
    }

    pub(crate) fn vulnerable_enemy_at(&self, pos: TilePos, perms: HitPermissions) -> bool {
        self.enemies
            .iter()
            .any(|e| e.pos() == pos && e.is_vulnerable(perms))
    }

    pub(crate) fn portal_at(&self, pos: TilePos) -> bool {
        self.portals.iter().any(|p| p.pos() == pos)
    }

    /// Occupancy mask for a moving enemy: obstacles plus the tiles of
    /// whichever other enemies its archetype treats as solid. Never
    /// contains the mover's own tile.
    pub(crate) fn blocked_for(&self, archetype: Archetype, mover: EntityId) -> TileSet {
        let solid = blocking_archetypes(archetype);
        let mut blocked = self.obstacles.clone();
        let others = positions_as_set(&self.enemies, self.level.num_cols, self.level.num_rows, |e| {
            e.id() != mover && solid.contains(&e.archetype())
        });
        blocked.union_with(&others);
        blocked
    }

    pub(crate) fn count_alive(&self, archetype: Archetype) -> Fixed {
        Fixed::new(
            self.enemies
                .iter()
                .filter(|e| e.is_alive() && e.archetype() == archetype)
                .count() as i64,
        )
    }

    pub(crate) fn count_alive_others(&self, archetype: Archetype, except: EntityId) -> Fixed {
        Fixed::new(
            self.enemies
                .iter()
                .filter(|e| e.id() != except && e.is_alive() && e.archetype() == archetype)
                .count() as i64,
        )
    }

    pub(crate) fn rng_roll(&mut self, low: Fixed, high: Fixed) -> Fixed {
        self.rng.range(low, high)
    }

    pub(crate) fn note_question_death(&mut self) -> Fixed {
        self.question_deaths += Fixed::ONE;
        self.question_deaths
    }

    pub(crate) fn hit_player(&mut self) {
        if !self.player.on_map {
            return;
        }
        tracing::debug!(health = %self.player.health, "player hit");
        self.player.hit(self.level.tuning.player_cooldown);
    }

    pub(crate) fn spawn_enemy(&mut self, archetype: Archetype, pos: TilePos) {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        let enemy = Enemy::spawn(id, archetype, pos, &self.level.tuning, &mut self.rng);
        tracing::debug!(?archetype, %pos, id, "enemy spawned");
        self.enemies.push(enemy);
    }

    pub(crate) fn drop_pillar_key(&mut self, pos: TilePos) {
        if self.pillar_key_dropped {
            return;
        }
        self.pillar_key_dropped = true;
        self.keys.push(Key::pillar_key(pos));
        tracing::debug!(%pos, "pillar key dropped");
    }

    /// The dying pillar's tile just became an obstacle, so its key
    /// lands on a random free tile instead.
    pub(crate) fn drop_ultra_key_nearby(&mut self, origin: TilePos) {
        if self.ultra_key_dropped {
            return;
        }
        let occupied = self.occupied_tiles();
        if let Some(pos) = occupied.random_unoccupied_pos(&mut self.rng) {
            self.ultra_key_dropped = true;
            self.keys.push(Key::ultra_key(pos));
            tracing::debug!(%origin, %pos, "ultra key dropped");
        }
    }

    pub(crate) fn drop_portal_key(&mut self, pos: TilePos) {
        if self.portal_key_dropped {
            return;
        }
        self.portal_key_dropped = true;
        self.keys.push(Key::portal_key(pos));
        tracing::debug!(%pos, "portal key dropped");
    }

    pub(crate) fn drop_master_key(&mut self, pos: TilePos) {
        self.keys.push(Key::master_key(pos));
        tracing::debug!(%pos, "master key dropped");
    }

    // ---- private helpers ----

    fn refresh_visible_tiles(&mut self) {
        let mut blockers = self.obstacles.clone();
        let enemies = positions_as_set(
            &self.enemies,
            self.level.num_cols,
            self.level.num_rows,
            |_| true,
        );
        blockers.union_with(&enemies);
        self.visible_tiles = self.vision.compute(self.player.pos, &blockers);
    }

    fn occupied_tiles(&self) -> TileSet {
        let mut occupied = self.obstacles.clone();
        let enemies = positions_as_set(
            &self.enemies,
            self.level.num_cols,
            self.level.num_rows,
            |_| true,
        );
        occupied.union_with(&enemies);
        for portal in &self.portals {
            occupied.set(portal.pos());
        }
        for ammo in &self.ammos {
            occupied.set(ammo.pos);
        }
        for key in &self.keys {
            occupied.set(key.pos);
        }
        if self.player.on_map {
            occupied.set(self.player.pos);
        }
        occupied
    }

    /// Top ammo up to the level's limit, one pack on a random free
    /// tile at a time. Stops early on a full board.
    fn spawn_ammo(&mut self) {
        let mut total = self.player.ammo_count;
        for ammo in &self.ammos {
            total += ammo.count;
        }
        while total < self.level.ammo_limit {
            let occupied = self.occupied_tiles();
            let Some(pos) = occupied.random_unoccupied_pos(&mut self.rng) else {
                break;
            };
            self.ammos.push(Ammo::pack(pos));
            total += AMMO_PACK_SIZE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Level, PortalSpec, Wave};

    fn fx(v: i64) -> Fixed {
        Fixed::new(v)
    }

    fn tp(x: i64, y: i64) -> TilePos {
        TilePos::from_raw(x, y)
    }

    fn fast_empty(cols: i64, rows: i64) -> Level {
        let mut level = Level::empty(fx(cols), fx(rows));
        level.enemy_move_cooldown = Fixed::ZERO;
        level.tuning.player_cooldown = Fixed::ZERO;
        level.tuning.hound_preparing_cooldown = Fixed::ONE;
        level.tuning.hound_move_cooldown_multiplier = Fixed::ONE;
        level.tuning.hound_attack_cooldown_multiplier = Fixed::ONE;
        level
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut level = fast_empty(6, 6);
        level.enemies.push((Archetype::Hound, tp(5, 5)));
        let a = World::new(7, &level);
        let b = World::new(7, &level);
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_replay_reproduces_hash_sequence() {
        let mut level = fast_empty(6, 6);
        level.enemies.push((Archetype::Hound, tp(5, 5)));
        level.enemies.push((Archetype::Question, tp(0, 5)));
        let inputs = [
            PlayerInput::move_to(tp(0, 0)),
            PlayerInput::idle(),
            PlayerInput::move_to(tp(1, 1)),
            PlayerInput::idle(),
            PlayerInput::idle(),
        ];
        let mut a = World::new(99, &level);
        let mut b = World::new(99, &level);
        for input in &inputs {
            a.step(input);
            b.step(input);
            assert_eq!(a.state_hash(), b.state_hash(), "diverged at tick {}", a.tick());
        }
    }

    #[test]
    fn test_clone_independence() {
        let mut level = fast_empty(6, 6);
        level.enemies.push((Archetype::Hound, tp(5, 5)));
        let mut original = World::new(3, &level);
        original.step(&PlayerInput::move_to(tp(0, 0)));
        let snapshot = original.clone();
        let hash_at_snapshot = snapshot.state_hash();
        for _ in 0..10 {
            original.step(&PlayerInput::idle());
        }
        assert_eq!(
            snapshot.state_hash(),
            hash_at_snapshot,
            "stepping the original must not disturb the clone"
        );
        let mut replayed = snapshot.clone();
        let mut resumed = snapshot;
        for _ in 0..10 {
            replayed.step(&PlayerInput::idle());
            resumed.step(&PlayerInput::idle());
        }
        assert_eq!(replayed.state_hash(), resumed.state_hash());
        assert_eq!(replayed.state_hash(), original.state_hash());
    }

    #[test]
    fn test_paused_unless_action_when_not_always_simulating() {
        let mut level = fast_empty(6, 6);
        level.always_simulate = false;
        level.enemies.push((Archetype::Hound, tp(5, 5)));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        let hound_pos = world.enemies()[0].pos();
        for _ in 0..5 {
            world.step(&PlayerInput::idle());
        }
        assert_eq!(
            world.enemies()[0].pos(),
            hound_pos,
            "idle ticks freeze the board in board-game mode"
        );
        world.step(&PlayerInput::move_to(tp(1, 0)));
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::move_to(tp(1, 0)));
        assert_ne!(world.enemies()[0].pos(), hound_pos, "actions advance the board");
    }

    #[test]
    fn test_compaction_preserves_survivor_order() {
        // Hounds on separate rows so none of them shadows another from
        // the player's corner.
        let mut level = fast_empty(5, 4);
        level.tuning.hound_max_health = fx(1);
        level.enemy_move_cooldown = fx(1000); // hold every enemy still
        level.enemies.push((Archetype::Hound, tp(4, 1)));
        level.enemies.push((Archetype::Hound, tp(4, 2)));
        level.enemies.push((Archetype::Hound, tp(4, 3)));
        let mut world = World::new(1, &level);
        let ids: Vec<_> = world.enemies().iter().map(Enemy::id).collect();
        world.step(&PlayerInput::move_to(tp(0, 0)));
        world.step(&PlayerInput::shoot_at(tp(4, 2)));
        let survivors: Vec<_> = world.enemies().iter().map(Enemy::id).collect();
        assert_eq!(survivors, vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_tick_advances_every_step() {
        let mut world = World::new(1, &fast_empty(3, 3));
        assert_eq!(world.tick(), 0);
        world.step(&PlayerInput::idle());
        world.step(&PlayerInput::idle());
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn test_visible_tiles_refresh_before_enemies_react() {
        // The hound reacts to the player's new position on the very
        // tick the player arrives.
        let mut level = fast_empty(5, 5);
        level.enemies.push((Archetype::Hound, tp(4, 4)));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        assert_eq!(world.enemies()[0].state_name(), "PreparingToAttack");
    }

    #[test]
    fn test_ammo_spawns_up_to_limit() {
        let mut level = fast_empty(6, 6);
        level.use_ammo = true;
        level.ammo_limit = fx(6);
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        let on_ground: Fixed = world
            .ammos()
            .iter()
            .fold(Fixed::ZERO, |acc, a| acc + a.count);
        assert_eq!(on_ground + world.player.ammo_count, fx(6));
        // Stepping again never overshoots the limit.
        world.step(&PlayerInput::idle());
        let on_ground: Fixed = world
            .ammos()
            .iter()
            .fold(Fixed::ZERO, |acc, a| acc + a.count);
        assert_eq!(on_ground + world.player.ammo_count, fx(6));
    }

    #[test]
    fn test_lost_when_health_runs_out() {
        let mut level = fast_empty(2, 1);
        level.tuning.player_max_health = fx(1);
        level.tuning.hound_preparing_cooldown = Fixed::ONE;
        level.tuning.hound_move_cooldown_multiplier = Fixed::ONE;
        level.tuning.hound_attack_cooldown_multiplier = Fixed::ONE;
        level.enemies.push((Archetype::Hound, tp(1, 0)));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        assert_eq!(world.status(), WorldStatus::Ongoing);
        // Preparing, attacking, then the adjacent hound steps onto the player.
        world.step(&PlayerInput::idle());
        world.step(&PlayerInput::idle());
        assert!(world.player.just_hit);
        assert_eq!(world.status(), WorldStatus::Lost);
    }

    #[test]
    fn test_full_scenario_portal_spawn_kill_win() {
        // 5x5 empty level with one portal scheduled to spawn a single
        // enemy: world starts Ongoing, the enemy appears, the player
        // kills it, and once nothing remains the world reports Won.
        let mut level = fast_empty(5, 5);
        level.tuning.hound_max_health = fx(1);
        level.portals.push(PortalSpec {
            pos: tp(4, 4),
            cooldown: Fixed::ONE,
            waves: vec![Wave::hounds(Fixed::ONE, Fixed::ONE)],
        });
        let mut world = World::new(1, &level);
        assert_eq!(world.status(), WorldStatus::Ongoing);

        world.step(&PlayerInput::move_to(tp(0, 0)));
        assert!(world.enemies().is_empty());
        world.step(&PlayerInput::idle());
        assert_eq!(world.enemies().len(), 1, "wave fired");
        assert_eq!(world.status(), WorldStatus::Ongoing);

        let target = world.enemies()[0].pos();
        world.step(&PlayerInput::shoot_at(target));
        assert!(world.enemies().is_empty(), "hound shot down");
        assert_eq!(world.status(), WorldStatus::Won);
    }

    #[test]
    fn test_attackable_tiles_requires_vulnerability_and_sight() {
        let mut level = fast_empty(5, 1);
        level.enemy_move_cooldown = fx(1000);
        level.enemies.push((Archetype::UltraHound, tp(2, 0)));
        level.enemies.push((Archetype::Hound, tp(4, 0)));
        let mut world = World::new(1, &level);
        world.step(&PlayerInput::move_to(tp(0, 0)));
        let attackable = world.attackable_tiles();
        assert!(
            !attackable.at(tp(2, 0)),
            "ultra hound not vulnerable without its permission"
        );
        assert!(
            !attackable.at(tp(4, 0)),
            "hound hidden behind the ultra hound's bulk"
        );
        world.player.permissions.ultra_hound = true;
        assert!(world.attackable_tiles().at(tp(2, 0)));
    }
}
