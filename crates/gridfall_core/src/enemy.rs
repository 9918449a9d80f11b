//! Enemy archetypes and their state machines.
//!
//! Archetypes form a closed set, so enemies are a tagged union rather
//! than trait objects: the world needs to count and match on concrete
//! archetypes (spawn priorities, death effects), and a closed enum
//! keeps every behavior in one place.

use crate::grid::TileSet;
use crate::level::Tuning;
use crate::math::{Fixed, TilePos};
use crate::pathfinding::shortest_path;
use crate::rng::GameRng;
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Stable identifier assigned at spawn, never reused within a run.
pub type EntityId = u64;

/// The closed set of enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Primary combatant with a five-state hunting behavior.
    Hound,
    /// Heavy tank; immune until the ultra permission is found.
    UltraHound,
    /// Immobile hazard that turns into an obstacle on death.
    Pillar,
    /// Elite: immune without the king permission, spawns a hound on
    /// every effective hit.
    King,
    /// Immobile mystery object whose death mutates the world.
    Question,
}

/// Hunting states of a hound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoundState {
    /// Wandering toward a random target, watching for the player.
    Searching,
    /// Player spotted; winding up before the chase.
    PreparingToAttack,
    /// Chasing the player.
    Attacking,
    /// Recovering after a beam hit.
    Hit,
    /// Waiting for compaction.
    Dead,
}

#[derive(Debug, Clone)]
struct HoundBrain {
    state: HoundState,
    preparing_idx: Fixed,
    hit_idx: Fixed,
    move_idx: Fixed,
    attack_idx: Fixed,
    wander_target: Option<TilePos>,
    rng: GameRng,
}

#[derive(Debug, Clone)]
struct UltraBrain {
    freeze_idx: Fixed,
    move_idx: Fixed,
}

#[derive(Debug, Clone)]
struct KingBrain {
    freeze_idx: Fixed,
    move_idx: Fixed,
}

#[derive(Debug, Clone)]
enum Brain {
    Hound(HoundBrain),
    UltraHound(UltraBrain),
    Pillar,
    King(KingBrain),
    Question,
}

/// One enemy on the board.
#[derive(Debug, Clone)]
pub struct Enemy {
    id: EntityId,
    pos: TilePos,
    health: Fixed,
    max_health: Fixed,
    brain: Brain,
}

impl Enemy {
    /// Create an enemy of the given archetype.
    ///
    /// Archetypes that need their own randomness fork a child stream
    /// from `parent_rng`, so the spawn order fixes every later roll.
    #[must_use]
    pub fn spawn(
        id: EntityId,
        archetype: Archetype,
        pos: TilePos,
        tuning: &Tuning,
        parent_rng: &mut GameRng,
    ) -> Self {
        let (health, brain) = match archetype {
            Archetype::Hound => (
                tuning.hound_max_health,
                Brain::Hound(HoundBrain {
                    state: HoundState::Searching,
                    preparing_idx: Fixed::ZERO,
                    hit_idx: Fixed::ZERO,
                    move_idx: tuning.hound_move_cooldown_multiplier,
                    attack_idx: tuning.hound_attack_cooldown_multiplier,
                    wander_target: None,
                    rng: parent_rng.fork(),
                }),
            ),
            Archetype::UltraHound => (
                tuning.ultra_hound_max_health,
                Brain::UltraHound(UltraBrain {
                    freeze_idx: Fixed::ZERO,
                    move_idx: tuning.ultra_hound_move_cooldown_multiplier,
                }),
            ),
            Archetype::Pillar => (tuning.pillar_max_health, Brain::Pillar),
            Archetype::King => (
                tuning.king_max_health,
                Brain::King(KingBrain {
                    freeze_idx: Fixed::ZERO,
                    move_idx: tuning.king_move_cooldown_multiplier,
                }),
            ),
            Archetype::Question => (tuning.question_max_health, Brain::Question),
        };
        Self {
            id,
            pos,
            health,
            max_health: health,
            brain,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current tile.
    #[must_use]
    pub fn pos(&self) -> TilePos {
        self.pos
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> Fixed {
        self.health
    }

    /// Health this enemy spawned with.
    #[must_use]
    pub fn max_health(&self) -> Fixed {
        self.max_health
    }

    /// Which archetype this enemy is.
    #[must_use]
    pub fn archetype(&self) -> Archetype {
        match self.brain {
            Brain::Hound(_) => Archetype::Hound,
            Brain::UltraHound(_) => Archetype::UltraHound,
            Brain::Pillar => Archetype::Pillar,
            Brain::King(_) => Archetype::King,
            Brain::Question => Archetype::Question,
        }
    }

    /// Dead enemies are compacted out at the end of the tick.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health.is_positive()
    }

    /// Whether the beam can damage this enemy right now.
    #[must_use]
    pub fn is_vulnerable(&self, perms: crate::items::HitPermissions) -> bool {
        match &self.brain {
            Brain::Hound(brain) => {
                perms.hound && !matches!(brain.state, HoundState::Hit | HoundState::Dead)
            }
            Brain::UltraHound(brain) => perms.ultra_hound && brain.freeze_idx.is_zero(),
            Brain::Pillar => perms.pillar,
            Brain::King(brain) => perms.king && brain.freeze_idx.is_zero(),
            Brain::Question => perms.question,
        }
    }

    /// Hound hunting state, for hounds.
    #[must_use]
    pub fn hound_state(&self) -> Option<HoundState> {
        match &self.brain {
            Brain::Hound(brain) => Some(brain.state),
            _ => None,
        }
    }

    /// Human-readable behavior state, for display layers.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match &self.brain {
            Brain::Hound(brain) => match brain.state {
                HoundState::Searching => "Searching",
                HoundState::PreparingToAttack => "PreparingToAttack",
                HoundState::Attacking => "Attacking",
                HoundState::Hit => "Hit",
                HoundState::Dead => "Dead",
            },
            Brain::UltraHound(brain) if brain.freeze_idx.is_positive() => "Frozen",
            Brain::UltraHound(_) => "Chasing",
            Brain::King(brain) if brain.freeze_idx.is_positive() => "Frozen",
            Brain::King(_) => "Chasing",
            Brain::Pillar => "Standing",
            Brain::Question => "Waiting",
        }
    }

    /// Advance this enemy by one tick.
    ///
    /// Called with the enemy taken out of the world's list, so the
    /// world stays freely borrowable; the caller writes the enemy back
    /// afterwards.
    pub fn step(&mut self, w: &mut World) {
        let vulnerable = self.is_vulnerable(w.player.permissions);
        match &mut self.brain {
            Brain::Hound(brain) => {
                step_hound(self.id, &mut self.pos, &mut self.health, brain, vulnerable, w);
            }
            Brain::UltraHound(brain) => {
                step_ultra(self.id, &mut self.pos, &mut self.health, brain, vulnerable, w);
            }
            Brain::Pillar => step_pillar(self.id, self.pos, &mut self.health, vulnerable, w),
            Brain::King(brain) => {
                step_king(self.id, &mut self.pos, &mut self.health, brain, vulnerable, w);
            }
            Brain::Question => step_question(self.pos, &mut self.health, vulnerable, w),
        }
    }
}

/// Two-level movement gate.
///
/// The world-global enemy-move clock must be ready before the
/// per-entity countdown even decrements; the entity moves when its own
/// countdown reaches zero, then reloads the archetype's multiplier.
/// Larger multipliers make slower enemies.
fn movement_ready(clock_ready: bool, countdown: &mut Fixed, multiplier: Fixed) -> bool {
    if !clock_ready {
        return false;
    }
    if countdown.is_positive() {
        *countdown -= Fixed::ONE;
    }
    if countdown.is_zero() {
        *countdown = multiplier;
        true
    } else {
        false
    }
}

fn step_hound(
    id: EntityId,
    pos: &mut TilePos,
    health: &mut Fixed,
    brain: &mut HoundBrain,
    vulnerable: bool,
    w: &mut World,
) {
    let t = w.tuning();
    if w.beam_just_hit(*pos) && vulnerable {
        *health -= Fixed::ONE;
        if health.is_positive() {
            brain.state = HoundState::Hit;
            brain.hit_idx = t.hound_hit_cooldown;
        } else {
            brain.state = HoundState::Dead;
            // A dying hound occasionally carries the pillar key.
            if w.rng_roll(Fixed::ZERO, Fixed::new(10)).is_zero() {
                w.drop_pillar_key(*pos);
            }
        }
        return;
    }

    match brain.state {
        HoundState::Dead => {}
        HoundState::Hit => {
            if brain.hit_idx.is_positive() {
                brain.hit_idx -= Fixed::ONE;
            }
            if brain.hit_idx.is_zero() {
                brain.state = if w.player_spotted(*pos) {
                    brain.preparing_idx = t.hound_preparing_cooldown;
                    HoundState::PreparingToAttack
                } else {
                    HoundState::Searching
                };
            }
        }
        HoundState::Searching => {
            if w.player_spotted(*pos) {
                brain.state = HoundState::PreparingToAttack;
                brain.preparing_idx = t.hound_preparing_cooldown;
                return;
            }
            if !movement_ready(
                w.clock_ready(),
                &mut brain.move_idx,
                t.hound_move_cooldown_multiplier,
            ) {
                return;
            }
            if brain.wander_target.map_or(true, |target| target == *pos) {
                brain.wander_target = w.obstacles().random_unoccupied_pos(&mut brain.rng);
            }
            if let Some(target) = brain.wander_target {
                let blocked = w.blocked_for(Archetype::Hound, id);
                let path = shortest_path(*pos, target, &blocked);
                if path.len() > 1 {
                    *pos = path[1];
                } else {
                    // Target unreachable right now; pick a fresh one next move.
                    brain.wander_target = None;
                }
            }
        }
        HoundState::PreparingToAttack => {
            if !w.player_spotted(*pos) {
                brain.state = HoundState::Searching;
                return;
            }
            if brain.preparing_idx.is_positive() {
                brain.preparing_idx -= Fixed::ONE;
            }
            if brain.preparing_idx.is_zero() {
                brain.state = HoundState::Attacking;
            }
        }
        HoundState::Attacking => {
            if !w.player_spotted(*pos) {
                brain.state = HoundState::Searching;
                return;
            }
            if !movement_ready(
                w.clock_ready(),
                &mut brain.attack_idx,
                t.hound_attack_cooldown_multiplier,
            ) {
                return;
            }
            let blocked = w.blocked_for(Archetype::Hound, id);
            let path = shortest_path(*pos, w.player.pos, &blocked);
            if path.len() > 1 {
                *pos = path[1];
                if *pos == w.player.pos && t.hound_hits_player {
                    w.hit_player();
                }
            }
        }
    }
}

fn step_ultra(
    id: EntityId,
    pos: &mut TilePos,
    health: &mut Fixed,
    brain: &mut UltraBrain,
    vulnerable: bool,
    w: &mut World,
) {
    let t = w.tuning();
    if w.beam_just_hit(*pos) && vulnerable {
        *health -= Fixed::ONE;
        brain.freeze_idx = t.ultra_hound_freeze_cooldown;
        if !health.is_positive() && w.count_alive_others(Archetype::UltraHound, id) < Fixed::ONE {
            w.drop_portal_key(*pos);
        }
        return;
    }
    if brain.freeze_idx.is_positive() {
        brain.freeze_idx -= Fixed::ONE;
        return;
    }
    if !w.player_spotted(*pos) {
        return;
    }
    if movement_ready(
        w.clock_ready(),
        &mut brain.move_idx,
        t.ultra_hound_move_cooldown_multiplier,
    ) {
        let blocked = w.blocked_for(Archetype::UltraHound, id);
        let path = shortest_path(*pos, w.player.pos, &blocked);
        if path.len() > 1 {
            *pos = path[1];
            if *pos == w.player.pos {
                w.hit_player();
            }
        }
    }
}

fn step_pillar(id: EntityId, pos: TilePos, health: &mut Fixed, vulnerable: bool, w: &mut World) {
    if w.beam_just_hit(pos) && vulnerable {
        *health -= Fixed::ONE;
        if !health.is_positive() {
            // The wreck seals the tile permanently.
            w.obstacles_mut().set(pos);
            if w.count_alive_others(Archetype::Pillar, id) < Fixed::ONE {
                w.drop_ultra_key_nearby(pos);
            }
        }
    }
}

fn step_king(
    id: EntityId,
    pos: &mut TilePos,
    health: &mut Fixed,
    brain: &mut KingBrain,
    vulnerable: bool,
    w: &mut World,
) {
    let t = w.tuning();
    if w.beam_just_hit(*pos) && vulnerable {
        *health -= Fixed::ONE;
        brain.freeze_idx = t.king_freeze_cooldown;
        // Every effective hit calls in reinforcements.
        w.spawn_enemy(Archetype::Hound, *pos);
        if !health.is_positive() {
            w.drop_master_key(*pos);
        }
        return;
    }
    if brain.freeze_idx.is_positive() {
        brain.freeze_idx -= Fixed::ONE;
        return;
    }
    if !w.player_spotted(*pos) {
        return;
    }
    if movement_ready(
        w.clock_ready(),
        &mut brain.move_idx,
        t.king_move_cooldown_multiplier,
    ) {
        let blocked = w.blocked_for(Archetype::King, id);
        let path = shortest_path(*pos, w.player.pos, &blocked);
        if path.len() > 1 {
            *pos = path[1];
            if *pos == w.player.pos {
                w.hit_player();
            }
        }
    }
}

fn step_question(pos: TilePos, health: &mut Fixed, vulnerable: bool, w: &mut World) {
    if w.beam_just_hit(pos) && vulnerable {
        *health -= Fixed::ONE;
        if !health.is_positive() {
            question_death_effect(pos, w);
        }
    }
}

/// World mutation triggered by a question death.
///
/// Branch selection depends on the running count of question deaths,
/// the live enemy mix and a seeded roll. The thresholds are part of
/// the game's balance and must not drift between versions.
fn question_death_effect(pos: TilePos, w: &mut World) {
    let deaths = w.note_question_death();
    if deaths == Fixed::ONE {
        return;
    }
    if deaths == Fixed::TWO {
        w.drop_pillar_key(pos);
        return;
    }
    let hounds = w.count_alive(Archetype::Hound);
    if (deaths % Fixed::new(4)).is_zero() && hounds <= Fixed::new(4) {
        let ultras = w.count_alive(Archetype::UltraHound);
        let roll = w.rng_roll(Fixed::ZERO, Fixed::new(100));
        if ultras < Fixed::ONE && (roll <= Fixed::new(40) || deaths <= Fixed::new(4)) {
            w.spawn_enemy(Archetype::UltraHound, pos);
        } else {
            w.spawn_enemy(Archetype::Pillar, pos);
        }
    } else {
        w.obstacles_mut().set(pos);
    }
}

/// Occupancy mask blocking a mover: static obstacles plus whichever
/// other enemies this archetype treats as solid. Hounds only avoid
/// other hounds and ultra hounds only other ultras, so packs of the
/// same archetype spread out while everything else is walked through.
/// Never contains the mover's own tile.
pub(crate) fn blocking_archetypes(archetype: Archetype) -> &'static [Archetype] {
    match archetype {
        Archetype::Hound => &[Archetype::Hound],
        Archetype::UltraHound => &[Archetype::UltraHound],
        Archetype::King => &[
            Archetype::Hound,
            Archetype::UltraHound,
            Archetype::Pillar,
            Archetype::King,
            Archetype::Question,
        ],
        // Immobile archetypes never query a mask.
        Archetype::Pillar | Archetype::Question => &[],
    }
}

/// Helper for the world: positions of the given enemies as a tile set.
pub(crate) fn positions_as_set(
    enemies: &[Enemy],
    num_cols: Fixed,
    num_rows: Fixed,
    mut include: impl FnMut(&Enemy) -> bool,
) -> TileSet {
    let mut set = TileSet::new(num_cols, num_rows);
    for enemy in enemies.iter().filter(|e| include(e)) {
        set.set(enemy.pos());
    }
    set
}
