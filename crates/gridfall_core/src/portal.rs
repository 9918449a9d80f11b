//! Wave-based spawn portals.
//!
//! A portal works through an ordered wave schedule. Each wave starts a
//! fixed number of ticks after the previous one and carries
//! per-archetype spawn counts; the current wave is the last one whose
//! start tick has been reached. Whenever the portal's own cooldown has
//! expired and the shared enemy-move clock is ready, it spawns exactly
//! one enemy from the current wave, strongest archetype first.

use crate::enemy::{Archetype, EntityId};
use crate::level::PortalSpec;
use crate::math::{Fixed, TilePos};
use crate::world::World;

#[derive(Debug, Clone)]
struct WaveState {
    start_tick: Fixed,
    n_kings: Fixed,
    n_ultra_hounds: Fixed,
    n_hounds: Fixed,
}

impl WaveState {
    fn exhausted(&self) -> bool {
        !self.n_kings.is_positive()
            && !self.n_ultra_hounds.is_positive()
            && !self.n_hounds.is_positive()
    }
}

/// One spawn portal on the board.
#[derive(Debug, Clone)]
pub struct SpawnPortal {
    id: EntityId,
    pos: TilePos,
    health: Fixed,
    cooldown: Fixed,
    timeout_idx: Fixed,
    frame_idx: Fixed,
    waves: Vec<WaveState>,
}

/// Portals go down in one hit once the portal permission is held.
pub const PORTAL_MAX_HEALTH: Fixed = Fixed::ONE;

impl SpawnPortal {
    pub(crate) fn new(id: EntityId, spec: &PortalSpec) -> Self {
        let mut start = Fixed::ZERO;
        let waves = spec
            .waves
            .iter()
            .map(|wave| {
                start += wave.ticks_after_last;
                WaveState {
                    start_tick: start,
                    n_kings: wave.n_kings,
                    n_ultra_hounds: wave.n_ultra_hounds,
                    n_hounds: wave.n_hounds,
                }
            })
            .collect();
        Self {
            id,
            pos: spec.pos,
            health: PORTAL_MAX_HEALTH,
            cooldown: spec.cooldown,
            timeout_idx: Fixed::ZERO,
            frame_idx: Fixed::ZERO,
            waves,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Tile the portal sits on.
    #[must_use]
    pub fn pos(&self) -> TilePos {
        self.pos
    }

    /// Remaining health. Dead portals are compacted out.
    #[must_use]
    pub fn health(&self) -> Fixed {
        self.health
    }

    /// Whether this portal still has work to do.
    ///
    /// Active until the last wave has started and run out of spawns.
    /// Expiry never destroys the portal; only beam damage does.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self.current_wave_index() {
            None => !self.waves.is_empty(),
            Some(i) => i + 1 < self.waves.len() || !self.waves[i].exhausted(),
        }
    }

    /// Index of the last wave whose start tick has been reached.
    fn current_wave_index(&self) -> Option<usize> {
        self.waves
            .iter()
            .rposition(|wave| wave.start_tick <= self.frame_idx)
    }

    /// Advance this portal by one tick. Same take-out/put-back calling
    /// convention as enemies.
    pub(crate) fn step(&mut self, w: &mut World) {
        if w.beam_just_hit(self.pos) && w.player.permissions.portal {
            self.health -= Fixed::ONE;
        }
        if !self.health.is_positive() {
            // Destroyed this very tick: no parting spawn.
            self.frame_idx += Fixed::ONE;
            return;
        }
        if self.timeout_idx.is_positive() {
            self.timeout_idx -= Fixed::ONE;
        } else if w.clock_ready() {
            if let Some(archetype) = self.take_next_spawn() {
                w.spawn_enemy(archetype, self.pos);
                self.timeout_idx = self.cooldown;
            }
        }
        self.frame_idx += Fixed::ONE;
    }

    /// Pull one spawn out of the current wave, strongest archetype first.
    fn take_next_spawn(&mut self) -> Option<Archetype> {
        let idx = self.current_wave_index()?;
        let wave = &mut self.waves[idx];
        if wave.n_kings.is_positive() {
            wave.n_kings -= Fixed::ONE;
            Some(Archetype::King)
        } else if wave.n_ultra_hounds.is_positive() {
            wave.n_ultra_hounds -= Fixed::ONE;
            Some(Archetype::UltraHound)
        } else if wave.n_hounds.is_positive() {
            wave.n_hounds -= Fixed::ONE;
            Some(Archetype::Hound)
        } else {
            None
        }
    }
}
