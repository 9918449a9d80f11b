//! Pickups and hit permissions.
//!
//! Keys gate the progression: each enemy archetype (and the spawn
//! portals) can only be damaged once the player holds the matching
//! permission, and permissions are granted by keys dropped on specific
//! deaths.

use crate::math::{Fixed, TilePos};
use serde::{Deserialize, Serialize};

/// Shots granted by one ammo pack.
pub const AMMO_PACK_SIZE: Fixed = Fixed::new(3);

/// Which targets the player's beam can damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct HitPermissions {
    pub hound: bool,
    pub ultra_hound: bool,
    pub pillar: bool,
    pub king: bool,
    pub question: bool,
    pub portal: bool,
}

impl HitPermissions {
    /// Permissions the player starts every run with.
    #[must_use]
    pub fn starting() -> Self {
        Self {
            hound: true,
            king: true,
            question: true,
            ..Self::default()
        }
    }

    /// Add every permission `other` grants.
    pub fn merge(&mut self, other: Self) {
        self.hound |= other.hound;
        self.ultra_hound |= other.ultra_hound;
        self.pillar |= other.pillar;
        self.king |= other.king;
        self.question |= other.question;
        self.portal |= other.portal;
    }
}

/// A key pickup lying on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Tile the key lies on.
    pub pos: TilePos,
    /// Permissions granted on pickup.
    pub grants: HitPermissions,
}

impl Key {
    /// Key unlocking pillars. Dropped by hounds, rarely.
    #[must_use]
    pub fn pillar_key(pos: TilePos) -> Self {
        Self {
            pos,
            grants: HitPermissions {
                pillar: true,
                ..HitPermissions::default()
            },
        }
    }

    /// Key unlocking ultra hounds. Dropped when pillars run out.
    #[must_use]
    pub fn ultra_key(pos: TilePos) -> Self {
        Self {
            pos,
            grants: HitPermissions {
                ultra_hound: true,
                ..HitPermissions::default()
            },
        }
    }

    /// Key unlocking spawn portals. Dropped when ultra hounds run out.
    #[must_use]
    pub fn portal_key(pos: TilePos) -> Self {
        Self {
            pos,
            grants: HitPermissions {
                portal: true,
                ..HitPermissions::default()
            },
        }
    }

    /// Key dropped by a dying king: unlocks ultra hounds and portals at once.
    #[must_use]
    pub fn master_key(pos: TilePos) -> Self {
        Self {
            pos,
            grants: HitPermissions {
                ultra_hound: true,
                portal: true,
                ..HitPermissions::default()
            },
        }
    }
}

/// An ammo pack lying on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ammo {
    /// Tile the pack lies on.
    pub pos: TilePos,
    /// Shots granted on pickup.
    pub count: Fixed,
}

impl Ammo {
    /// A standard pack at the given tile.
    #[must_use]
    pub fn pack(pos: TilePos) -> Self {
        Self {
            pos,
            count: AMMO_PACK_SIZE,
        }
    }
}
