//! Entity references and capability traits.
//!
//! There is no entity base class. Each kind of thing in the world composes the
//! capabilities it needs: everything drawable is a [`Body`], things that take
//! damage are [`Damageable`], and enemies additionally own movement, sense and
//! attack strategies (see [`crate::enemy`]).

use serde::{Deserialize, Serialize};

use ashfall_common::EntityId;
use ashfall_kernel::Rect;

/// Identifier stored in the map's spatial grid.
///
/// Ordering is deterministic (walls, then platforms, then enemies, then
/// pickups) so grid queries and collision handling are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityRef {
    /// Static solid wall, by index
    Wall(usize),
    /// One-way platform, by index
    Platform(usize),
    /// Enemy
    Enemy(EntityId),
    /// Pickup
    Pickup(EntityId),
    /// The player. Never stored in the grid, only used as a mover id.
    Player,
}

impl EntityRef {
    /// Walls and platforms stop movement.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        matches!(self, Self::Wall(_) | Self::Platform(_))
    }

    /// Returns true for walls.
    #[must_use]
    pub const fn is_wall(&self) -> bool {
        matches!(self, Self::Wall(_))
    }

    /// Returns the enemy ID, if this is an enemy.
    #[must_use]
    pub const fn enemy(&self) -> Option<EntityId> {
        match self {
            Self::Enemy(id) => Some(*id),
            _ => None,
        }
    }
}

/// Something that can deal or receive hits, as reported in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// The player
    Player,
    /// An enemy
    Enemy(EntityId),
}

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Facing -x
    Left,
    /// Facing +x
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The other way.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing from the sign of `dx`. Zero gives `None`.
    #[must_use]
    pub fn from_sign(dx: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(Self::Right)
        } else if dx < 0.0 {
            Some(Self::Left)
        } else {
            None
        }
    }

    /// Facing from `from` toward `to` along x.
    #[must_use]
    pub fn toward(from: &Rect, to: &Rect) -> Self {
        if to.center_x() < from.center_x() {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Anything with a box in the world and a state for the renderer.
pub trait Body {
    /// Presentation state tag.
    type State: Copy;

    /// Current box.
    fn rect(&self) -> Rect;

    /// Current presentation state.
    fn state(&self) -> Self::State;
}

/// Something that takes hits.
pub trait Damageable {
    /// Applies a hit and returns the damage actually dealt (0 when rejected).
    ///
    /// `side` is the direction the target is pushed; `None` applies no knockback.
    fn take_hit(&mut self, damage: f64, knockback: f64, side: Option<Facing>) -> f64;

    /// Current health.
    fn health(&self) -> f64;

    /// True once health has reached zero.
    fn is_dead(&self) -> bool {
        self.health() <= 0.0
    }
}
