//! Health pickups.
//!
//! Orbs fall under gravity through the same resolver as everything else and
//! come to rest on walls and platforms. The player collects them with Interact.

use serde::{Deserialize, Serialize};

use ashfall_common::EntityId;
use ashfall_kernel::{move_box, CollisionQuery, Direction, Rect};

use crate::entity::{Body, EntityRef};

/// Health restored when none is specified.
pub const DEFAULT_HEAL: f64 = 25.0;

/// Side length of a pickup box.
pub const PICKUP_SIZE: f64 = 12.0;

/// Downward acceleration.
pub const PICKUP_GRAVITY: f64 = 1200.0;

/// Terminal fall speed.
pub const PICKUP_FALL_CAP: f64 = 700.0;

/// Upward speed of a pickup dropped by an enemy.
pub const DROP_POP_SPEED: f64 = 260.0;

/// Render state of a pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupState {
    /// In the air
    Falling,
    /// On the ground
    Resting,
}

/// A health orb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    id: EntityId,
    rect: Rect,
    vy: f64,
    heal: f64,
    resting: bool,
}

impl Pickup {
    /// Places an orb with its top-left at `(x, y)`.
    #[must_use]
    pub fn new(id: EntityId, x: f64, y: f64, heal: f64) -> Self {
        Self {
            id,
            rect: Rect::new(x, y, PICKUP_SIZE, PICKUP_SIZE),
            vy: 0.0,
            heal,
            resting: false,
        }
    }

    /// An orb popping out of a defeated enemy at `(cx, cy)`.
    #[must_use]
    pub fn dropped(id: EntityId, cx: f64, cy: f64, heal: f64) -> Self {
        let mut pickup = Self::new(id, cx - PICKUP_SIZE / 2.0, cy - PICKUP_SIZE / 2.0, heal);
        pickup.vy = -DROP_POP_SPEED;
        pickup
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Grid reference.
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Pickup(self.id)
    }

    /// Health restored.
    #[must_use]
    pub fn heal(&self) -> f64 {
        self.heal
    }

    /// Falls through the resolver. Returns true if the box moved.
    pub fn integrate<Q>(&mut self, query: &mut Q, dt: f64) -> bool
    where
        Q: CollisionQuery<EntityRef> + ?Sized,
    {
        self.vy = (self.vy + PICKUP_GRAVITY * dt).min(PICKUP_FALL_CAP);
        let before = self.rect;
        let mover = self.entity_ref();
        self.resting = false;
        for collision in move_box(&mut self.rect, mover, 0.0, self.vy * dt, query) {
            match collision.direction {
                Direction::Down => {
                    self.vy = 0.0;
                    self.resting = true;
                },
                Direction::Up => self.vy = 0.0,
                Direction::Left | Direction::Right => {},
            }
        }
        self.rect != before
    }
}

impl Body for Pickup {
    type State = PickupState;

    fn rect(&self) -> Rect {
        self.rect
    }

    fn state(&self) -> PickupState {
        if self.resting {
            PickupState::Resting
        } else {
            PickupState::Falling
        }
    }
}
