//! Fire-and-forget hooks from the simulation to presentation.
//!
//! The core publishes [`GameEvent`]s and never waits on them. Audio, particles
//! and screen shake live on the other side of the bus and drain it once per
//! frame. A full bus drops new events rather than stalling the tick.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use ashfall_common::EntityId;

use crate::entity::Actor;

/// Events published by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An actor touched down after being airborne
    Landed {
        /// Who landed
        actor: Actor,
        /// True if the player ended a slam
        from_slam: bool,
    },
    /// The player jumped
    Jumped {
        /// True for a wall-jump
        wall_jump: bool,
    },
    /// The player started a roll
    Rolled,
    /// The player started a slam
    Slammed,
    /// The player grabbed a ledge
    LedgeClimbStarted,
    /// An attack swing began
    AttackStarted {
        /// Who is swinging
        actor: Actor,
    },
    /// An attack swing ended or was released
    AttackStopped {
        /// Who stopped
        actor: Actor,
    },
    /// Damage was dealt
    Hit {
        /// Who was hit
        target: Actor,
        /// Damage after clamping
        damage: f64,
        /// World x of the hit
        x: f64,
        /// World y of the hit
        y: f64,
    },
    /// An actor ran out of health
    Died {
        /// Who died
        actor: Actor,
    },
    /// An enemy became fully alerted
    Alerted {
        /// Enemy ID
        enemy: EntityId,
    },
    /// The player picked something up
    PickupCollected {
        /// Pickup ID
        pickup: EntityId,
        /// Health restored
        heal: f64,
    },
    /// A map finished loading
    MapLoaded {
        /// Wall count
        walls: usize,
        /// Enemy count
        enemies: usize,
    },
}

/// Bus capacity used when none is configured.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Event bus for broadcasting hook events.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: GameEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }

    /// Drains pending events into `handler`.
    pub fn dispatch(&self, handler: &dyn EventHandler) -> usize {
        let mut count = 0;
        for event in self.receiver.try_iter() {
            handler.handle(&event);
            count += 1;
        }
        count
    }
}

/// Consumer of hook events.
pub trait EventHandler: Send + Sync {
    /// Handles an event.
    fn handle(&self, event: &GameEvent);
}
