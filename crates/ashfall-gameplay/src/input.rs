//! Per-tick player intents and held keys.
//!
//! Device polling happens outside the core. Each tick the input layer hands in
//! a [`FrameInput`]: the set of intents for this tick (each applied at most
//! once, in a fixed order) plus the keys currently held down.

use serde::{Deserialize, Serialize};

/// A command the player can issue during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerControl {
    /// Accelerate left
    Left,
    /// Accelerate right
    Right,
    /// Jump, wall-jump or drop through a platform
    Jump,
    /// Start a roll
    Roll,
    /// Slam downward
    Slam,
    /// Pick up or use what the player is standing on
    Interact,
    /// Begin a weapon swing
    AttackStart,
    /// Release the weapon
    AttackStop,
}

impl PlayerControl {
    /// All controls in handling order.
    pub const ALL: [PlayerControl; 8] = [
        Self::Left,
        Self::Right,
        Self::Jump,
        Self::Roll,
        Self::Slam,
        Self::Interact,
        Self::AttackStart,
        Self::AttackStop,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Deduplicated set of controls for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSet {
    bits: u16,
}

impl ControlSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Adds a control. Adding it twice has no further effect.
    pub fn insert(&mut self, control: PlayerControl) {
        self.bits |= control.bit();
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, control: PlayerControl) -> Self {
        self.insert(control);
        self
    }

    /// Removes a control.
    pub fn remove(&mut self, control: PlayerControl) {
        self.bits &= !control.bit();
    }

    /// Returns true if the control is present.
    #[must_use]
    pub const fn contains(&self, control: PlayerControl) -> bool {
        self.bits & control.bit() != 0
    }

    /// Returns true if no control is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates the present controls in handling order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerControl> + '_ {
        PlayerControl::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<PlayerControl> for ControlSet {
    fn from_iter<I: IntoIterator<Item = PlayerControl>>(iter: I) -> Self {
        let mut set = Self::new();
        for control in iter {
            set.insert(control);
        }
        set
    }
}

/// Keys currently held, used for directional checks during collision response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    /// Left held
    pub left: bool,
    /// Right held
    pub right: bool,
    /// Up held
    pub up: bool,
    /// Down held
    pub down: bool,
    /// Sprint held
    pub sprint: bool,
}

impl HeldKeys {
    /// Horizontal direction held: -1, 0 or 1. Holding both cancels out.
    #[must_use]
    pub fn horizontal(&self) -> i8 {
        i8::from(self.right) - i8::from(self.left)
    }
}

/// Everything the player tick needs from the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Intents for this tick
    pub controls: ControlSet,
    /// Keys held this tick
    pub held: HeldKeys,
}

impl FrameInput {
    /// Builds input from held keys plus edge-triggered controls.
    ///
    /// `Left`/`Right` intents are derived from the held keys.
    #[must_use]
    pub fn from_held(held: HeldKeys, pressed: impl IntoIterator<Item = PlayerControl>) -> Self {
        let mut controls: ControlSet = pressed.into_iter().collect();
        if held.left {
            controls.insert(PlayerControl::Left);
        }
        if held.right {
            controls.insert(PlayerControl::Right);
        }
        Self { controls, held }
    }

    /// No controls and no keys held.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}
