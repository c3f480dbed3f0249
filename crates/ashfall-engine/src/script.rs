//! Scripted input.
//!
//! The runner has no input devices. An [`InputScript`] stands in for them: a
//! JSON list of one-shot intents at given times and held-key spans, sampled
//! once per fixed step.
//!
//! ```json
//! {
//!   "name": "walk and jump",
//!   "steps": [
//!     { "type": "hold", "key": "right", "from": 0.5, "until": 2.0 },
//!     { "type": "press", "control": "Jump", "at": 1.0 },
//!     { "type": "log", "message": "landing", "at": 1.8 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use ashfall_common::{AshfallError, AshfallResult};
use ashfall_gameplay::{FrameInput, HeldKeys, PlayerControl};

/// A key that can be held across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeldKey {
    /// Left
    Left,
    /// Right
    Right,
    /// Up
    Up,
    /// Down
    Down,
    /// Sprint modifier
    Sprint,
}

impl HeldKey {
    fn apply(self, held: &mut HeldKeys) {
        match self {
            Self::Left => held.left = true,
            Self::Right => held.right = true,
            Self::Up => held.up = true,
            Self::Down => held.down = true,
            Self::Sprint => held.sprint = true,
        }
    }
}

/// One entry in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Issue a control once, on the step containing `at`
    Press {
        /// Control to issue
        control: PlayerControl,
        /// Time in seconds
        at: f64,
    },

    /// Hold a key from `from` (inclusive) to `until` (exclusive)
    Hold {
        /// Key to hold
        key: HeldKey,
        /// Start time in seconds
        from: f64,
        /// End time in seconds
        until: f64,
    },

    /// Log a message
    Log {
        /// Message to log
        message: String,
        /// Time in seconds
        at: f64,
    },
}

impl ScriptStep {
    fn end(&self) -> f64 {
        match self {
            Self::Press { at, .. } | Self::Log { at, .. } => *at,
            Self::Hold { until, .. } => *until,
        }
    }
}

/// Timed input for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    /// Script name
    #[serde(default)]
    pub name: String,
    /// Steps in any order
    pub steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Parses a script from JSON.
    pub fn from_json(json: &str) -> AshfallResult<Self> {
        serde_json::from_str(json).map_err(|e| AshfallError::Serialization(e.to_string()))
    }

    /// Loads a script file.
    pub fn load(path: &Path) -> AshfallResult<Self> {
        let script = Self::from_json(&fs::read_to_string(path)?)?;
        info!(
            "Loaded input script '{}' ({} steps, {:.1}s)",
            script.name,
            script.steps.len(),
            script.duration()
        );
        Ok(script)
    }

    /// Time of the last scripted event.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.steps.iter().map(ScriptStep::end).fold(0.0, f64::max)
    }

    /// Input for the step covering `[t, t + dt)`.
    #[must_use]
    pub fn frame(&self, t: f64, dt: f64) -> FrameInput {
        let mut held = HeldKeys::default();
        let mut pressed = Vec::new();
        for step in &self.steps {
            match step {
                ScriptStep::Press { control, at } if in_step(*at, t, dt) => pressed.push(*control),
                ScriptStep::Hold { key, from, until } if *from <= t && t < *until => key.apply(&mut held),
                _ => {},
            }
        }
        FrameInput::from_held(held, pressed)
    }

    /// Log messages due in the step covering `[t, t + dt)`.
    pub fn messages(&self, t: f64, dt: f64) -> impl Iterator<Item = &str> + '_ {
        self.steps.iter().filter_map(move |step| match step {
            ScriptStep::Log { message, at } if in_step(*at, t, dt) => Some(message.as_str()),
            _ => None,
        })
    }
}

fn in_step(at: f64, t: f64, dt: f64) -> bool {
    t <= at && at < t + dt
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.1;

    fn script() -> InputScript {
        InputScript::from_json(
            r#"{
                "name": "test",
                "steps": [
                    { "type": "hold", "key": "right", "from": 0.0, "until": 1.0 },
                    { "type": "hold", "key": "sprint", "from": 0.5, "until": 1.0 },
                    { "type": "press", "control": "Jump", "at": 0.25 },
                    { "type": "log", "message": "halfway", "at": 0.5 }
                ]
            }"#,
        )
        .expect("valid script")
    }

    #[test]
    fn test_press_fires_once() {
        let s = script();
        let jumps = (0..20)
            .map(|i| s.frame(f64::from(i) * DT, DT))
            .filter(|f| f.controls.contains(PlayerControl::Jump))
            .count();
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_hold_spans() {
        let s = script();
        let early = s.frame(0.0, DT);
        assert!(early.held.right);
        assert!(!early.held.sprint);
        assert!(early.controls.contains(PlayerControl::Right));

        assert!(s.frame(0.6, DT).held.sprint);
        assert_eq!(s.frame(1.0, DT), FrameInput::idle());
    }

    #[test]
    fn test_messages_and_duration() {
        let s = script();
        assert_eq!(s.messages(0.5, DT).collect::<Vec<_>>(), vec!["halfway"]);
        assert_eq!(s.messages(0.6, DT).count(), 0);
        assert_eq!(s.duration(), 1.0);
    }

    #[test]
    fn test_rejects_unknown_step() {
        assert!(InputScript::from_json(r#"{ "steps": [ { "type": "teleport" } ] }"#).is_err());
    }
}
