//! Frame timing.
//!
//! The simulation only ever advances in fixed steps. [`FrameTiming`] turns
//! variable frame times into a count of fixed steps and, in realtime mode,
//! sleeps off whatever is left of the frame budget.

use std::time::{Duration, Instant};

/// Largest frame delta accepted before clamping.
const MAX_FRAME_DT: f64 = 0.25;

/// Fixed-step accumulator.
#[derive(Debug)]
pub struct FrameTiming {
    /// Seconds per fixed step
    fixed_dt: f64,
    /// Unsimulated time carried between frames
    accumulator: f64,
    /// Most steps per frame before time is dropped
    max_updates: u32,
    /// Pace against the wall clock
    realtime: bool,
    /// Start of the current frame
    last_frame: Instant,
}

impl FrameTiming {
    /// Creates a timer stepping `tick_rate` times per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            fixed_dt: 1.0 / f64::from(tick_rate.max(1)),
            accumulator: 0.0,
            max_updates: 10,
            realtime: false,
            last_frame: Instant::now(),
        }
    }

    /// Enables wall-clock pacing.
    #[must_use]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Caps steps per frame.
    #[must_use]
    pub fn with_max_updates(mut self, max_updates: u32) -> Self {
        self.max_updates = max_updates.max(1);
        self
    }

    /// Seconds per fixed step.
    #[must_use]
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Time to feed the accumulator this frame: the measured wall-clock delta
    /// in realtime mode, exactly one step otherwise.
    pub fn frame_dt(&mut self) -> f64 {
        if !self.realtime {
            return self.fixed_dt;
        }
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f64();
        self.last_frame = now;
        dt.min(MAX_FRAME_DT)
    }

    /// Adds `dt` and returns how many fixed steps to run.
    pub fn accumulate(&mut self, dt: f64) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;
        while self.accumulator >= self.fixed_dt && count < self.max_updates {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog rather than spiral
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Sleeps for the remainder of one step (realtime mode only).
    pub fn sleep_remainder(&self) {
        if !self.realtime {
            return;
        }
        let budget = Duration::from_secs_f64(self.fixed_dt);
        let elapsed = self.last_frame.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }

    /// Forgets accumulated time (after loading).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.accumulator = 0.0;
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}
