//! Camera that follows the player.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use ashfall_kernel::Rect;

/// Camera tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Viewport width in world units
    pub view_width: f64,
    /// Viewport height in world units
    pub view_height: f64,
    /// Exponential smoothing rate (1/s); higher follows tighter
    pub smoothing: f64,
    /// Vertical offset of the focus point from the player's center
    pub look_up: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view_width: 640.0,
            view_height: 360.0,
            smoothing: 6.0,
            look_up: 40.0,
        }
    }
}

/// Smoothed follow camera clamped to the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    config: CameraConfig,
    center: DVec2,
}

impl Camera {
    /// Creates a camera centered on `focus`.
    #[must_use]
    pub fn new(config: CameraConfig, focus: DVec2) -> Self {
        Self { config, center: focus }
    }

    /// Tuning.
    #[must_use]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// View center.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Visible region.
    #[must_use]
    pub fn view(&self) -> Rect {
        Rect::from_center(self.center, self.config.view_width, self.config.view_height)
    }

    /// Jumps straight to `target`, clamped to `bounds`.
    pub fn snap_to(&mut self, target: &Rect, bounds: &Rect) {
        self.center = self.clamp(self.focus(target), bounds);
    }

    /// Eases toward `target`, keeping the view inside `bounds`.
    pub fn follow(&mut self, target: &Rect, bounds: &Rect, dt: f64) {
        let goal = self.clamp(self.focus(target), bounds);
        let t = 1.0 - (-self.config.smoothing * dt).exp();
        self.center += (goal - self.center) * t;
    }

    fn focus(&self, target: &Rect) -> DVec2 {
        target.center() - DVec2::new(0.0, self.config.look_up)
    }

    fn clamp(&self, point: DVec2, bounds: &Rect) -> DVec2 {
        let half = DVec2::new(self.config.view_width, self.config.view_height) / 2.0;
        let axis = |value: f64, lo: f64, hi: f64, half: f64| {
            if hi - lo <= half * 2.0 {
                (lo + hi) / 2.0
            } else {
                value.clamp(lo + half, hi - half)
            }
        };
        DVec2::new(
            axis(point.x, bounds.left, bounds.right(), half.x),
            axis(point.y, bounds.top, bounds.bottom(), half.y),
        )
    }
}
