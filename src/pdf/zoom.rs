//! Zoom state for continuous PDF rendering
//!
//! Holds the zoom factor applied to every page render. Step changes land on
//! whole percent so the toolbar value and the render scale never drift.

/// Zoom state for PDF viewing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl Zoom {
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.5;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 3.0;
    /// Additive step for zoom in/out
    pub const STEP: f32 = 0.2;

    /// Returns the current zoom factor
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom as whole percent, as shown in the toolbar
    #[must_use]
    pub fn percent(&self) -> u32 {
        (self.factor * 100.0).round() as u32
    }

    /// Apply a requested factor, clamped to the allowed range. Returns the
    /// factor actually applied.
    pub fn set(&mut self, requested: f32) -> f32 {
        self.factor = Self::clamp_factor(requested);
        self.factor
    }

    /// Apply a percent value typed by the user
    pub fn set_percent(&mut self, percent: i64) -> f32 {
        let percent = percent.clamp(
            i64::from(Self::min_percent()),
            i64::from(Self::max_percent()),
        );
        self.set(percent as f32 / 100.0)
    }

    /// Zoom in by one step, holding at the upper bound
    pub fn step_in(&mut self) -> f32 {
        self.set(Self::snap(self.factor + Self::STEP))
    }

    /// Zoom out by one step, holding at the lower bound
    pub fn step_out(&mut self) -> f32 {
        self.set(Self::snap(self.factor - Self::STEP))
    }

    /// Back to 100%
    pub fn reset(&mut self) -> f32 {
        self.set(1.0)
    }

    #[must_use]
    pub fn min_percent() -> u32 {
        (Self::MIN_SCALE * 100.0).round() as u32
    }

    #[must_use]
    pub fn max_percent() -> u32 {
        (Self::MAX_SCALE * 100.0).round() as u32
    }

    /// Clamp factor to valid range, handling NaN/Inf
    #[must_use]
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            return 1.0;
        }
        factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
    }

    /// Round to whole percent so repeated steps land on exact values
    fn snap(factor: f32) -> f32 {
        (factor * 100.0).round() / 100.0
    }
}
