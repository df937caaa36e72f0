//! Zoom state for the page surface
//!
//! The scale moves in fixed steps inside a closed range and can be reset to
//! the default at any time.

/// Zoom state for document viewing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    factor: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: Self::DEFAULT_SCALE,
        }
    }
}

impl Zoom {
    /// Scale used when a document is opened and after a reset
    pub const DEFAULT_SCALE: f64 = 1.20;
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f64 = 0.5;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f64 = 3.0;
    /// Increment per zoom action
    pub const STEP: f64 = 0.25;

    pub fn with_factor(factor: f64) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
        }
    }

    /// Returns the current zoom factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Zoom in by one step. Returns false when already at the maximum.
    pub fn step_in(&mut self) -> bool {
        self.set(self.factor + Self::STEP)
    }

    /// Zoom out by one step. Returns false when already at the minimum.
    pub fn step_out(&mut self) -> bool {
        self.set(self.factor - Self::STEP)
    }

    /// Restore the default scale. Returns false when nothing changed.
    pub fn reset(&mut self) -> bool {
        self.set(Self::DEFAULT_SCALE)
    }

    /// Whether the reset control should be offered
    pub fn is_default(&self) -> bool {
        (self.factor - Self::DEFAULT_SCALE).abs() < 1e-9
    }

    /// Percentage for display, e.g. `120`
    pub fn percent(&self) -> u32 {
        (self.factor * 100.0).round() as u32
    }

    fn set(&mut self, factor: f64) -> bool {
        let clamped = Self::clamp_factor(factor);
        if (clamped - self.factor).abs() < 1e-9 {
            return false;
        }
        self.factor = clamped;
        true
    }

    /// Clamp factor to valid range, handling NaN/Inf
    pub fn clamp_factor(factor: f64) -> f64 {
        if !factor.is_finite() {
            Self::DEFAULT_SCALE
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}
