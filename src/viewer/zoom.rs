//! Zoom state for the page view
//!
//! Holds the scale factor and the clamping rules for stepping and
//! fit-to-width.

/// Zoom state for page rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    /// Current scale factor (1.0 = 100%)
    pub factor: f32,

    /// Factor restored when arithmetic produces a non-finite value
    default_factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SCALE)
    }
}

impl Zoom {
    /// Scale used before the user zooms
    pub const DEFAULT_SCALE: f32 = 1.2;
    /// Multiplier (zoom in) and divisor (zoom out) per step
    pub const STEP: f32 = 1.15;
    /// Maximum scale reachable by stepping
    pub const MAX_SCALE: f32 = 5.0;
    /// Minimum scale reachable by stepping
    pub const MIN_SCALE: f32 = 0.4;
    /// Fit-to-width result bounds
    pub const FIT_MIN_SCALE: f32 = 0.6;
    pub const FIT_MAX_SCALE: f32 = 3.0;
    /// Padding subtracted from the container width before fitting
    pub const FIT_PADDING: f32 = 24.0;

    /// Zoom starting at `factor`, clamped to the stepping bounds
    #[must_use]
    pub fn new(factor: f32) -> Self {
        let default_factor = if factor.is_finite() && factor > 0.0 {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            Self::DEFAULT_SCALE
        };
        Self {
            factor: default_factor,
            default_factor,
        }
    }

    /// Returns the current scale factor
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step
    pub fn step_in(&mut self) {
        self.factor = self.sanitize(self.factor * Self::STEP).min(Self::MAX_SCALE);
    }

    /// Zoom out by one step
    pub fn step_out(&mut self) {
        self.factor = self.sanitize(self.factor / Self::STEP).max(Self::MIN_SCALE);
    }

    fn sanitize(&self, factor: f32) -> f32 {
        if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            self.default_factor
        }
    }
}

/// Scale making a page of `natural_width` fill `container_width` minus padding,
/// clamped to the fit bounds
#[must_use]
pub fn fit_width_scale(container_width: f32, natural_width: f32, padding: f32) -> Option<f32> {
    if !natural_width.is_finite() || natural_width <= 0.0 || !container_width.is_finite() {
        return None;
    }
    let scale = (container_width - padding) / natural_width;
    Some(scale.clamp(Zoom::FIT_MIN_SCALE, Zoom::FIT_MAX_SCALE))
}

/// `round(scale * 100)`
#[must_use]
pub fn percent(scale: f32) -> u32 {
    (scale * 100.0).round().max(0.0) as u32
}
