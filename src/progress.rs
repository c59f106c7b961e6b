//! The progress signal that drives every animation in the portal.
//!
//! Hosts report progress as a percentage in `[0, 100]` at whatever cadence
//! they like. Nothing here ever fails: out-of-range, infinite and NaN inputs
//! are sanitized into the valid range so a misbehaving caller can never take
//! the visualization down.
//!
//! ```ignore
//! use portalfx::ProgressSignal;
//!
//! let p = ProgressSignal::from_percent(50.0);
//! assert_eq!(p.value(), 0.5);
//! assert_eq!(p.eased(), 0.25);
//!
//! // Garbage in, clamped value out
//! assert_eq!(ProgressSignal::from_percent(f32::NAN).value(), 0.0);
//! assert_eq!(ProgressSignal::from_percent(250.0).value(), 1.0);
//! ```

use serde::{Deserialize, Serialize};

/// Percent at which the terminal (completion) state activates.
pub const TERMINAL_PERCENT: f32 = 99.0;

/// Percent at which the status reads "complete".
pub const COMPLETE_PERCENT: f32 = 95.0;

/// Normalized progress in `[0, 1]`.
///
/// Always constructed through one of the sanitizing constructors, so every
/// value observed by a component is finite and inside the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct ProgressSignal(f32);

impl ProgressSignal {
    /// No progress.
    pub const ZERO: Self = Self(0.0);

    /// Full progress.
    pub const FULL: Self = Self(1.0);

    /// Build from a host percentage (`0..=100`).
    ///
    /// NaN and negative infinity map to 0, positive infinity maps to 100.
    pub fn from_percent(percent: f32) -> Self {
        Self::from_unit(percent / 100.0)
    }

    /// Build from an already-normalized value (`0..=1`).
    pub fn from_unit(value: f32) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Normalized value in `[0, 1]`.
    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Value as a percentage in `[0, 100]`.
    #[inline]
    pub fn percent(self) -> f32 {
        self.0 * 100.0
    }

    /// Quadratic ease used by the suction effect.
    #[inline]
    pub fn eased(self) -> f32 {
        self.0 * self.0
    }

    /// Whether the terminal (whiteout) threshold has been reached.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self.percent() >= TERMINAL_PERCENT
    }

    /// Whether the "complete" status band has been reached.
    #[inline]
    pub fn is_complete(self) -> bool {
        self.percent() >= COMPLETE_PERCENT
    }

    /// Whether any progress at all has been reported.
    #[inline]
    pub fn is_started(self) -> bool {
        self.0 > 0.0
    }
}

impl From<f32> for ProgressSignal {
    /// Interprets the value as a percentage.
    fn from(percent: f32) -> Self {
        Self::from_percent(percent)
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
