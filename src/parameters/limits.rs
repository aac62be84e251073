//! Parameter limit handling
//!
//! Every parameter carries two nested ranges: the soft limits (`min`/`max`),
//! which the user may adjust, and the hard limits (`hard_min`/`hard_max`),
//! which are fixed at construction and which the soft limits must stay
//! within. Violating a limit is an error, not a clamp.

use serde::{Deserialize, Serialize};

use crate::error::LimitKind;

/// The most positive magnitude a parameter may take by default.
///
/// This is the largest finite 32-bit float widened to `f64`, kept at 32-bit
/// range even though storage is wider, for compatibility with legacy model
/// libraries that compute in single precision.
pub const HUGEVAL: f64 = f32::MAX as f64;

/// The smallest positive normal magnitude, used as a display sentinel.
pub const TINYVAL: f64 = f32::MIN_POSITIVE as f64;

/// The soft and hard limit pairs of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Soft minimum; adjustable, must lie within the hard limits.
    pub min: f64,

    /// Soft maximum; adjustable, must lie within the hard limits.
    pub max: f64,

    /// Hard minimum; fixed at construction.
    pub hard_min: f64,

    /// Hard maximum; fixed at construction.
    pub hard_max: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min: -HUGEVAL,
            max: HUGEVAL,
            hard_min: -HUGEVAL,
            hard_max: HUGEVAL,
        }
    }
}

impl Limits {
    /// Soft limits with the default hard range.
    pub fn with_soft(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    /// Check a value against the soft range, reporting the violated bound.
    pub fn check_soft(&self, value: f64) -> Option<(LimitKind, f64)> {
        if value < self.min {
            Some((LimitKind::Minimum, self.min))
        } else if value > self.max {
            Some((LimitKind::Maximum, self.max))
        } else {
            None
        }
    }

    /// Check a value against the hard range, reporting the violated bound.
    pub fn check_hard(&self, value: f64) -> Option<(LimitKind, f64)> {
        if value < self.hard_min {
            Some((LimitKind::HardMinimum, self.hard_min))
        } else if value > self.hard_max {
            Some((LimitKind::HardMaximum, self.hard_max))
        } else {
            None
        }
    }

    /// Is the value within the soft range?
    pub fn contains(&self, value: f64) -> bool {
        self.check_soft(value).is_none()
    }
}

/// The result of a successful soft-limit assignment.
///
/// Narrowing a limit past the current value does not fail; the value is
/// moved to the new bound and the adjustment is reported here so the caller
/// can decide whether to log it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetLimitOutcome {
    /// The limit was stored without touching the value.
    Unchanged,

    /// The value was moved to the new bound before the limit was stored.
    ClampedValue(f64),
}
