//! Value transforms applied on the owning thread before a callback runs.

use crate::error::TransformError;

/// Maps a drained value to the value handed to the subscriber callback.
pub trait Transform<T>: Send + Sync {
    fn apply(&self, value: T) -> T;
}

/// Linear remap from `[in_min, in_max]` to `[out_min, out_max]`, clamped to
/// the output range. Either range may be reversed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Remap {
    in_min: f32,
    in_max: f32,
    out_min: f32,
    out_max: f32,
}

impl Remap {
    /// Unit input onto the signed unit range.
    pub const UNIT_TO_SIGNED: Remap = Remap {
        in_min: 0.0,
        in_max: 1.0,
        out_min: -1.0,
        out_max: 1.0,
    };

    /// Pass-through over the unit range.
    pub const IDENTITY: Remap = Remap {
        in_min: 0.0,
        in_max: 1.0,
        out_min: 0.0,
        out_max: 1.0,
    };

    /// Validates the bounds. A zero-width input range has no defined mapping
    /// and is rejected.
    pub fn new(
        in_min: f32,
        in_max: f32,
        out_min: f32,
        out_max: f32,
    ) -> Result<Self, TransformError> {
        for (name, value) in [
            ("in_min", in_min),
            ("in_max", in_max),
            ("out_min", out_min),
            ("out_max", out_max),
        ] {
            if !value.is_finite() {
                return Err(TransformError::NonFinite { name, value });
            }
        }
        if in_min == in_max {
            return Err(TransformError::DegenerateInputRange(in_min));
        }
        Ok(Self {
            in_min,
            in_max,
            out_min,
            out_max,
        })
    }

    /// Linear mapping without clamping.
    pub fn map(&self, value: f32) -> f32 {
        (value - self.in_min) / (self.in_max - self.in_min) * (self.out_max - self.out_min)
            + self.out_min
    }

    /// Linear mapping clamped to the output range.
    pub fn apply(&self, value: f32) -> f32 {
        let lo = self.out_min.min(self.out_max);
        let hi = self.out_min.max(self.out_max);
        self.map(value).clamp(lo, hi)
    }
}

impl Default for Remap {
    fn default() -> Self {
        Self::UNIT_TO_SIGNED
    }
}

impl Transform<f32> for Remap {
    fn apply(&self, value: f32) -> f32 {
        Remap::apply(self, value)
    }
}

/// Integer multiplier, saturating at the `i32` bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    pub multiplier: i32,
}

impl Scale {
    pub const fn new(multiplier: i32) -> Self {
        Self { multiplier }
    }

    pub fn apply(&self, value: i32) -> i32 {
        value.saturating_mul(self.multiplier)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Transform<i32> for Scale {
    fn apply(&self, value: i32) -> i32 {
        Scale::apply(self, value)
    }
}
