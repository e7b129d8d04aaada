//! Conversion from the user-facing speed control to the engine's rate scale.
//!
//! Speed is "how fast": 2.0 speaks twice as fast. The engine instead takes a
//! duration multiplier (Piper's `length_scale`), so `rate = 1 / speed`.
//! Out-of-range speeds are rejected, never clamped.

use std::ops::RangeInclusive;

/// Accepted user-facing speed values.
pub const SPEED_RANGE: RangeInclusive<f32> = 0.5..=2.0;

pub const NORMAL_SPEED: f32 = 1.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RateError {
    #[error("speed must be between 0.5 and 2.0, got {0}")]
    OutOfRange(f32),
}

/// Engine-native duration multiplier. Larger is slower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateScale(f32);

impl RateScale {
    pub const NORMAL: RateScale = RateScale(1.0);

    /// Translate a user-facing speed into a rate scale.
    pub fn from_speed(speed: f32) -> Result<Self, RateError> {
        if !speed.is_finite() || !SPEED_RANGE.contains(&speed) {
            return Err(RateError::OutOfRange(speed));
        }
        Ok(RateScale(1.0 / speed))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for RateScale {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn normal_speed_is_identity() {
        assert_eq!(RateScale::from_speed(1.0).unwrap().value(), 1.0);
    }

    #[test]
    fn range_endpoints_invert() {
        assert!(approx(RateScale::from_speed(2.0).unwrap().value(), 0.5));
        assert!(approx(RateScale::from_speed(0.5).unwrap().value(), 2.0));
    }

    #[test]
    fn rate_decreases_as_speed_increases() {
        let mut prev = f32::INFINITY;
        let mut speed = 0.5f32;
        while speed <= 2.0 {
            let rate = RateScale::from_speed(speed).unwrap().value();
            assert!(rate < prev, "rate({speed}) = {rate} not below {prev}");
            prev = rate;
            speed += 0.05;
        }
    }

    #[test]
    fn rejects_invalid_speeds() {
        for bad in [0.0, -1.0, 0.49, 2.01, f32::NAN, f32::INFINITY] {
            assert!(RateScale::from_speed(bad).is_err(), "{bad} accepted");
        }
    }
}
