//! Numeric bounds applied when layers are constructed.

/// Inclusive numeric range with the value used for NaN input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl Bounds {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into `[min, max]`; NaN becomes the default.
    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Wrap an angle into `[0, 360)`. Non-finite input becomes `default`.
pub fn wrap_degrees(value: f32, default: f32) -> f32 {
    if !value.is_finite() {
        return default;
    }
    let wrapped = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap an angle into `[0, 360]`, keeping whole non-zero turns as `360`.
pub fn wrap_degrees_inclusive(value: f32, default: f32) -> f32 {
    if !value.is_finite() {
        return default;
    }
    let wrapped = wrap_degrees(value, default);
    if wrapped == 0.0 && value != 0.0 {
        360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Bounds = Bounds::new(0.0, 1.0, 0.5);

    #[test]
    fn test_clamp_limits() {
        assert_eq!(UNIT.clamp(-3.0), 0.0);
        assert_eq!(UNIT.clamp(7.0), 1.0);
        assert_eq!(UNIT.clamp(0.25), 0.25);
        assert_eq!(UNIT.clamp(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_clamp_nan_uses_default() {
        assert_eq!(UNIT.clamp(f32::NAN), 0.5);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(370.0, 0.0), 10.0);
        assert_eq!(wrap_degrees(-90.0, 0.0), 270.0);
        assert_eq!(wrap_degrees(360.0, 0.0), 0.0);
        assert_eq!(wrap_degrees(f32::NAN, 12.0), 12.0);
    }

    #[test]
    fn test_wrap_degrees_inclusive_keeps_full_turn() {
        assert_eq!(wrap_degrees_inclusive(360.0, 0.0), 360.0);
        assert_eq!(wrap_degrees_inclusive(720.0, 0.0), 360.0);
        assert_eq!(wrap_degrees_inclusive(0.0, 360.0), 0.0);
        assert_eq!(wrap_degrees_inclusive(450.0, 0.0), 90.0);
        assert_eq!(wrap_degrees_inclusive(f32::NEG_INFINITY, 360.0), 360.0);
    }
}
