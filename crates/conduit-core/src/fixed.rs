use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Velocities, friction, progress along a segment and segment lengths all use
/// this type so that ticks are bit-identical across platforms.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for geometry evaluation and display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Length of one tick in seconds for the given tick rate.
///
/// A rate of zero is clamped to one tick per second.
#[inline]
pub fn tick_seconds(tick_rate: u32) -> Fixed64 {
    Fixed64::from_num(1) / Fixed64::from_num(tick_rate.max(1))
}

/// Return `magnitude` carrying the sign of `sign_of`. Zero counts as positive.
#[inline]
pub fn with_sign(magnitude: Fixed64, sign_of: Fixed64) -> Fixed64 {
    if sign_of < Fixed64::ZERO {
        -magnitude.abs()
    } else {
        magnitude.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn tick_seconds_sixty() {
        let dt = tick_seconds(60);
        let total = dt * Fixed64::from_num(60);
        assert!((fixed64_to_f64(total) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tick_seconds_zero_rate_clamped() {
        assert_eq!(tick_seconds(0), Fixed64::from_num(1));
    }

    #[test]
    fn with_sign_preserves_direction() {
        let half = f64_to_fixed64(0.5);
        assert_eq!(with_sign(half, f64_to_fixed64(-3.0)), -half);
        assert_eq!(with_sign(-half, f64_to_fixed64(2.0)), half);
        assert_eq!(with_sign(half, Fixed64::ZERO), half);
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }
}
