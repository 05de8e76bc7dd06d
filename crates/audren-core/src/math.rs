//! Rounding and level helpers used by the mixing commands.
//!
//! Mix buffers carry samples on the 16-bit PCM scale (`-32768.0..=32767.0`)
//! as floats. Every gain stage that writes back into a mix buffer rounds the
//! result to an integer value with one of two rounding rules, so that
//! repeated mixing stays on the integer lattice and matches fixed-point
//! hardware output exactly.
//!
//! | Helper | Rule | Used by |
//! |--------|------|---------|
//! | [`round_up`] / [`multiply_round_up`] | nearest, ties away from zero | volume, mix, mix ramp, downmix |
//! | [`round_down`] / [`multiply_round_down`] | truncation toward zero | depop decay |
//!
//! Replacing either with ordinary `round()` semantics changes output bits.

use libm::{fabsf, powf, roundf, truncf};

/// Round to the nearest integer, halves away from zero.
///
/// # Example
/// ```rust
/// use audren_core::math::round_up;
///
/// assert_eq!(round_up(2.5), 3.0);
/// assert_eq!(round_up(-2.5), -3.0);
/// assert_eq!(round_up(2.4), 2.0);
/// ```
#[inline]
pub fn round_up(value: f32) -> f32 {
    roundf(value)
}

/// Round toward zero (truncate).
///
/// A decaying value rounded this way strictly shrinks in magnitude until it
/// reaches zero, and never changes sign.
///
/// # Example
/// ```rust
/// use audren_core::math::round_down;
///
/// assert_eq!(round_down(2.5), 2.0);
/// assert_eq!(round_down(-2.5), -2.0);
/// assert_eq!(round_down(2.9), 2.0);
/// ```
#[inline]
pub fn round_down(value: f32) -> f32 {
    truncf(value)
}

/// `round_up(a * b)`.
#[inline]
pub fn multiply_round_up(a: f32, b: f32) -> f32 {
    round_up(a * b)
}

/// `round_down(a * b)`.
#[inline]
pub fn multiply_round_down(a: f32, b: f32) -> f32 {
    round_down(a * b)
}

/// `10^x`.
#[inline]
pub fn pow10(x: f32) -> f32 {
    powf(10.0, x)
}

/// Convert millibels (hundredths of a decibel) to linear gain.
///
/// 0 mB is unity, -2000 mB is 0.1.
#[inline]
pub fn millibels_to_linear(millibels: f32) -> f32 {
    pow10(millibels / 2000.0)
}

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    pow10(db / 20.0)
}

/// Flush denormal floats to zero.
///
/// Feedback paths in the delay and reverb states decay toward zero forever;
/// this keeps them out of the slow subnormal range.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if fabsf(x) < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_ties_away_from_zero() {
        assert_eq!(round_up(0.5), 1.0);
        assert_eq!(round_up(-0.5), -1.0);
        assert_eq!(round_up(1.49), 1.0);
        assert_eq!(round_up(-1.51), -2.0);
    }

    #[test]
    fn test_round_down_toward_zero() {
        assert_eq!(round_down(0.5), 0.0);
        assert_eq!(round_down(-0.5), 0.0);
        assert_eq!(round_down(1.99), 1.0);
        assert_eq!(round_down(-1.99), -1.0);
    }

    #[test]
    fn test_round_down_decay_reaches_zero() {
        let mut v = 20.0_f32;
        for _ in 0..40 {
            v = multiply_round_down(v, 0.96);
        }
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_multiply_round_up_unity_is_identity_on_integers() {
        for v in [-32768.0_f32, -1.0, 0.0, 1.0, 12345.0, 32767.0] {
            assert_eq!(multiply_round_up(v, 1.0), v);
        }
    }

    #[test]
    fn test_millibels() {
        assert!((millibels_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((millibels_to_linear(-2000.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
