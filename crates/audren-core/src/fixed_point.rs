//! Q-format fixed-point conversion.
//!
//! Parameter blocks carry gains, times and pitch as signed fixed-point values.
//! Conversions truncate; they never round to nearest unless the name says so.
//!
//! | Format | Fractional bits | Used for |
//! |--------|-----------------|----------|
//! | Q14 | 14 | effect gains, times, biquad coefficients |
//! | Q15 | 15 | depop decay, voice pitch |

/// Fractional bits of the Q14 format.
pub const Q14: u32 = 14;

/// Fractional bits of the Q15 format.
pub const Q15: u32 = 15;

/// Convert a fixed-point value to float.
///
/// # Example
/// ```rust
/// use audren_core::fixed_point::{Q14, to_float};
///
/// assert_eq!(to_float(0x4000, Q14), 1.0);
/// assert_eq!(to_float(-0x2000, Q14), -0.5);
/// ```
#[inline]
pub fn to_float(value: i64, q_bits: u32) -> f32 {
    value as f32 / (1_i64 << q_bits) as f32
}

/// Drop the fractional bits of a fixed-point value (floor toward negative infinity).
#[inline]
pub fn to_int(value: i64, q_bits: u32) -> i32 {
    (value >> q_bits) as i32
}

/// Convert a float to fixed point, truncating toward zero.
#[inline]
pub fn to_fixed(value: f32, q_bits: u32) -> i32 {
    (value * (1_i64 << q_bits) as f32) as i32
}

/// Round a fixed-point value to the nearest integer, halves rounding up.
#[inline]
pub fn round_up_and_to_int(value: i64, q_bits: u32) -> i32 {
    let half = 1_i64 << (q_bits - 1);
    to_int(value + half, q_bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_float_q14_unity() {
        assert_eq!(to_float(1 << 14, Q14), 1.0);
        assert_eq!(to_float(0, Q14), 0.0);
    }

    #[test]
    fn test_to_fixed_truncates() {
        // 0.99999 * 16384 = 16383.8 -> 16383
        assert_eq!(to_fixed(0.99999, Q14), 16383);
        assert_eq!(to_fixed(-0.99999, Q14), -16383);
    }

    #[test]
    fn test_to_int_floors() {
        assert_eq!(to_int(0x6000, Q14), 1);
        assert_eq!(to_int(-0x2000, Q14), -1);
    }

    #[test]
    fn test_round_up_and_to_int() {
        assert_eq!(round_up_and_to_int(0x6000, Q14), 2);
        assert_eq!(round_up_and_to_int(0x5FFF, Q14), 1);
    }

    #[test]
    fn test_depop_decay_constants() {
        let decay_48k = to_float(0x7B29, Q15);
        let decay_32k = to_float(0x78CB, Q15);
        assert!((decay_48k - 0.962_189).abs() < 1e-5);
        assert!((decay_32k - 0.943_695).abs() < 1e-5);
    }
}
