//! 16-bit PCM conversion.
//!
//! Mix buffers hold floats on the 16-bit PCM scale, so converting to PCM is a
//! clamp followed by truncation, and float sources are scaled by
//! [`i16::MAX`] on the way in.

/// Clamp to the `i16` range and truncate toward zero.
///
/// # Example
/// ```rust
/// use audren_core::pcm::saturate;
///
/// assert_eq!(saturate(40000.0), i16::MAX);
/// assert_eq!(saturate(-40000.0), i16::MIN);
/// assert_eq!(saturate(-1.9), -1);
/// ```
#[inline]
pub fn saturate(value: f32) -> i16 {
    value.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Convert a normalized float sample (`-1.0..=1.0`) to saturated PCM.
#[inline]
pub fn float_to_pcm(value: f32) -> i16 {
    saturate(value * f32::from(i16::MAX))
}

/// Write saturated PCM for a whole slice.
pub fn saturate_slice(output: &mut [i16], input: &[f32]) {
    for (out, &sample) in output.iter_mut().zip(input) {
        *out = saturate(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate_truncates() {
        assert_eq!(saturate(100.7), 100);
        assert_eq!(saturate(-100.7), -100);
    }

    #[test]
    fn test_saturate_clamps() {
        assert_eq!(saturate(f32::MAX), i16::MAX);
        assert_eq!(saturate(f32::MIN), i16::MIN);
    }

    #[test]
    fn test_float_to_pcm_full_scale() {
        assert_eq!(float_to_pcm(1.0), i16::MAX);
        assert_eq!(float_to_pcm(-1.0), -i16::MAX);
        assert_eq!(float_to_pcm(2.0), i16::MAX);
    }

    #[test]
    fn test_saturate_slice() {
        let mut out = [0_i16; 3];
        saturate_slice(&mut out, &[1.5, 70000.0, -2.2]);
        assert_eq!(out, [1, i16::MAX, -2]);
    }
}
