//! Property-based tests for audren-core primitives.
//!
//! Bit identity between the scalar and lane-blocked kernels, rounding helper
//! invariants, saturation bounds and biquad initialization.

use audren_core::{
    BiquadFilterParameter, BiquadFilterState, kernels, multiply_round_down, multiply_round_up, process_biquad_filter,
    round_down, round_up, saturate,
};
use proptest::prelude::*;

fn pcm_block(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-40_000.0f32..40_000.0f32, len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The lane-blocked volume kernel is bit-identical to the scalar one for
    /// any block length and volume.
    #[test]
    fn volume_paths_bit_identical(
        input in (0usize..300).prop_flat_map(pcm_block),
        volume in -2.0f32..2.0f32,
    ) {
        let mut scalar = vec![0.0; input.len()];
        let mut lanes = vec![0.0; input.len()];
        kernels::scalar::apply_volume(&mut scalar, &input, volume);
        kernels::lanes::apply_volume(&mut lanes, &input, volume);
        for (a, b) in scalar.iter().zip(&lanes) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    /// Same for the accumulating mix kernel.
    #[test]
    fn mix_paths_bit_identical(
        input in pcm_block(240),
        existing in pcm_block(240),
        volume in -2.0f32..2.0f32,
    ) {
        let mut scalar = existing.clone();
        let mut lanes = existing;
        kernels::scalar::mix(&mut scalar, &input, volume);
        kernels::lanes::mix(&mut lanes, &input, volume);
        for (a, b) in scalar.iter().zip(&lanes) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    /// Volume 1.0 is exact on integer-valued samples.
    #[test]
    fn unity_volume_is_identity_on_pcm(samples in prop::collection::vec(any::<i16>(), 240)) {
        let input: Vec<f32> = samples.iter().map(|&s| f32::from(s)).collect();
        let mut output = vec![0.0; input.len()];
        kernels::apply_volume(&mut output, &input, 1.0);
        prop_assert_eq!(output, input);
    }

    /// Round-up lands on the nearest integer, round-down never grows the magnitude.
    #[test]
    fn rounding_lands_on_integers(x in -1.0e6f32..1.0e6f32) {
        let up = round_up(x);
        let down = round_down(x);
        prop_assert_eq!(up.fract(), 0.0);
        prop_assert_eq!(down.fract(), 0.0);
        prop_assert!((up - x).abs() <= 0.5);
        prop_assert!(down.abs() <= x.abs());
        prop_assert!((down - x).abs() < 1.0);
    }

    /// A positive decay factor below one never flips the sign and never grows
    /// the magnitude under round-down.
    #[test]
    fn round_down_decay_is_sign_preserving(v in -32_768.0f32..32_768.0f32, d in 0.0f32..1.0f32) {
        let v = v.trunc();
        let next = multiply_round_down(d, v);
        prop_assert!(next == 0.0 || next.signum() == v.signum());
        prop_assert!(next.abs() <= v.abs());
        prop_assert_eq!(multiply_round_up(v, 1.0), v);
    }

    /// Saturation never leaves the 16-bit range and is monotonic.
    #[test]
    fn saturate_is_bounded_and_monotonic(a in -1.0e6f32..1.0e6f32, b in -1.0e6f32..1.0e6f32) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(saturate(lo) <= saturate(hi));
    }

    /// A biquad whose history was reset matches a fresh filter regardless of
    /// what was in the slot before.
    #[test]
    fn cleared_biquad_matches_fresh(
        garbage in prop::array::uniform4(-1.0e4f32..1.0e4f32),
        input in pcm_block(64),
    ) {
        let parameter = BiquadFilterParameter::from_coefficients([0.25, 0.5, 0.25], [-0.3, 0.1]);

        let mut dirty = BiquadFilterState { x1: garbage[0], x2: garbage[1], y1: garbage[2], y2: garbage[3] };
        dirty.clear();
        let mut fresh = BiquadFilterState::default();

        let mut a = vec![0.0; input.len()];
        let mut b = vec![0.0; input.len()];
        process_biquad_filter(&parameter, &mut dirty, &mut a, &input);
        process_biquad_filter(&parameter, &mut fresh, &mut b, &input);
        prop_assert_eq!(a, b);
    }
}
