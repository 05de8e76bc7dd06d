//! Inner loops for the volume and mix commands.
//!
//! Two implementations of the same contract live here:
//!
//! - [`scalar`]: one sample at a time. Always available and the reference for
//!   tests.
//! - [`lanes`]: processes fixed blocks of [`LANES`] samples so the optimizer
//!   can emit vector instructions, with a scalar tail. Selected at runtime when
//!   the CPU reports a wide vector unit.
//!
//! Both paths apply [`multiply_round_up`] to every sample and must produce
//! bit-identical output. The public entry points dispatch through
//! [`KernelPath::detect`].

use std::sync::OnceLock;

use crate::math::multiply_round_up;

/// Samples per lane block.
pub const LANES: usize = 8;

/// Which implementation the dispatching entry points use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelPath {
    /// Sample-by-sample loops.
    Scalar,
    /// Lane-blocked loops.
    Lanes,
}

impl KernelPath {
    /// Detect the best path for this CPU. The result is cached.
    pub fn detect() -> Self {
        static PATH: OnceLock<KernelPath> = OnceLock::new();
        *PATH.get_or_init(|| {
            let path = if has_vector_unit() {
                KernelPath::Lanes
            } else {
                KernelPath::Scalar
            };
            tracing::debug!(?path, "selected mix kernel path");
            path
        })
    }
}

#[cfg(target_arch = "x86_64")]
fn has_vector_unit() -> bool {
    std::arch::is_x86_feature_detected!("avx")
}

#[cfg(target_arch = "aarch64")]
fn has_vector_unit() -> bool {
    // NEON is part of the aarch64 baseline.
    true
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn has_vector_unit() -> bool {
    false
}

/// `output[i] = round_up(input[i] * volume)`.
#[inline]
pub fn apply_volume(output: &mut [f32], input: &[f32], volume: f32) {
    match KernelPath::detect() {
        KernelPath::Scalar => scalar::apply_volume(output, input, volume),
        KernelPath::Lanes => lanes::apply_volume(output, input, volume),
    }
}

/// `output[i] += round_up(input[i] * volume)`.
#[inline]
pub fn mix(output: &mut [f32], input: &[f32], volume: f32) {
    match KernelPath::detect() {
        KernelPath::Scalar => scalar::mix(output, input, volume),
        KernelPath::Lanes => lanes::mix(output, input, volume),
    }
}

/// Reference sample-by-sample implementations.
pub mod scalar {
    use super::multiply_round_up;

    /// `output[i] = round_up(input[i] * volume)`.
    pub fn apply_volume(output: &mut [f32], input: &[f32], volume: f32) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = multiply_round_up(sample, volume);
        }
    }

    /// `output[i] += round_up(input[i] * volume)`.
    pub fn mix(output: &mut [f32], input: &[f32], volume: f32) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out += multiply_round_up(sample, volume);
        }
    }
}

/// Lane-blocked implementations.
pub mod lanes {
    use super::{LANES, multiply_round_up};

    /// `output[i] = round_up(input[i] * volume)`.
    pub fn apply_volume(output: &mut [f32], input: &[f32], volume: f32) {
        let len = output.len().min(input.len());
        let (output, input) = (&mut output[..len], &input[..len]);

        let mut out_blocks = output.chunks_exact_mut(LANES);
        let mut in_blocks = input.chunks_exact(LANES);
        for (out, inp) in (&mut out_blocks).zip(&mut in_blocks) {
            let mut block = [0.0_f32; LANES];
            for lane in 0..LANES {
                block[lane] = multiply_round_up(inp[lane], volume);
            }
            out.copy_from_slice(&block);
        }
        for (out, &sample) in out_blocks
            .into_remainder()
            .iter_mut()
            .zip(in_blocks.remainder())
        {
            *out = multiply_round_up(sample, volume);
        }
    }

    /// `output[i] += round_up(input[i] * volume)`.
    pub fn mix(output: &mut [f32], input: &[f32], volume: f32) {
        let len = output.len().min(input.len());
        let (output, input) = (&mut output[..len], &input[..len]);

        let mut out_blocks = output.chunks_exact_mut(LANES);
        let mut in_blocks = input.chunks_exact(LANES);
        for (out, inp) in (&mut out_blocks).zip(&mut in_blocks) {
            let mut block = [0.0_f32; LANES];
            for lane in 0..LANES {
                block[lane] = out[lane] + multiply_round_up(inp[lane], volume);
            }
            out.copy_from_slice(&block);
        }
        for (out, &sample) in out_blocks
            .into_remainder()
            .iter_mut()
            .zip(in_blocks.remainder())
        {
            *out += multiply_round_up(sample, volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_input(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 - 50.0) * 37.3).collect()
    }

    #[test]
    fn test_volume_paths_agree() {
        let input = ramp_input(243);
        let mut a = vec![0.0; 243];
        let mut b = vec![0.0; 243];
        scalar::apply_volume(&mut a, &input, 0.737);
        lanes::apply_volume(&mut b, &input, 0.737);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mix_paths_agree() {
        let input = ramp_input(161);
        let mut a: Vec<f32> = (0..161).map(|i| i as f32).collect();
        let mut b = a.clone();
        scalar::mix(&mut a, &input, -1.25);
        lanes::mix(&mut b, &input, -1.25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dispatch_matches_scalar() {
        let input = ramp_input(240);
        let mut a = vec![3.0; 240];
        let mut b = vec![3.0; 240];
        mix(&mut a, &input, 0.5);
        scalar::mix(&mut b, &input, 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_lanes_handle_short_slices() {
        let mut out = [0.0_f32; 3];
        lanes::apply_volume(&mut out, &[1.4, 2.5, -2.5], 1.0);
        assert_eq!(out, [1.0, 3.0, -3.0]);
    }
}
