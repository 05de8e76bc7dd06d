//! Fractional-position resampling.
//!
//! The resampler walks an input slice at `ratio` input samples per output
//! sample, carrying the fractional part of the position between calls. The
//! input always starts with a history prefix (the tail of the previous call's
//! input), so every output sample has a full interpolation window available
//! without reading ahead of what has been decoded.
//!
//! | Quality | Kernel | History |
//! |---------|--------|---------|
//! | [`Low`](SampleRateConversionQuality::Low) | linear | 4 |
//! | [`Default`](SampleRateConversionQuality::Default) | 4-point Catmull-Rom | 4 |
//! | [`High`](SampleRateConversionQuality::High) | 8-tap Hann-windowed sinc | 8 |
//!
//! Output sample `i` interpolates between `input[index + c]` and
//! `input[index + c + 1]` where `c` is `1` for the 4-sample kernels and `3`
//! for the 8-tap kernel, and `index` is the integer part of
//! `fraction + i * ratio`.

use core::f32::consts::PI;

use libm::{cosf, sinf};

use crate::error::CommandError;

/// Interpolation quality selected per voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SampleRateConversionQuality {
    /// 4-point cubic.
    #[default]
    Default,
    /// 8-tap windowed sinc.
    High,
    /// Linear.
    Low,
}

impl SampleRateConversionQuality {
    /// History samples kept between calls for this quality.
    pub const fn history_len(self) -> usize {
        match self {
            Self::Default | Self::Low => 4,
            Self::High => 8,
        }
    }

    const fn center(self) -> usize {
        match self {
            Self::Default | Self::Low => 1,
            Self::High => 3,
        }
    }
}

impl TryFrom<u8> for SampleRateConversionQuality {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::High),
            2 => Ok(Self::Low),
            other => Err(CommandError::UnsupportedQuality(other)),
        }
    }
}

/// Input samples consumed by producing `output_count` samples.
///
/// Callers size their input as `history_len() + input_sample_count(..)`.
#[inline]
pub fn input_sample_count(ratio: f32, fraction: f32, output_count: usize) -> usize {
    let consumed = fraction + ratio * output_count as f32;
    if consumed > 0.0 { consumed as usize } else { 0 }
}

/// Resample `input` (history prefix included) into `output`.
///
/// # Arguments
///
/// * `output` - Destination; every element is written
/// * `input` - History prefix followed by new samples
/// * `ratio` - Input samples per output sample
/// * `fraction` - Fractional position, updated in place
/// * `quality` - Interpolation kernel
pub fn resample<T>(
    output: &mut [f32],
    input: &[T],
    ratio: f32,
    fraction: &mut f32,
    quality: SampleRateConversionQuality,
) where
    T: Copy + Into<f32>,
{
    let taps = quality.history_len();
    if input.len() < taps {
        output.fill(0.0);
        return;
    }
    let last_start = input.len() - taps;

    let mut index = 0_usize;
    let mut frac = *fraction;
    for out in output.iter_mut() {
        let start = index.min(last_start);
        let window = &input[start..start + taps];
        *out = match quality {
            SampleRateConversionQuality::Low => linear(window, frac),
            SampleRateConversionQuality::Default => catmull_rom(window, frac),
            SampleRateConversionQuality::High => windowed_sinc(window, frac),
        };

        frac += ratio;
        let whole = frac as usize;
        index += whole;
        frac -= whole as f32;
    }
    *fraction = frac;
}

/// Copy new samples straight through, skipping interpolation.
///
/// Used when the ratio is exactly one and no pitch change applies. `input`
/// excludes the history prefix.
pub fn copy_through<T>(output: &mut [f32], input: &[T])
where
    T: Copy + Into<f32>,
{
    for (out, &sample) in output.iter_mut().zip(input) {
        *out = sample.into();
    }
}

#[inline]
fn linear<T: Copy + Into<f32>>(window: &[T], frac: f32) -> f32 {
    let c = SampleRateConversionQuality::Low.center();
    let a: f32 = window[c].into();
    let b: f32 = window[c + 1].into();
    a + (b - a) * frac
}

#[inline]
fn catmull_rom<T: Copy + Into<f32>>(window: &[T], frac: f32) -> f32 {
    let p0: f32 = window[0].into();
    let p1: f32 = window[1].into();
    let p2: f32 = window[2].into();
    let p3: f32 = window[3].into();

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    ((a * frac + b) * frac + c) * frac + p1
}

#[inline]
fn windowed_sinc<T: Copy + Into<f32>>(window: &[T], frac: f32) -> f32 {
    if frac == 0.0 {
        return window[SampleRateConversionQuality::High.center()].into();
    }

    let center = SampleRateConversionQuality::High.center() as f32;
    let half_width = window.len() as f32 / 2.0;
    let mut acc = 0.0;
    let mut norm = 0.0;
    for (k, &sample) in window.iter().enumerate() {
        let x = k as f32 - center - frac;
        let sinc = sinf(PI * x) / (PI * x);
        let hann = 0.5 + 0.5 * cosf(PI * x / half_width);
        let weight = sinc * hann;
        acc += sample.into() * weight;
        norm += weight;
    }
    if norm.abs() > f32::EPSILON { acc / norm } else { acc }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SampleRateConversionQuality; 3] = [
        SampleRateConversionQuality::Low,
        SampleRateConversionQuality::Default,
        SampleRateConversionQuality::High,
    ];

    #[test]
    fn test_quality_from_raw() {
        assert_eq!(
            SampleRateConversionQuality::try_from(1),
            Ok(SampleRateConversionQuality::High)
        );
        assert_eq!(
            SampleRateConversionQuality::try_from(9),
            Err(CommandError::UnsupportedQuality(9))
        );
    }

    #[test]
    fn test_input_sample_count() {
        assert_eq!(input_sample_count(1.0, 0.0, 240), 240);
        assert_eq!(input_sample_count(0.5, 0.5, 3), 2);
        assert_eq!(input_sample_count(2.0, 0.25, 10), 20);
    }

    #[test]
    fn test_unity_ratio_reproduces_input_with_latency() {
        for quality in ALL {
            let history = quality.history_len();
            let center = quality.center();
            let input: Vec<i16> = (0..(history + 16) as i16).map(|i| i * 10).collect();
            let mut output = [0.0; 16];
            let mut fraction = 0.0;
            resample(&mut output, &input, 1.0, &mut fraction, quality);
            for (i, &y) in output.iter().enumerate() {
                assert_eq!(y, f32::from(input[i + center]), "{quality:?} sample {i}");
            }
            assert_eq!(fraction, 0.0);
        }
    }

    #[test]
    fn test_linear_midpoints() {
        let input: [f32; 8] = [0.0, 0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let mut output = [0.0; 4];
        let mut fraction = 0.5;
        resample(&mut output, &input, 1.0, &mut fraction, SampleRateConversionQuality::Low);
        assert_eq!(output, [1.0, 3.0, 5.0, 7.0]);
        assert_eq!(fraction, 0.5);
    }

    #[test]
    fn test_half_ratio_upsamples() {
        let input: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let mut output = [0.0; 8];
        let mut fraction = 0.0;
        resample(&mut output, &input, 0.5, &mut fraction, SampleRateConversionQuality::Default);
        // Catmull-Rom reproduces a straight line exactly.
        for (i, &y) in output.iter().enumerate() {
            assert!((y - (1.0 + i as f32 * 0.5)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_window_never_reads_past_input() {
        let input = [1.0_f32; 5];
        let mut output = [0.0; 32];
        let mut fraction = 0.0;
        resample(&mut output, &input, 3.0, &mut fraction, SampleRateConversionQuality::Default);
        assert!(output.iter().all(|&y| (y - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_copy_through() {
        let mut output = [0.0; 3];
        copy_through(&mut output, &[1_i16, -2, 3]);
        assert_eq!(output, [1.0, -2.0, 3.0]);
    }
}
