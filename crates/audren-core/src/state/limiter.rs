//! Look-ahead limiter state.
//!
//! Per channel and per sample:
//!
//! ```text
//! x        = in / 32767 * input_gain
//! detector = ema(|x|)            attack if |x| > detector, else release
//! target   = threshold / detector   if detector > threshold, else 1
//! gain     = ema(target)         attack if gain > target, else release
//! out      = delayed(x) * gain * output_gain * 32767
//! ```
//!
//! `delayed` is a ring of `delay_buffer_sample_count_min` samples per channel,
//! so gain reduction is applied to the sample that entered the ring one
//! look-ahead period earlier.

use crate::constants::CHANNEL_COUNT_MAX;
use crate::memory::CpuAddress;
use crate::one_pole::ExponentialMovingAverage;
use crate::parameter::{ChannelLayout, LimiterParameter};

const PCM_SCALE: f32 = i16::MAX as f32;

/// Peak input and deepest gain reduction per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterStatistics {
    /// Largest normalized input magnitude seen.
    pub input_max: [f32; CHANNEL_COUNT_MAX],
    /// Smallest compression gain applied.
    pub compression_gain_min: [f32; CHANNEL_COUNT_MAX],
}

impl LimiterStatistics {
    /// Back to "nothing seen yet".
    pub fn reset(&mut self) {
        self.input_max = [0.0; CHANNEL_COUNT_MAX];
        self.compression_gain_min = [1.0; CHANNEL_COUNT_MAX];
    }

    /// Fold one processed sample into the statistics.
    #[inline]
    pub fn record(&mut self, channel: usize, input_magnitude: f32, compression_gain: f32) {
        self.input_max[channel] = self.input_max[channel].max(input_magnitude);
        self.compression_gain_min[channel] = self.compression_gain_min[channel].min(compression_gain);
    }
}

impl Default for LimiterStatistics {
    fn default() -> Self {
        Self {
            input_max: [0.0; CHANNEL_COUNT_MAX],
            compression_gain_min: [1.0; CHANNEL_COUNT_MAX],
        }
    }
}

/// Result of limiting one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitedSample {
    /// Output on the PCM scale.
    pub output: f32,
    /// Normalized input magnitude, for statistics.
    pub input_magnitude: f32,
    /// Gain applied to the delayed sample.
    pub compression_gain: f32,
}

/// Envelope followers and look-ahead rings of one limiter effect.
#[derive(Debug, Clone, Default)]
pub struct LimiterState {
    layout: Option<ChannelLayout>,
    detector_average: Vec<ExponentialMovingAverage>,
    compression_gain_average: Vec<ExponentialMovingAverage>,
    delayed_samples: Vec<f32>,
    positions: Vec<usize>,
    ring_capacity: usize,
    ring_len: usize,
    attack_coefficient: f32,
    release_coefficient: f32,
    threshold: f32,
    input_gain: f32,
    output_gain: f32,
    work_buffer: CpuAddress,
}

impl LimiterState {
    /// Fresh state: detectors at 0, gains at unity, rings zeroed.
    pub fn new(parameter: &LimiterParameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self {
        let channels = usize::from(parameter.channel_count_max).max(layout.channel_count());
        let ring_capacity = (parameter.delay_buffer_sample_count_max as usize).max(1);

        tracing::debug!(
            effect = "limiter",
            channel_count = layout.channel_count(),
            work_buffer,
            "initialized effect state"
        );

        let mut state = Self {
            layout: Some(layout),
            detector_average: vec![ExponentialMovingAverage::new(0.0); channels],
            compression_gain_average: vec![ExponentialMovingAverage::new(1.0); channels],
            delayed_samples: vec![0.0; channels * ring_capacity],
            positions: vec![0; channels],
            ring_capacity,
            work_buffer,
            ..Self::default()
        };
        state.update_parameter(parameter, layout);
        state
    }

    /// Whether the state has been built from a parameter block.
    pub fn is_configured(&self) -> bool {
        self.layout.is_some()
    }

    /// Layout the state currently processes, if configured.
    pub fn layout(&self) -> Option<ChannelLayout> {
        self.layout
    }

    /// Channels the followers and look-ahead rings were allocated for.
    pub fn channel_capacity(&self) -> usize {
        self.positions.len()
    }

    /// Work buffer address recorded at construction.
    pub fn work_buffer(&self) -> CpuAddress {
        self.work_buffer
    }

    /// Current detector level of `channel`.
    pub fn detector(&self, channel: usize) -> f32 {
        self.detector_average[channel].read()
    }

    /// Current compression gain of `channel`.
    pub fn compression_gain(&self, channel: usize) -> f32 {
        self.compression_gain_average[channel].read()
    }

    /// Take new coefficients and look-ahead, keeping followers and rings.
    pub fn update_parameter(&mut self, parameter: &LimiterParameter, layout: ChannelLayout) {
        self.layout = Some(layout);
        self.attack_coefficient = parameter.attack_coefficient;
        self.release_coefficient = parameter.release_coefficient;
        self.threshold = parameter.threshold;
        self.input_gain = parameter.input_gain;
        self.output_gain = parameter.output_gain;
        self.ring_len = (parameter.delay_buffer_sample_count_min as usize).clamp(1, self.ring_capacity);
        for position in &mut self.positions {
            if *position >= self.ring_len {
                *position = 0;
            }
        }
    }

    /// Limit one sample of `channel`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, raw_input: f32) -> LimitedSample {
        let input = raw_input / PCM_SCALE * self.input_gain;
        let magnitude = input.abs();

        let detector = &mut self.detector_average[channel];
        let coefficient = if magnitude > detector.read() {
            self.attack_coefficient
        } else {
            self.release_coefficient
        };
        let level = detector.update(magnitude, coefficient);

        let attenuation = if level > self.threshold {
            self.threshold / level
        } else {
            1.0
        };

        let gain_average = &mut self.compression_gain_average[channel];
        let coefficient = if gain_average.read() > attenuation {
            self.attack_coefficient
        } else {
            self.release_coefficient
        };
        let gain = gain_average.update(attenuation, coefficient);

        let slot = channel * self.ring_capacity + self.positions[channel];
        let delayed = self.delayed_samples[slot];
        self.delayed_samples[slot] = input;
        self.positions[channel] += 1;
        if self.positions[channel] >= self.ring_len {
            self.positions[channel] = 0;
        }

        LimitedSample {
            output: delayed * gain * self.output_gain * PCM_SCALE,
            input_magnitude: magnitude,
            compression_gain: gain,
        }
    }

    /// Limit one sample index across channels, without statistics.
    pub fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        for (channel, (out, &sample)) in output.iter_mut().zip(input).enumerate() {
            *out = self.process_sample(channel, sample).output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter() -> LimiterParameter {
        LimiterParameter {
            delay_buffer_sample_count_min: 4,
            delay_buffer_sample_count_max: 8,
            attack_coefficient: 1.0,
            release_coefficient: 1.0,
            threshold: 0.5,
            ..LimiterParameter::default()
        }
    }

    #[test]
    fn test_quiet_signal_is_only_delayed() {
        let mut state = LimiterState::new(&parameter(), ChannelLayout::Mono, 0);
        let input = [1000.0, -2000.0, 3000.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let out: Vec<f32> = input.iter().map(|&x| state.process_sample(0, x).output).collect();
        assert_eq!(&out[..4], &[0.0; 4]);
        for (y, x) in out[4..7].iter().zip(&input[..3]) {
            assert!((y - x).abs() < 1e-2, "{y} vs {x}");
        }
    }

    #[test]
    fn test_loud_signal_is_attenuated_to_threshold() {
        let mut state = LimiterState::new(&parameter(), ChannelLayout::Mono, 0);
        let mut last = LimitedSample {
            output: 0.0,
            input_magnitude: 0.0,
            compression_gain: 1.0,
        };
        for _ in 0..16 {
            last = state.process_sample(0, 32767.0);
        }
        assert!((last.compression_gain - 0.5).abs() < 1e-6);
        assert!((last.output - 0.5 * 32767.0).abs() < 1e-1);
    }

    #[test]
    fn test_statistics() {
        let mut stats = LimiterStatistics::default();
        stats.record(1, 0.8, 0.6);
        stats.record(1, 0.3, 0.9);
        assert_eq!(stats.input_max[1], 0.8);
        assert_eq!(stats.compression_gain_min[1], 0.6);
        stats.reset();
        assert_eq!(stats, LimiterStatistics::default());
    }

    #[test]
    fn test_update_shrinks_ring_without_losing_followers() {
        let mut state = LimiterState::new(&parameter(), ChannelLayout::Mono, 0);
        for _ in 0..3 {
            state.process_sample(0, 32767.0);
        }
        let detector = state.detector(0);
        state.update_parameter(
            &LimiterParameter {
                delay_buffer_sample_count_min: 2,
                ..parameter()
            },
            ChannelLayout::Mono,
        );
        assert_eq!(state.detector(0), detector);
        assert_eq!(state.positions[0], 0);
    }
}
