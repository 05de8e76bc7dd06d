//! I3DL2-style 3D reverb state.
//!
//! Shares the routing tables and feedback matrix of the plain reverb, with
//! three differences:
//!
//! - levels come in millibels and times in seconds;
//! - the network input is low-passed by a one-pole smoother whose gains
//!   (`target_pre_delay_gain`, `previous_pre_delay_gain`) realize the room's
//!   high-frequency attenuation at the reference frequency;
//! - line outputs pass through a second allpass bank, and on 5.1 the centre
//!   channel receives the difference of lines 2 and 3 through its own short
//!   delay line.

use core::f32::consts::PI;

use libm::{cosf, sqrtf};

use crate::constants::CHANNEL_COUNT_MAX;
use crate::delay::{DecayDelay, DelayLine, delay_time_to_samples};
use crate::math::millibels_to_linear;
use crate::memory::CpuAddress;
use crate::one_pole::DecayFilter;
use crate::parameter::{ChannelLayout, Reverb3dParameter};

use super::reverb::{EARLY_TAP_COUNT, FDN_LINE_COUNT, MATRIX_NORMALIZATION, feedback_matrix, routing};

const FDN_DELAY_MIN_TIMES: [f32; FDN_LINE_COUNT] = [5.0, 6.0, 13.0, 14.0];
const FDN_DELAY_MAX_TIMES: [f32; FDN_LINE_COUNT] = [45.704, 82.782, 149.94, 214.11];
const DECAY_DELAY_TIMES_1: [f32; FDN_LINE_COUNT] = [17.0, 13.0, 9.0, 7.0];
const DECAY_DELAY_TIMES_2: [f32; FDN_LINE_COUNT] = [19.0, 11.0, 10.0, 6.0];

/// Positions of the early taps inside the reflection window.
const EARLY_TAP_POSITIONS: [f32; EARLY_TAP_COUNT] = [
    0.017136, 0.059154, 0.161733, 0.390186, 0.425262, 0.455411, 0.689737, 0.745910, 0.833844, 0.859502,
];

const EARLY_TAP_GAINS: [f32; EARLY_TAP_COUNT] = [
    0.67096, 0.61027, 1.0, 0.35680, 0.68361, 0.65978, 0.51939, 0.24712, 0.45945, 0.45021,
];

/// Centre channel of the 5.1 layout.
const FRONT_CENTER: usize = 2;

/// Level cap (mB) applied to the combined room and reflection/reverb levels.
const LEVEL_MAX: f32 = 5000.0;

const PRE_DELAY_LINE_MAX: f32 = 400.0;
const FDN_DELAY_MAX: f32 = 220.0;
const DECAY_DELAY_MAX: f32 = 20.0;
const FRONT_CENTER_DELAY: f32 = 5.0;

/// Delay lines, filters and derived gains of one 3D reverb effect.
#[derive(Debug, Clone, Default)]
pub struct Reverb3dState {
    layout: Option<ChannelLayout>,
    pre_delay_line: Option<DelayLine>,
    front_center_line: Option<DelayLine>,
    fdn_lines: Vec<DelayLine>,
    decay_delays_1: Vec<DecayDelay>,
    decay_delays_2: Vec<DecayDelay>,
    decay_filters: [DecayFilter; FDN_LINE_COUNT],
    early_delay_samples: [usize; EARLY_TAP_COUNT],
    early_gains: [f32; EARLY_TAP_COUNT],
    late_delay_samples: usize,
    late_reverb_gain: f32,
    target_pre_delay_gain: f32,
    previous_pre_delay_gain: f32,
    pre_delay_z: f32,
    dry_gain: f32,
    work_buffer: CpuAddress,
}

impl Reverb3dState {
    /// Fresh state with zeroed lines.
    pub fn new(parameter: &Reverb3dParameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self {
        let sample_rate = parameter.sample_rate;
        let mut state = Self {
            layout: Some(layout),
            pre_delay_line: Some(DelayLine::new(sample_rate, PRE_DELAY_LINE_MAX)),
            front_center_line: Some(DelayLine::new(sample_rate, FRONT_CENTER_DELAY)),
            fdn_lines: (0..FDN_LINE_COUNT)
                .map(|_| DelayLine::new(sample_rate, FDN_DELAY_MAX))
                .collect(),
            decay_delays_1: (0..FDN_LINE_COUNT)
                .map(|_| DecayDelay::new(DelayLine::new(sample_rate, DECAY_DELAY_MAX)))
                .collect(),
            decay_delays_2: (0..FDN_LINE_COUNT)
                .map(|_| DecayDelay::new(DelayLine::new(sample_rate, DECAY_DELAY_MAX)))
                .collect(),
            work_buffer,
            ..Self::default()
        };

        tracing::debug!(
            effect = "reverb3d",
            channel_count = layout.channel_count(),
            work_buffer,
            "initialized effect state"
        );

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

    /// Work buffer address recorded at construction.
    pub fn work_buffer(&self) -> CpuAddress {
        self.work_buffer
    }

    /// Gains of the input smoother as `(target, previous)`.
    pub fn pre_delay_gains(&self) -> (f32, f32) {
        (self.target_pre_delay_gain, self.previous_pre_delay_gain)
    }

    /// Recompute taps, gains and loop filters, keeping line contents.
    pub fn update_parameter(&mut self, parameter: &Reverb3dParameter, layout: ChannelLayout) {
        let sample_rate = parameter.sample_rate;
        self.layout = Some(layout);
        self.dry_gain = parameter.dry_gain;

        let early_level = millibels_to_linear((parameter.room_gain + parameter.reflection_gain).min(LEVEL_MAX));
        self.late_reverb_gain = millibels_to_linear((parameter.room_gain + parameter.reverb_gain).min(LEVEL_MAX));

        let capacity = self.pre_delay_line.as_ref().map_or(1, DelayLine::capacity);
        let reflection_ms = parameter.reflection_delay.max(0.0) * 1000.0;
        let reverb_ms = parameter.reverb_delay_time.max(0.0) * 1000.0;
        for tap in 0..EARLY_TAP_COUNT {
            let ms = reflection_ms + EARLY_TAP_POSITIONS[tap] * reverb_ms;
            self.early_delay_samples[tap] = delay_time_to_samples(sample_rate, ms).clamp(1, capacity);
            self.early_gains[tap] = EARLY_TAP_GAINS[tap] * early_level;
        }
        self.late_delay_samples = delay_time_to_samples(sample_rate, reflection_ms + reverb_ms).clamp(1, capacity);

        let (target, previous) = high_frequency_smoother(
            millibels_to_linear(parameter.room_hf_gain.min(0.0)),
            parameter.reference_hf,
            sample_rate,
        );
        self.target_pre_delay_gain = target;
        self.previous_pre_delay_gain = previous;

        let density = (parameter.density / 100.0).clamp(0.0, 1.0);
        let diffusion = (parameter.diffusion / 100.0).clamp(0.0, 1.0);
        for i in 0..FDN_LINE_COUNT {
            let fdn_ms = FDN_DELAY_MIN_TIMES[i] + density * (FDN_DELAY_MAX_TIMES[i] - FDN_DELAY_MIN_TIMES[i]);
            self.fdn_lines[i].set_delay(fdn_ms);
            self.decay_delays_1[i].set_delay(DECAY_DELAY_TIMES_1[i]);
            self.decay_delays_2[i].set_delay(DECAY_DELAY_TIMES_2[i]);
            self.decay_delays_1[i].set_decay_rate(diffusion * 0.6);
            self.decay_delays_2[i].set_decay_rate(diffusion * 0.6);

            let loop_samples = self.fdn_lines[i].delay() + self.decay_delays_1[i].delay();
            self.decay_filters[i].configure(
                loop_samples,
                parameter.decay_time,
                parameter.decay_hf_ratio,
                sample_rate,
            );
        }
    }

    /// Process one sample on every channel.
    pub fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        let (Some(layout), Some(pre_delay_line), Some(front_center_line)) = (
            self.layout,
            self.pre_delay_line.as_mut(),
            self.front_center_line.as_mut(),
        ) else {
            unreachable!("3D reverb processed before initialization");
        };
        let channels = layout.channel_count();
        let routing = routing(layout);

        let mut wet = [0.0_f32; CHANNEL_COUNT_MAX];
        for tap in 0..EARLY_TAP_COUNT {
            wet[routing.early[tap]] += pre_delay_line.tap(self.early_delay_samples[tap]) * self.early_gains[tap];
        }
        let late_input = pre_delay_line.tap(self.late_delay_samples) * self.late_reverb_gain;

        let mono: f32 = input[..channels].iter().sum();
        self.pre_delay_z = mono * self.target_pre_delay_gain + self.pre_delay_z * self.previous_pre_delay_gain;
        pre_delay_line.update(self.pre_delay_z);

        let mut line_out = [0.0_f32; FDN_LINE_COUNT];
        for i in 0..FDN_LINE_COUNT {
            line_out[i] = self.decay_filters[i].process(self.fdn_lines[i].read());
        }
        let feedback = feedback_matrix(line_out);
        let mut values = [0.0_f32; FDN_LINE_COUNT];
        for i in 0..FDN_LINE_COUNT {
            let diffused = self.decay_delays_1[i].update(feedback[i] * MATRIX_NORMALIZATION + late_input);
            self.fdn_lines[i].update(diffused);
            values[i] = self.decay_delays_2[i].update(line_out[i]);
        }
        for &(channel, line) in routing.late {
            wet[channel] += values[line];
        }
        if layout == ChannelLayout::Surround {
            wet[FRONT_CENTER] += front_center_line.update((values[2] - values[3]) * 0.5);
        }

        for ch in 0..channels {
            output[ch] = wet[ch] + input[ch] * self.dry_gain;
        }
    }
}

/// One-pole low-pass `(a, b)` for `y = a*x + b*y1` with unity DC gain and
/// `hf_gain` at `reference_hz`.
fn high_frequency_smoother(hf_gain: f32, reference_hz: f32, sample_rate: u32) -> (f32, f32) {
    if hf_gain >= 1.0 || reference_hz <= 0.0 {
        return (1.0, 0.0);
    }
    let cos_w = cosf(2.0 * PI * reference_hz / sample_rate as f32);
    let g2 = hf_gain * hf_gain;
    let a = 1.0 - g2;
    let b = 1.0 - g2 * cos_w;
    let discriminant = (b * b - a * a).max(0.0);
    let previous = ((b - sqrtf(discriminant)) / a).clamp(0.0, 0.999);
    (1.0 - previous, previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(channels: u16) -> Reverb3dParameter {
        Reverb3dParameter {
            channel_count: channels,
            channel_count_max: channels,
            ..Reverb3dParameter::default()
        }
    }

    #[test]
    fn test_smoother_unity_when_flat() {
        assert_eq!(high_frequency_smoother(1.0, 5000.0, 48000), (1.0, 0.0));
    }

    #[test]
    fn test_smoother_hits_reference_gain() {
        let (a, b) = high_frequency_smoother(0.5, 5000.0, 48000);
        let w = 2.0 * PI * 5000.0 / 48000.0;
        let magnitude = a / sqrtf(1.0 - 2.0 * b * cosf(w) + b * b);
        assert!((magnitude - 0.5).abs() < 1e-3, "{magnitude}");
        assert!((a + b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_front_center_only_for_surround() {
        let mut surround = Reverb3dState::new(&parameter(6), ChannelLayout::Surround, 0);
        let mut quad = Reverb3dState::new(&parameter(4), ChannelLayout::Quad, 0);
        let mut out6 = [0.0; 6];
        let mut out4 = [0.0; 4];
        let mut center_energy = 0.0;
        for n in 0..48_000 {
            let x = if n == 0 { 10_000.0 } else { 0.0 };
            surround.process_frame(&[x, 0.0, 0.0, 0.0, 0.0, 0.0], &mut out6);
            quad.process_frame(&[x, 0.0, 0.0, 0.0], &mut out4);
            if n > 0 {
                center_energy += out6[FRONT_CENTER] * out6[FRONT_CENTER];
            }
        }
        assert!(center_energy > 0.0);
    }

    #[test]
    fn test_lfe_stays_dry() {
        let mut state = Reverb3dState::new(&parameter(6), ChannelLayout::Surround, 0);
        let mut out = [0.0; 6];
        for n in 0..4800 {
            let x = if n == 0 { 10_000.0 } else { 0.0 };
            state.process_frame(&[x, x, 0.0, 0.0, x, x], &mut out);
            if n > 0 {
                assert_eq!(out[3], 0.0);
            }
        }
    }

    #[test]
    fn test_level_cap() {
        let p = Reverb3dParameter {
            room_gain: 4000.0,
            reverb_gain: 4000.0,
            ..parameter(1)
        };
        let state = Reverb3dState::new(&p, ChannelLayout::Mono, 0);
        assert!((state.late_reverb_gain - millibels_to_linear(LEVEL_MAX)).abs() < 1e-4);
    }
}
