//! Feedback delay state.
//!
//! Each channel owns a delay line. Every sample, the delay-line outputs are
//! mixed through a constant per-layout feedback matrix, low-pass filtered and
//! written back:
//!
//! ```text
//! d      = line.read()                    (per channel)
//! temp   = x * in_gain + M * d
//! z      = lp_feedback * z + lp_base * temp
//! line.update(z)
//! y      = x * dry_gain + d * out_gain
//! ```
//!
//! The matrix entries are one of four terms: zero, the base gain
//! (`(1 - spread) * feedback`), the cross gain (`spread * feedback`, halved
//! for quad and 5.1) or the raw feedback gain.

use crate::constants::CHANNEL_COUNT_MAX;
use crate::delay::DelayLine;
use crate::fixed_point::{Q14, to_float};
use crate::memory::CpuAddress;
use crate::parameter::{ChannelLayout, DelayParameter};

/// Headroom scaling applied around the delay network.
const HEADROOM: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Zero,
    Base,
    Cross,
    Feedback,
}

use Term::{Base as B, Cross as C, Feedback as F, Zero as Z};

const MONO: [[Term; CHANNEL_COUNT_MAX]; CHANNEL_COUNT_MAX] = [
    [F, Z, Z, Z, Z, Z],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
];

const STEREO: [[Term; CHANNEL_COUNT_MAX]; CHANNEL_COUNT_MAX] = [
    [B, C, Z, Z, Z, Z],
    [C, B, Z, Z, Z, Z],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
];

const QUAD: [[Term; CHANNEL_COUNT_MAX]; CHANNEL_COUNT_MAX] = [
    [B, C, C, Z, Z, Z],
    [C, B, Z, C, Z, Z],
    [C, Z, B, C, Z, Z],
    [Z, C, C, B, Z, Z],
    [Z; CHANNEL_COUNT_MAX],
    [Z; CHANNEL_COUNT_MAX],
];

// [FL, FR, FC, LFE, RL, RR]; the LFE only feeds back into itself.
const SURROUND: [[Term; CHANNEL_COUNT_MAX]; CHANNEL_COUNT_MAX] = [
    [B, Z, C, Z, C, Z],
    [Z, B, C, Z, Z, C],
    [C, C, B, Z, Z, Z],
    [Z, Z, Z, F, Z, Z],
    [C, Z, Z, Z, B, C],
    [Z, C, Z, Z, C, B],
];

const fn matrix(layout: ChannelLayout) -> &'static [[Term; CHANNEL_COUNT_MAX]; CHANNEL_COUNT_MAX] {
    match layout {
        ChannelLayout::Mono => &MONO,
        ChannelLayout::Stereo => &STEREO,
        ChannelLayout::Quad => &QUAD,
        ChannelLayout::Surround => &SURROUND,
    }
}

/// Delay lines and derived gains of one delay effect.
#[derive(Debug, Clone, Default)]
pub struct DelayState {
    layout: Option<ChannelLayout>,
    lines: Vec<DelayLine>,
    low_pass_z: [f32; CHANNEL_COUNT_MAX],
    in_gain: f32,
    out_gain: f32,
    dry_gain: f32,
    feedback_gain: f32,
    base_gain: f32,
    cross_gain: f32,
    low_pass_feedback_gain: f32,
    low_pass_base_gain: f32,
    work_buffer: CpuAddress,
}

impl DelayState {
    /// Fresh state with zeroed lines sized for `delay_time_max`.
    pub fn new(parameter: &DelayParameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self {
        let channels = usize::from(parameter.channel_count_max).max(layout.channel_count());
        let lines = (0..channels)
            .map(|_| DelayLine::new(parameter.sample_rate, parameter.delay_time_max as f32))
            .collect();

        tracing::debug!(
            effect = "delay",
            channel_count = layout.channel_count(),
            work_buffer,
            "initialized effect state"
        );

        let mut state = Self {
            layout: Some(layout),
            lines,
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

    /// Channels the delay lines were allocated for.
    pub fn channel_capacity(&self) -> usize {
        self.lines.len()
    }

    /// Work buffer address recorded at construction.
    pub fn work_buffer(&self) -> CpuAddress {
        self.work_buffer
    }

    /// Recompute gains and delay lengths, keeping line contents.
    pub fn update_parameter(&mut self, parameter: &DelayParameter, layout: ChannelLayout) {
        let q = |v: i32| to_float(i64::from(v), Q14);

        self.layout = Some(layout);
        self.in_gain = q(parameter.in_gain);
        self.out_gain = q(parameter.out_gain);
        self.dry_gain = q(parameter.dry_gain);
        self.feedback_gain = q(parameter.feedback_gain);

        let damped_feedback = self.feedback_gain * 0.98;
        let spread = q(parameter.channel_spread);
        self.base_gain = (1.0 - spread) * damped_feedback;
        self.cross_gain = match layout {
            ChannelLayout::Quad | ChannelLayout::Surround => spread * 0.5 * damped_feedback,
            ChannelLayout::Mono | ChannelLayout::Stereo => spread * damped_feedback,
        };

        self.low_pass_feedback_gain = 0.95 * q(parameter.low_pass_amount);
        self.low_pass_base_gain = 1.0 - self.low_pass_feedback_gain;

        for line in &mut self.lines {
            line.set_delay(parameter.delay_time as f32);
        }
    }

    #[inline]
    fn term(&self, term: Term) -> f32 {
        match term {
            Term::Zero => 0.0,
            Term::Base => self.base_gain,
            Term::Cross => self.cross_gain,
            Term::Feedback => self.feedback_gain,
        }
    }

    /// Process one sample on every channel.
    ///
    /// `input` and `output` hold one value per active channel.
    pub fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        let Some(layout) = self.layout else {
            unreachable!("delay processed before initialization");
        };
        let channels = layout.channel_count();
        let matrix = matrix(layout);

        let mut scaled = [0.0_f32; CHANNEL_COUNT_MAX];
        let mut delayed = [0.0_f32; CHANNEL_COUNT_MAX];
        for ch in 0..channels {
            scaled[ch] = input[ch] * HEADROOM;
            delayed[ch] = self.lines[ch].read();
        }

        for ch in 0..channels {
            let mut feedback = 0.0;
            for (src, &term) in matrix[ch].iter().enumerate().take(channels) {
                feedback += delayed[src] * self.term(term);
            }
            let temp = scaled[ch] * self.in_gain + feedback;

            let z = self.low_pass_feedback_gain * self.low_pass_z[ch] + temp * self.low_pass_base_gain;
            self.low_pass_z[ch] = z;
            self.lines[ch].update(z);

            output[ch] = (scaled[ch] * self.dry_gain + delayed[ch] * self.out_gain) / HEADROOM;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(channels: u16) -> DelayParameter {
        DelayParameter {
            channel_count: channels,
            channel_count_max: channels,
            delay_time_max: 10,
            delay_time: 1,
            sample_rate: 1000,
            ..DelayParameter::default()
        }
    }

    #[test]
    fn test_matrices_are_symmetric() {
        for layout in [ChannelLayout::Stereo, ChannelLayout::Quad, ChannelLayout::Surround] {
            let m = matrix(layout);
            for r in 0..CHANNEL_COUNT_MAX {
                for c in 0..CHANNEL_COUNT_MAX {
                    assert_eq!(m[r][c], m[c][r], "{layout:?} [{r}][{c}]");
                }
            }
        }
    }

    #[test]
    fn test_mono_echo() {
        // 1 ms at 1 kHz = one sample of delay; dry 1, wet 1, feedback 0.5.
        let p = parameter(1);
        let mut state = DelayState::new(&p, ChannelLayout::Mono, 0);
        let mut out = [0.0];
        state.process_frame(&[1.0], &mut out);
        assert_eq!(out[0], 1.0);
        state.process_frame(&[0.0], &mut out);
        assert_eq!(out[0], 1.0);
        state.process_frame(&[0.0], &mut out);
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn test_cross_gain_halved_for_quad() {
        let p = DelayParameter {
            channel_spread: 1 << 14,
            feedback_gain: 1 << 14,
            ..parameter(4)
        };
        let quad = DelayState::new(&p, ChannelLayout::Quad, 0);
        let stereo_parameter = DelayParameter {
            channel_count: 2,
            channel_count_max: 2,
            ..p
        };
        let stereo = DelayState::new(&stereo_parameter, ChannelLayout::Stereo, 0);
        assert_eq!(quad.base_gain, 0.0);
        assert!((quad.cross_gain - 0.49).abs() < 1e-6);
        assert!((stereo.cross_gain - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_update_keeps_line_contents() {
        let p = parameter(1);
        let mut state = DelayState::new(&p, ChannelLayout::Mono, 0x8000);
        let mut out = [0.0];
        state.process_frame(&[1.0], &mut out);
        state.update_parameter(&DelayParameter { dry_gain: 0, ..p }, ChannelLayout::Mono);
        state.process_frame(&[0.0], &mut out);
        assert_eq!(out[0], 1.0);
        assert_eq!(state.work_buffer(), 0x8000);
    }

    #[test]
    fn test_default_is_unconfigured() {
        assert!(!DelayState::default().is_configured());
    }
}
