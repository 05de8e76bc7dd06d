//! Reverb state: early reflections plus a four-line feedback delay network.
//!
//! ```text
//! in ──► pre-delay line ──┬─ 10 early taps ───────────────► wet
//!                         └─ late tap ─► FDN (4 lines) ───► wet
//! ```
//!
//! Each FDN line is read through a [`DecayFilter`] (loop gain with
//! high-frequency damping), mixed through the fixed matrix
//!
//! ```text
//! fb0 =  f2 + f1      fb2 = f0 - f3
//! fb1 = -f0 - f3      fb3 = f1 - f2
//! ```
//!
//! scaled to unit energy, diffused by an allpass and written back together
//! with the late input. Which early tap and which FDN line lands on which
//! output channel comes from constant per-layout tables.

use core::f32::consts::FRAC_1_SQRT_2;

use crate::constants::CHANNEL_COUNT_MAX;
use crate::delay::{DecayDelay, DelayLine, delay_time_to_samples};
use crate::fixed_point::{Q14, to_float};
use crate::memory::CpuAddress;
use crate::one_pole::DecayFilter;
use crate::parameter::{ChannelLayout, ReverbEarlyMode, ReverbLateMode, ReverbParameter};

/// Early reflection taps.
pub(crate) const EARLY_TAP_COUNT: usize = 10;

/// Lines in the feedback delay network.
pub(crate) const FDN_LINE_COUNT: usize = 4;

/// Output routing of one channel layout.
pub(crate) struct Routing {
    /// Output channel of each early tap.
    pub early: [usize; EARLY_TAP_COUNT],
    /// `(output channel, FDN line)` pairs summed into the wet signal.
    pub late: &'static [(usize, usize)],
}

const MONO_ROUTING: Routing = Routing {
    early: [0; EARLY_TAP_COUNT],
    late: &[(0, 0), (0, 1), (0, 2), (0, 3)],
};

const STEREO_ROUTING: Routing = Routing {
    early: [0, 0, 1, 1, 0, 1, 0, 0, 1, 1],
    late: &[(0, 2), (0, 0), (1, 3), (1, 1)],
};

const QUAD_ROUTING: Routing = Routing {
    early: [0, 0, 1, 1, 0, 1, 2, 2, 3, 3],
    late: &[(0, 0), (1, 1), (2, 2), (3, 3)],
};

// [FL, FR, FC, LFE, RL, RR]: the centre takes the two middle taps, the LFE
// takes nothing.
const SURROUND_ROUTING: Routing = Routing {
    early: [0, 0, 1, 1, 2, 2, 4, 4, 5, 5],
    late: &[(0, 0), (1, 1), (4, 2), (5, 3)],
};

pub(crate) const fn routing(layout: ChannelLayout) -> &'static Routing {
    match layout {
        ChannelLayout::Mono => &MONO_ROUTING,
        ChannelLayout::Stereo => &STEREO_ROUTING,
        ChannelLayout::Quad => &QUAD_ROUTING,
        ChannelLayout::Surround => &SURROUND_ROUTING,
    }
}

/// Orthogonal mix of the four line outputs.
#[inline]
pub(crate) fn feedback_matrix(f: [f32; FDN_LINE_COUNT]) -> [f32; FDN_LINE_COUNT] {
    [f[2] + f[1], -f[0] - f[3], f[0] - f[3], f[1] - f[2]]
}

/// Scale that makes [`feedback_matrix`] energy preserving.
pub(crate) const MATRIX_NORMALIZATION: f32 = FRAC_1_SQRT_2;

const FDN_DELAY_TIMES: [[f32; FDN_LINE_COUNT]; 5] = [
    [53.953247, 79.192566, 116.238770, 130.615295],
    [53.953247, 79.192566, 116.238770, 170.615295],
    [5.0, 10.0, 5.0, 10.0],
    [47.03, 71.0, 103.0, 170.0],
    [53.953247, 79.192566, 116.238770, 170.615295],
];

const DECAY_DELAY_TIMES: [[f32; FDN_LINE_COUNT]; 5] = [
    [7.0, 9.0, 13.0, 17.0],
    [19.0, 23.0, 29.0, 31.0],
    [3.0, 5.0, 7.0, 11.0],
    [41.0, 43.0, 47.0, 53.0],
    [7.0, 9.0, 13.0, 17.0],
];

const EARLY_DELAY_TIMES: [[f32; EARLY_TAP_COUNT]; 5] = [
    [0.0, 3.5, 2.8, 3.9, 2.7, 13.4, 7.9, 8.4, 9.9, 12.0],
    [0.0, 11.8, 5.5, 11.2, 10.4, 38.1, 22.2, 29.6, 21.2, 24.8],
    [0.0, 41.5, 20.5, 41.3, 0.0, 29.5, 33.8, 45.2, 46.8, 0.0],
    [33.1, 43.3, 22.8, 37.9, 14.9, 35.3, 17.9, 34.2, 0.0, 43.3],
    [0.0; EARLY_TAP_COUNT],
];

const EARLY_GAIN_BASE: [[f32; EARLY_TAP_COUNT]; 5] = [
    [0.70, 0.68, 0.70, 0.68, 0.70, 0.68, 0.70, 0.68, 0.68, 0.68],
    [0.70, 0.68, 0.70, 0.68, 0.70, 0.68, 0.68, 0.68, 0.68, 0.68],
    [0.50, 0.70, 0.70, 0.68, 0.50, 0.68, 0.68, 0.70, 0.68, 0.00],
    [0.93, 0.92, 0.87, 0.86, 0.94, 0.81, 0.80, 0.77, 0.76, 0.65],
    [0.0; EARLY_TAP_COUNT],
];

const PRE_DELAY_TIMES: [f32; 5] = [12.5, 40.0, 50.0, 20.0, 0.0];

/// Longest user pre-delay (ms).
const PRE_DELAY_TIME_MAX: f32 = 300.0;
/// Pre-delay line capacity (ms): user pre-delay plus the longest table entry.
const PRE_DELAY_LINE_MAX: f32 = 350.0;
const FDN_DELAY_MAX: f32 = 200.0;
const DECAY_DELAY_MAX: f32 = 60.0;

const fn early_index(mode: ReverbEarlyMode) -> usize {
    match mode {
        ReverbEarlyMode::SmallRoom => 0,
        ReverbEarlyMode::LargeRoom => 1,
        ReverbEarlyMode::Hall => 2,
        ReverbEarlyMode::Cathedral => 3,
        ReverbEarlyMode::Disabled => 4,
    }
}

const fn late_index(mode: ReverbLateMode) -> usize {
    match mode {
        ReverbLateMode::Room => 0,
        ReverbLateMode::Hall => 1,
        ReverbLateMode::Plate => 2,
        ReverbLateMode::Cathedral => 3,
        ReverbLateMode::NoDelay => 4,
    }
}

/// Delay lines, filters and derived gains of one reverb effect.
#[derive(Debug, Clone, Default)]
pub struct ReverbState {
    layout: Option<ChannelLayout>,
    pre_delay_line: Option<DelayLine>,
    fdn_lines: Vec<DelayLine>,
    decay_delays: Vec<DecayDelay>,
    decay_filters: [DecayFilter; FDN_LINE_COUNT],
    early_delay_samples: [usize; EARLY_TAP_COUNT],
    early_gains: [f32; EARLY_TAP_COUNT],
    late_delay_samples: usize,
    late_gain: f32,
    reverb_gain: f32,
    out_gain: f32,
    dry_gain: f32,
    work_buffer: CpuAddress,
}

impl ReverbState {
    /// Fresh state with zeroed lines.
    pub fn new(parameter: &ReverbParameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self {
        let sample_rate = parameter.sample_rate;
        let mut state = Self {
            layout: Some(layout),
            pre_delay_line: Some(DelayLine::new(sample_rate, PRE_DELAY_LINE_MAX)),
            fdn_lines: (0..FDN_LINE_COUNT)
                .map(|_| DelayLine::new(sample_rate, FDN_DELAY_MAX))
                .collect(),
            decay_delays: (0..FDN_LINE_COUNT)
                .map(|_| DecayDelay::new(DelayLine::new(sample_rate, DECAY_DELAY_MAX)))
                .collect(),
            work_buffer,
            ..Self::default()
        };

        tracing::debug!(
            effect = "reverb",
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

    /// Recompute tap positions, gains and loop filters, keeping line contents.
    pub fn update_parameter(&mut self, parameter: &ReverbParameter, layout: ChannelLayout) {
        let q = |v: i32| to_float(i64::from(v), Q14);
        let sample_rate = parameter.sample_rate;
        let early = early_index(parameter.early_mode);
        let late = late_index(parameter.late_mode);

        self.layout = Some(layout);
        self.late_gain = q(parameter.late_gain);
        self.reverb_gain = q(parameter.reverb_gain);
        self.out_gain = q(parameter.out_gain);
        self.dry_gain = q(parameter.dry_gain);

        let capacity = self.pre_delay_line.as_ref().map_or(1, DelayLine::capacity);
        let pre_delay = q(parameter.pre_delay_time).clamp(0.0, PRE_DELAY_TIME_MAX);
        let early_gain = q(parameter.early_gain);
        for tap in 0..EARLY_TAP_COUNT {
            let samples = delay_time_to_samples(sample_rate, pre_delay + EARLY_DELAY_TIMES[early][tap]);
            self.early_delay_samples[tap] = samples.min(capacity - 1) + 1;
            self.early_gains[tap] = EARLY_GAIN_BASE[early][tap] * early_gain;
        }
        if layout == ChannelLayout::Stereo {
            self.early_gains[4] *= 0.5;
            self.early_gains[5] *= 0.5;
        }
        self.late_delay_samples =
            delay_time_to_samples(sample_rate, PRE_DELAY_TIMES[early] + pre_delay).clamp(1, capacity);

        let decay_time = q(parameter.decay_time);
        let hf_ratio = q(parameter.high_freq_decay_ratio);
        let coloration = q(parameter.coloration);
        for i in 0..FDN_LINE_COUNT {
            self.fdn_lines[i].set_delay(FDN_DELAY_TIMES[late][i]);
            self.decay_delays[i].set_delay(DECAY_DELAY_TIMES[late][i]);
            self.decay_delays[i].set_decay_rate(0.6 * (1.0 - coloration));

            let loop_samples = self.fdn_lines[i].delay() + self.decay_delays[i].delay();
            self.decay_filters[i].configure(loop_samples, decay_time, hf_ratio, sample_rate);
        }
    }

    /// Process one sample on every channel.
    pub fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        let (Some(layout), Some(pre_delay_line)) = (self.layout, self.pre_delay_line.as_mut()) else {
            unreachable!("reverb processed before initialization");
        };
        let channels = layout.channel_count();
        let routing = routing(layout);

        let mut wet = [0.0_f32; CHANNEL_COUNT_MAX];
        for tap in 0..EARLY_TAP_COUNT {
            wet[routing.early[tap]] += pre_delay_line.tap(self.early_delay_samples[tap]) * self.early_gains[tap];
        }
        let late_input = pre_delay_line.tap(self.late_delay_samples) * self.late_gain;

        let mono: f32 = input[..channels].iter().sum();
        pre_delay_line.update(mono * self.reverb_gain);

        let mut line_out = [0.0_f32; FDN_LINE_COUNT];
        for i in 0..FDN_LINE_COUNT {
            line_out[i] = self.decay_filters[i].process(self.fdn_lines[i].read());
        }
        let feedback = feedback_matrix(line_out);
        for i in 0..FDN_LINE_COUNT {
            let diffused = self.decay_delays[i].update(feedback[i] * MATRIX_NORMALIZATION + late_input);
            self.fdn_lines[i].update(diffused);
        }
        for &(channel, line) in routing.late {
            wet[channel] += line_out[line];
        }

        for ch in 0..channels {
            output[ch] = wet[ch] * self.out_gain + input[ch] * self.dry_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(channels: u16) -> ReverbParameter {
        ReverbParameter {
            channel_count: channels,
            channel_count_max: channels,
            ..ReverbParameter::default()
        }
    }

    #[test]
    fn test_feedback_matrix() {
        assert_eq!(feedback_matrix([1.0, 2.0, 3.0, 4.0]), [5.0, -5.0, -3.0, -1.0]);
    }

    #[test]
    fn test_normalized_matrix_preserves_energy() {
        let f = [0.3, -1.2, 0.7, 2.0];
        let fb = feedback_matrix(f);
        let e_in: f32 = f.iter().map(|x| x * x).sum();
        let e_out: f32 = fb.iter().map(|x| (x * MATRIX_NORMALIZATION).powi(2)).sum();
        assert!((e_in - e_out).abs() < 1e-5);
    }

    #[test]
    fn test_routing_tables_stay_in_layout() {
        for layout in [ChannelLayout::Mono, ChannelLayout::Stereo, ChannelLayout::Quad, ChannelLayout::Surround] {
            let r = routing(layout);
            assert!(r.early.iter().all(|&ch| ch < layout.channel_count()));
            assert!(r.late.iter().all(|&(ch, line)| ch < layout.channel_count() && line < FDN_LINE_COUNT));
        }
    }

    #[test]
    fn test_dry_only_passes_input() {
        let p = ReverbParameter {
            out_gain: 0,
            ..parameter(2)
        };
        let mut state = ReverbState::new(&p, ChannelLayout::Stereo, 0);
        let mut out = [0.0; 2];
        for n in 0..500 {
            let x = [n as f32, -(n as f32)];
            state.process_frame(&x, &mut out);
            assert_eq!(out, x);
        }
    }

    #[test]
    fn test_impulse_produces_decaying_tail() {
        let p = parameter(1);
        let mut state = ReverbState::new(&p, ChannelLayout::Mono, 0);
        let mut out = [0.0];
        let mut early_energy = 0.0;
        let mut late_energy = 0.0;
        for n in 0..96_000 {
            state.process_frame(&[if n == 0 { 1000.0 } else { 0.0 }], &mut out);
            if n > 0 && n < 24_000 {
                early_energy += out[0] * out[0];
            } else if n >= 72_000 {
                late_energy += out[0] * out[0];
            }
        }
        assert!(early_energy > 0.0);
        assert!(late_energy < early_energy * 1e-3, "tail did not decay: {late_energy} vs {early_energy}");
    }

    #[test]
    fn test_stereo_halves_middle_taps() {
        let p = parameter(2);
        let stereo = ReverbState::new(&p, ChannelLayout::Stereo, 0);
        let quad = ReverbState::new(&parameter(4), ChannelLayout::Quad, 0);
        assert_eq!(stereo.early_gains[4] * 2.0, quad.early_gains[4]);
        assert_eq!(stereo.early_gains[0], quad.early_gains[0]);
    }
}
