//! Upsampler state and its dedicated output buffers.
//!
//! Conversion is linear interpolation on an exact rational phase, so a
//! 32 kHz block of 160 samples always yields exactly 240 target samples and
//! the next block picks up where this one stopped.

use crate::constants::TARGET_SAMPLE_RATE;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChannelHistory {
    last: f32,
    phase: u64,
}

/// Converts `channel_count` arena buffers to the target rate.
///
/// Output lives here rather than in the mix arena; sinks read it through
/// [`UpsamplerState::output`].
#[derive(Debug, Clone, Default)]
pub struct UpsamplerState {
    output: Vec<f32>,
    output_sample_count: usize,
    channels: Vec<ChannelHistory>,
}

impl UpsamplerState {
    /// State for `channel_count` buffers of `output_sample_count` samples each.
    pub fn new(channel_count: usize, output_sample_count: usize) -> Self {
        Self {
            output: vec![0.0; channel_count * output_sample_count],
            output_sample_count,
            channels: vec![ChannelHistory::default(); channel_count],
        }
    }

    /// Channels this upsampler converts.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per output buffer.
    pub fn output_sample_count(&self) -> usize {
        self.output_sample_count
    }

    /// Output buffer of `channel`.
    pub fn output(&self, channel: usize) -> &[f32] {
        let start = channel * self.output_sample_count;
        &self.output[start..start + self.output_sample_count]
    }

    /// Resample one channel's input block from `source_rate` to the target rate.
    pub fn process_channel(&mut self, channel: usize, input: &[f32], source_rate: u32) {
        let step = u64::from(source_rate);
        let period = u64::from(TARGET_SAMPLE_RATE);
        let history = &mut self.channels[channel];

        // Position 0 is the previous block's last sample, position k is input[k - 1].
        let at = |position: usize| -> f32 {
            match position {
                0 => history.last,
                k => input
                    .get(k - 1)
                    .or(input.last())
                    .copied()
                    .unwrap_or(history.last),
            }
        };

        let start = channel * self.output_sample_count;
        let output = &mut self.output[start..start + self.output_sample_count];
        let mut position = 0_usize;
        let mut phase = history.phase;
        for out in output.iter_mut() {
            let a = at(position);
            let b = at(position + 1);
            *out = a + (b - a) * (phase as f32 / period as f32);

            phase += step;
            position += (phase / period) as usize;
            phase %= period;
        }

        let last = at(position);
        history.last = last;
        history.phase = phase;
    }
}
