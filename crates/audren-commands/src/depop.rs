//! Click suppression for voices that stop mid-waveform.
//!
//! When a voice stops, the last sample it mixed into each buffer is moved
//! into the depop accumulator ([`DepopPrepareCommand`]). Every frame after
//! that, [`DepopForMixBuffersCommand`] feeds a geometrically decaying copy of
//! the accumulator back into the live mix buffers until it reaches zero.

use audren_core::{
    Command, CommandContext, CommandHeader, CommandKind, NodeId, ProcessingTimeEstimator, StateHandle,
    TARGET_SAMPLE_RATE, VoiceUpdateState, fixed_point, multiply_round_down,
};

const DECAY_48K_Q15: i64 = 0x7B29;
const DECAY_32K_Q15: i64 = 0x78CB;

/// Per-sample decay factor of the depop accumulator at `sample_rate`.
///
/// ```rust
/// use audren_commands::depop_decay;
///
/// assert!(depop_decay(32_000) < depop_decay(48_000));
/// assert!(depop_decay(48_000) < 1.0);
/// ```
pub fn depop_decay(sample_rate: u32) -> f32 {
    if sample_rate == TARGET_SAMPLE_RATE {
        fixed_point::to_float(DECAY_48K_Q15, fixed_point::Q15)
    } else {
        fixed_point::to_float(DECAY_32K_Q15, fixed_point::Q15)
    }
}

/// Moves a voice's last mixed samples into the depop accumulator.
///
/// Emitted for every voice; the server disables it when the voice was not
/// playing last frame.
#[derive(Debug, Clone)]
pub struct DepopPrepareCommand {
    header: CommandHeader,
    voice: StateHandle<VoiceUpdateState>,
    buffer_offset: usize,
    buffer_count: usize,
}

impl DepopPrepareCommand {
    /// Prepare slots `0..buffer_count` of `voice` into accumulator entries starting at `buffer_offset`.
    pub fn new(
        node_id: NodeId,
        voice: StateHandle<VoiceUpdateState>,
        buffer_offset: usize,
        buffer_count: usize,
        was_playing: bool,
    ) -> Self {
        let mut header = CommandHeader::new(node_id);
        header.enabled = was_playing;
        Self {
            header,
            voice,
            buffer_offset,
            buffer_count,
        }
    }
}

impl Command for DepopPrepareCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::DepopPrepare
    }

    fn estimate(&self, _estimator: &ProcessingTimeEstimator) -> u32 {
        0
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let voice = &mut context.states.voices[self.voice];
        let depop = &mut context.states.depop;

        for (i, last) in voice.last_samples.iter_mut().take(self.buffer_count).enumerate() {
            if *last != 0.0 {
                if let Some(slot) = depop.get_mut(self.buffer_offset + i) {
                    *slot += *last;
                }
                *last = 0.0;
            }
        }
    }
}

/// Feeds the decaying depop accumulator back into the mix buffers.
#[derive(Debug, Clone)]
pub struct DepopForMixBuffersCommand {
    header: CommandHeader,
    buffer_offset: usize,
    buffer_count: usize,
    decay: f32,
}

impl DepopForMixBuffersCommand {
    /// Apply accumulator entries `buffer_offset..buffer_offset + buffer_count` at `sample_rate`.
    pub fn new(node_id: NodeId, buffer_offset: usize, buffer_count: usize, sample_rate: u32) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            buffer_offset,
            buffer_count,
            decay: depop_decay(sample_rate),
        }
    }

    /// Decay factor applied per sample.
    pub fn decay(&self) -> f32 {
        self.decay
    }
}

/// Decay `value` once per sample, adding each step into `buffer`; returns what is left.
fn apply_depop(buffer: &mut [f32], mut value: f32, decay: f32) -> f32 {
    for sample in buffer.iter_mut() {
        value = multiply_round_down(decay, value);
        if value == 0.0 {
            break;
        }
        *sample += value;
    }
    value
}

impl Command for DepopForMixBuffersCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::DepopForMixBuffers
    }

    fn max_buffer_index(&self) -> Option<usize> {
        (self.buffer_count > 0).then(|| self.buffer_offset + self.buffer_count - 1)
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.depop_for_mix_buffers()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let end = (self.buffer_offset + self.buffer_count).min(context.states.depop.len());
        for index in self.buffer_offset..end {
            let value = context.states.depop[index];
            if value != 0.0 {
                context.states.depop[index] = apply_depop(context.arena.get(index), value, self.decay);
            }
        }
    }
}
