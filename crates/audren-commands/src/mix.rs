//! Accumulating gain stages.
//!
//! All three commands add `round_up(input * volume)` into their output. The
//! ramped variants step the volume linearly by `(volume1 - volume0) /
//! sample_count` per sample and record the last contribution in the voice
//! state, where depop preparation picks it up once the voice stops.

use audren_core::{
    Command, CommandContext, CommandError, CommandHeader, CommandKind, MIX_BUFFER_COUNT_MAX, NodeId,
    ProcessingTimeEstimator, StateHandle, VoiceUpdateState, kernels, multiply_round_up,
};

/// Accumulate a linearly ramped gain and return the last contribution.
pub(crate) fn mix_ramp(output: &mut [f32], input: &[f32], volume0: f32, volume1: f32) -> f32 {
    let ramp = (volume1 - volume0) / output.len() as f32;
    let mut volume = volume0;
    let mut last = 0.0;
    for (out, &sample) in output.iter_mut().zip(input) {
        last = multiply_round_up(sample, volume);
        *out += last;
        volume += ramp;
    }
    last
}

/// `output[i] += round_up(input[i] * volume)`.
#[derive(Debug, Clone)]
pub struct MixCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    volume: f32,
}

impl MixCommand {
    /// Constant-volume mix of `input` into `output`.
    pub fn new(node_id: NodeId, input: usize, output: usize, volume: f32) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            volume,
        }
    }
}

impl Command for MixCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Mix
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.mix()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let (input, output) = context.arena.input_output(self.input, self.output);
        kernels::mix(output, input, self.volume);
    }
}

/// Ramped mix of one voice channel into one mix buffer.
#[derive(Debug, Clone)]
pub struct MixRampCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    volume0: f32,
    volume1: f32,
    last_sample_index: usize,
    voice: StateHandle<VoiceUpdateState>,
}

impl MixRampCommand {
    /// Ramp from `volume0` to `volume1`, recording the last sample in slot `last_sample_index`.
    pub fn new(
        node_id: NodeId,
        input: usize,
        output: usize,
        volume0: f32,
        volume1: f32,
        last_sample_index: usize,
        voice: StateHandle<VoiceUpdateState>,
    ) -> Result<Self, CommandError> {
        if last_sample_index >= MIX_BUFFER_COUNT_MAX {
            return Err(CommandError::BufferIndexOutOfRange {
                index: last_sample_index,
                buffer_count: MIX_BUFFER_COUNT_MAX,
            });
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            volume0,
            volume1,
            last_sample_index,
            voice,
        })
    }
}

impl Command for MixRampCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::MixRamp
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.mix_ramp()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let (input, output) = context.arena.input_output(self.input, self.output);
        let last = mix_ramp(output, input, self.volume0, self.volume1);
        context.states.voices[self.voice].last_samples[self.last_sample_index] = last;
    }
}

/// One voice channel ramped into `volume0.len()` consecutive mix buffers.
///
/// Buffers whose ramp is silent at both ends are skipped and their last-sample
/// slot is zeroed.
#[derive(Debug, Clone)]
pub struct MixRampGroupedCommand {
    header: CommandHeader,
    input: usize,
    output_base: usize,
    volume0: Vec<f32>,
    volume1: Vec<f32>,
    voice: StateHandle<VoiceUpdateState>,
}

impl MixRampGroupedCommand {
    /// Mix `input` into `output_base..output_base + volume0.len()`.
    pub fn new(
        node_id: NodeId,
        input: usize,
        output_base: usize,
        volume0: &[f32],
        volume1: &[f32],
        voice: StateHandle<VoiceUpdateState>,
    ) -> Result<Self, CommandError> {
        let count = volume0.len().min(volume1.len());
        if count > MIX_BUFFER_COUNT_MAX {
            return Err(CommandError::BufferIndexOutOfRange {
                index: count - 1,
                buffer_count: MIX_BUFFER_COUNT_MAX,
            });
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            input,
            output_base,
            volume0: volume0[..count].to_vec(),
            volume1: volume1[..count].to_vec(),
            voice,
        })
    }

    fn active_count(&self) -> usize {
        self.volume0
            .iter()
            .zip(&self.volume1)
            .filter(|&(&v0, &v1)| v0 != 0.0 || v1 != 0.0)
            .count()
    }
}

impl Command for MixRampGroupedCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::MixRampGrouped
    }

    fn max_buffer_index(&self) -> Option<usize> {
        let last_output = self.output_base + self.volume0.len().saturating_sub(1);
        Some(self.input.max(last_output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.mix_ramp_grouped(self.active_count())
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let voice = &mut context.states.voices[self.voice];
        for (i, (&v0, &v1)) in self.volume0.iter().zip(&self.volume1).enumerate() {
            if v0 == 0.0 && v1 == 0.0 {
                voice.last_samples[i] = 0.0;
                continue;
            }
            let (input, output) = context.arena.input_output(self.input, self.output_base + i);
            voice.last_samples[i] = mix_ramp(output, input, v0, v1);
        }
    }
}
