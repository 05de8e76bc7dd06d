//! Gain stages that overwrite their output.

use audren_core::{
    Command, CommandContext, CommandHeader, CommandKind, NodeId, ProcessingTimeEstimator, kernels, multiply_round_up,
};

/// `output[i] = round_up(input[i] * volume)`.
#[derive(Debug, Clone)]
pub struct VolumeCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    volume: f32,
}

impl VolumeCommand {
    /// Constant gain from `input` to `output` (the same index applies it in place).
    pub fn new(node_id: NodeId, input: usize, output: usize, volume: f32) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            volume,
        }
    }
}

impl Command for VolumeCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Volume
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.volume()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let (input, output) = context.arena.input_output(self.input, self.output);
        kernels::apply_volume(output, input, self.volume);
    }
}

/// In-place gain ramped linearly from `volume0` to `volume1` over the frame.
#[derive(Debug, Clone)]
pub struct VolumeRampCommand {
    header: CommandHeader,
    buffer: usize,
    volume0: f32,
    volume1: f32,
}

impl VolumeRampCommand {
    /// Ramp applied to `buffer`.
    pub fn new(node_id: NodeId, buffer: usize, volume0: f32, volume1: f32) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            buffer,
            volume0,
            volume1,
        }
    }
}

impl Command for VolumeRampCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::VolumeRamp
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.buffer)
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.volume_ramp()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let ramp = (self.volume1 - self.volume0) / context.sample_count as f32;
        let mut volume = self.volume0;
        for sample in context.arena.get(self.buffer) {
            *sample = multiply_round_up(*sample, volume);
            volume += ramp;
        }
    }
}
