//! Mixer-rate to target-rate conversion ahead of the sinks.

use audren_core::{
    CHANNEL_COUNT_MAX, Command, CommandContext, CommandError, CommandHeader, CommandKind, NodeId,
    ProcessingTimeEstimator, StateHandle, UpsamplerState,
};

/// Converts up to six mix buffers into an [`UpsamplerState`]'s own output buffers.
#[derive(Debug, Clone)]
pub struct UpsampleCommand {
    header: CommandHeader,
    state: StateHandle<UpsamplerState>,
    inputs: Vec<usize>,
    source_sample_rate: u32,
}

impl UpsampleCommand {
    /// Upsample `inputs` (arena indices) from `source_sample_rate`.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnsupportedChannelCount`] for more than six inputs.
    pub fn new(
        node_id: NodeId,
        state: StateHandle<UpsamplerState>,
        inputs: &[usize],
        source_sample_rate: u32,
    ) -> Result<Self, CommandError> {
        if inputs.len() > CHANNEL_COUNT_MAX {
            return Err(CommandError::UnsupportedChannelCount {
                effect: "upsample",
                channel_count: inputs.len(),
            });
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            state,
            inputs: inputs.to_vec(),
            source_sample_rate,
        })
    }
}

impl Command for UpsampleCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Upsample
    }

    fn max_buffer_index(&self) -> Option<usize> {
        self.inputs.iter().copied().max()
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.upsample()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let state = &mut context.states.upsamplers[self.state];
        let channels = state.channel_count().min(self.inputs.len());
        for (channel, &buffer) in self.inputs.iter().enumerate().take(channels) {
            state.process_channel(channel, context.arena.get_const(buffer), self.source_sample_rate);
        }
    }
}
