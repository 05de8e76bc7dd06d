//! Reverb command: early reflections into a four-line feedback delay network.

use audren_core::{
    Command, CommandContext, CommandError, CommandHeader, CommandKind, CpuAddress, NodeId, ProcessingTimeEstimator,
    ReverbParameter, ReverbState, StateHandle,
};

use crate::effect::EffectIo;

/// Runs a [`ReverbState`] over up to six buffer pairs.
#[derive(Debug, Clone)]
pub struct ReverbCommand {
    header: CommandHeader,
    io: EffectIo,
    parameter: ReverbParameter,
    state: StateHandle<ReverbState>,
    effect_enabled: bool,
    work_buffer: CpuAddress,
}

impl ReverbCommand {
    /// Reverb over the buffers named by `parameter`, relative to `buffer_offset`.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::bounded`] errors.
    pub fn new(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: ReverbParameter,
        state: StateHandle<ReverbState>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        let io = EffectIo::bounded(
            "reverb",
            buffer_offset,
            &parameter.input,
            &parameter.output,
            usize::from(parameter.channel_count),
            usize::from(parameter.channel_count_max),
        )?;
        Ok(Self {
            header: CommandHeader::new(node_id),
            io,
            parameter,
            state,
            effect_enabled,
            work_buffer,
        })
    }
}

impl Command for ReverbCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Reverb
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.io.max_buffer_index())
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.reverb(self.io.layout(), self.effect_enabled)
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        if !self.effect_enabled {
            self.io.pass_through(context.arena);
            return;
        }

        let state = &mut context.states.reverbs[self.state];
        self.io.prepare(state, &self.parameter, self.parameter.status, self.work_buffer);
        self.io
            .process_frames(context.arena, context.sample_count, |input, output| state.process_frame(input, output));
    }
}
