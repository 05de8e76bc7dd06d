//! 3D reverb command.
//!
//! Same routing as the plain reverb; the six-channel layout additionally
//! feeds the front-center output from its own delay line.

use audren_core::{
    Command, CommandContext, CommandError, CommandHeader, CommandKind, CpuAddress, NodeId, ProcessingTimeEstimator,
    Reverb3dParameter, Reverb3dState, StateHandle,
};

use crate::effect::EffectIo;

/// Runs a [`Reverb3dState`] over up to six buffer pairs.
#[derive(Debug, Clone)]
pub struct Reverb3dCommand {
    header: CommandHeader,
    io: EffectIo,
    parameter: Reverb3dParameter,
    state: StateHandle<Reverb3dState>,
    effect_enabled: bool,
    work_buffer: CpuAddress,
}

impl Reverb3dCommand {
    /// 3D reverb over the buffers named by `parameter`, relative to `buffer_offset`.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::bounded`] errors.
    pub fn new(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: Reverb3dParameter,
        state: StateHandle<Reverb3dState>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        let io = EffectIo::bounded(
            "reverb3d",
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

impl Command for Reverb3dCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Reverb3d
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.io.max_buffer_index())
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.reverb3d(self.io.layout(), self.effect_enabled)
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        if !self.effect_enabled {
            self.io.pass_through(context.arena);
            return;
        }

        let state = &mut context.states.reverb3ds[self.state];
        self.io.prepare(state, &self.parameter, self.parameter.status, self.work_buffer);
        self.io
            .process_frames(context.arena, context.sample_count, |input, output| state.process_frame(input, output));
    }
}
