//! Feedback delay command.

use audren_core::{
    Command, CommandContext, CommandError, CommandHeader, CommandKind, CpuAddress, DelayParameter, DelayState,
    NodeId, ProcessingTimeEstimator, StateHandle,
};

use crate::effect::EffectIo;

/// Runs a [`DelayState`] over up to six buffer pairs.
#[derive(Debug, Clone)]
pub struct DelayCommand {
    header: CommandHeader,
    io: EffectIo,
    parameter: DelayParameter,
    state: StateHandle<DelayState>,
    effect_enabled: bool,
    work_buffer: CpuAddress,
}

impl DelayCommand {
    /// Delay over the buffers named by `parameter`, relative to `buffer_offset`.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::bounded`] errors.
    pub fn new(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: DelayParameter,
        state: StateHandle<DelayState>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        let io = EffectIo::bounded(
            "delay",
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

impl Command for DelayCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::Delay
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.io.max_buffer_index())
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.delay(self.io.layout(), self.effect_enabled)
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        if !self.effect_enabled {
            self.io.pass_through(context.arena);
            return;
        }

        let state = &mut context.states.delays[self.state];
        self.io.prepare(state, &self.parameter, self.parameter.status, self.work_buffer);
        self.io
            .process_frames(context.arena, context.sample_count, |input, output| state.process_frame(input, output));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use audren_core::UsageState;

    fn parameter() -> DelayParameter {
        DelayParameter {
            output: [1, 0, 2, 3, 4, 5],
            delay_time: 1,
            delay_time_max: 10,
            feedback_gain: 0,
            dry_gain: 0,
            ..DelayParameter::default()
        }
    }

    #[test]
    fn test_impulse_comes_out_one_millisecond_later() {
        let mut harness = Harness::new(2, 60);
        let state = harness.states.insert(DelayState::default());
        harness.arena.set_sample(0, 0, 1000.0);

        let mut command = DelayCommand::new(0, 0, parameter(), state, true, 0x100).unwrap();
        harness.run(&mut command);

        let output = harness.arena.get_const(1);
        assert!((output[48] - 1000.0).abs() < 1e-2);
        assert!(output[..48].iter().all(|&x| x.abs() < 1e-3));
        assert_eq!(harness.states.delays[state].work_buffer(), 0x100);
    }

    #[test]
    fn test_state_survives_frames() {
        let mut harness = Harness::new(2, 40);
        let state = harness.states.insert(DelayState::default());
        harness.arena.set_sample(0, 0, 1000.0);
        let mut command = DelayCommand::new(0, 0, parameter(), state, true, 0).unwrap();
        harness.run(&mut command);

        let next = DelayParameter {
            status: UsageState::Unchanged,
            ..parameter()
        };
        let mut command = DelayCommand::new(0, 0, next, state, true, 0).unwrap();
        harness.arena.clear(0);
        harness.run(&mut command);
        assert!((harness.arena.sample(1, 8) - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_disabled_is_pass_through() {
        let mut harness = Harness::new(2, 4);
        let state = harness.states.insert(DelayState::default());
        harness.arena.get(0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let mut command = DelayCommand::new(0, 0, parameter(), state, false, 0).unwrap();
        harness.run(&mut command);
        assert_eq!(harness.arena.get_const(1), &[1.0, 2.0, 3.0, 4.0]);
        assert!(!harness.states.delays[state].is_configured());
    }

    #[test]
    fn test_estimate_tracks_enabled_flag() {
        let estimator = ProcessingTimeEstimator::new(240, 24);
        let on = DelayCommand::new(0, 0, parameter(), StateHandle::from_index(0), true, 0).unwrap();
        let off = DelayCommand::new(0, 0, parameter(), StateHandle::from_index(0), false, 0).unwrap();
        assert!(on.estimate(&estimator) > off.estimate(&estimator));
    }
}
