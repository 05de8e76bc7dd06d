//! Look-ahead limiter commands.
//!
//! Version 2 adds a per-channel statistics block (peak input, deepest gain
//! reduction) that the server reads back, plus a reset trigger in the
//! parameter block.

use audren_core::{
    Command, CommandContext, CommandError, CommandHeader, CommandKind, CpuAddress, LimiterParameter, LimiterState,
    LimiterStatistics, NodeId, ProcessingTimeEstimator, StateHandle, StateStore,
};

use crate::effect::EffectIo;

/// Limiter command generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimiterVersion {
    /// No statistics.
    Version1,
    /// Optional statistics block.
    Version2,
}

/// Runs a [`LimiterState`] over up to six buffer pairs.
#[derive(Debug, Clone)]
pub struct LimiterCommand {
    header: CommandHeader,
    version: LimiterVersion,
    io: EffectIo,
    parameter: LimiterParameter,
    state: StateHandle<LimiterState>,
    statistics: Option<StateHandle<LimiterStatistics>>,
    effect_enabled: bool,
    work_buffer: CpuAddress,
}

impl LimiterCommand {
    /// Version 1 limiter.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::bounded`] errors.
    pub fn version1(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: LimiterParameter,
        state: StateHandle<LimiterState>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        Self::build(
            LimiterVersion::Version1,
            node_id,
            buffer_offset,
            parameter,
            state,
            None,
            effect_enabled,
            work_buffer,
        )
    }

    /// Version 2 limiter, recording into `statistics` when the parameter enables it.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::bounded`] errors.
    pub fn version2(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: LimiterParameter,
        state: StateHandle<LimiterState>,
        statistics: Option<StateHandle<LimiterStatistics>>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        Self::build(
            LimiterVersion::Version2,
            node_id,
            buffer_offset,
            parameter,
            state,
            statistics,
            effect_enabled,
            work_buffer,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        version: LimiterVersion,
        node_id: NodeId,
        buffer_offset: usize,
        parameter: LimiterParameter,
        state: StateHandle<LimiterState>,
        statistics: Option<StateHandle<LimiterStatistics>>,
        effect_enabled: bool,
        work_buffer: CpuAddress,
    ) -> Result<Self, CommandError> {
        let io = EffectIo::bounded(
            "limiter",
            buffer_offset,
            &parameter.input,
            &parameter.output,
            usize::from(parameter.channel_count),
            usize::from(parameter.channel_count_max),
        )?;
        Ok(Self {
            header: CommandHeader::new(node_id),
            version,
            io,
            parameter,
            state,
            statistics,
            effect_enabled,
            work_buffer,
        })
    }

    /// Command generation.
    pub fn version(&self) -> LimiterVersion {
        self.version
    }

    fn statistics_handle(&self) -> Option<StateHandle<LimiterStatistics>> {
        match self.version {
            LimiterVersion::Version1 => None,
            LimiterVersion::Version2 => self.statistics,
        }
    }
}

impl Command for LimiterCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        match self.version {
            LimiterVersion::Version1 => CommandKind::LimiterVersion1,
            LimiterVersion::Version2 => CommandKind::LimiterVersion2,
        }
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.io.max_buffer_index())
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        match self.version {
            LimiterVersion::Version1 => estimator.limiter(self.io.layout(), self.effect_enabled),
            LimiterVersion::Version2 => estimator.limiter_with_statistics(
                self.io.layout(),
                self.effect_enabled,
                self.parameter.statistics_enabled && self.statistics.is_some(),
            ),
        }
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        if !self.effect_enabled {
            self.io.pass_through(context.arena);
            return;
        }

        let StateStore {
            limiters,
            limiter_statistics,
            ..
        } = &mut *context.states;
        let state = &mut limiters[self.state];
        self.io.prepare(state, &self.parameter, self.parameter.status, self.work_buffer);

        let mut statistics = self.statistics_handle().map(|handle| &mut limiter_statistics[handle]);
        if self.parameter.statistics_reset
            && let Some(statistics) = statistics.as_deref_mut()
        {
            statistics.reset();
        }
        if !self.parameter.statistics_enabled {
            statistics = None;
        }

        self.io.process_frames(context.arena, context.sample_count, |input, output| {
            for (channel, (out, &sample)) in output.iter_mut().zip(input).enumerate() {
                let limited = state.process_sample(channel, sample);
                *out = limited.output;
                if let Some(statistics) = statistics.as_deref_mut() {
                    statistics.record(channel, limited.input_magnitude, limited.compression_gain);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    fn stereo() -> LimiterParameter {
        LimiterParameter {
            channel_count: 2,
            channel_count_max: 2,
            output: [2, 3, 0, 0, 0, 0],
            delay_buffer_sample_count_min: 1,
            delay_buffer_sample_count_max: 4,
            attack_coefficient: 1.0,
            release_coefficient: 1.0,
            threshold: 0.25,
            statistics_enabled: true,
            ..LimiterParameter::default()
        }
    }

    #[test]
    fn test_loud_signal_is_limited_and_recorded() {
        let mut harness = Harness::new(4, 8);
        let state = harness.states.insert(LimiterState::default());
        let statistics = harness.states.insert(LimiterStatistics::default());
        harness.arena.get(0).fill(32767.0);
        harness.arena.get(1).fill(1000.0);

        let mut command = LimiterCommand::version2(0, 0, stereo(), state, Some(statistics), true, 0).unwrap();
        harness.run(&mut command);

        // Full-scale input settles at the threshold.
        assert!((harness.arena.sample(2, 7) - 0.25 * 32767.0).abs() < 1.0);
        assert!((harness.arena.sample(3, 7) - 1000.0).abs() < 1e-1);

        let recorded = harness.states.limiter_statistics[statistics];
        assert!((recorded.input_max[0] - 1.0).abs() < 1e-6);
        assert!((recorded.compression_gain_min[0] - 0.25).abs() < 1e-6);
        assert_eq!(recorded.compression_gain_min[1], 1.0);
    }

    #[test]
    fn test_statistics_reset_before_processing() {
        let mut harness = Harness::new(4, 4);
        let state = harness.states.insert(LimiterState::default());
        let statistics = harness.states.insert(LimiterStatistics::default());
        harness.states.limiter_statistics[statistics].input_max = [9.0; 6];

        let parameter = LimiterParameter {
            statistics_reset: true,
            ..stereo()
        };
        let mut command = LimiterCommand::version2(0, 0, parameter, state, Some(statistics), true, 0).unwrap();
        harness.run(&mut command);
        assert_eq!(harness.states.limiter_statistics[statistics].input_max, [0.0; 6]);
    }

    #[test]
    fn test_version1_ignores_statistics() {
        let mut harness = Harness::new(4, 4);
        let state = harness.states.insert(LimiterState::default());
        harness.arena.get(0).fill(32767.0);
        let mut command = LimiterCommand::version1(0, 0, stereo(), state, true, 0).unwrap();
        assert_eq!(command.kind(), CommandKind::LimiterVersion1);
        harness.run(&mut command);
        assert!(harness.arena.sample(2, 3) < 32767.0);
    }

    #[test]
    fn test_disabled_copies() {
        let mut harness = Harness::new(4, 2);
        let state = harness.states.insert(LimiterState::default());
        harness.arena.get(0).fill(5.0);
        let mut command = LimiterCommand::version2(0, 0, stereo(), state, None, false, 0).unwrap();
        harness.run(&mut command);
        assert_eq!(harness.arena.get_const(2), &[5.0, 5.0]);
        assert!(!harness.states.limiters[state].is_configured());
    }
}
