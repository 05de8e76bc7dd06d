//! Biquad filtering commands.
//!
//! Filter history lives in the state store so it carries across frames. A
//! stage flagged as needing initialization starts from zeroed history this
//! frame, whatever the slot held before.

use audren_core::{
    BiquadFilterParameter, BiquadFilterState, Command, CommandContext, CommandError, CommandHeader, CommandKind,
    MIX_BUFFER_COUNT_MAX, NodeId, ProcessingTimeEstimator, StateHandle, VOICE_BIQUAD_FILTER_COUNT, VoiceUpdateState,
    kernels, process_biquad_filter, process_biquad_filter_in_place,
};

use crate::mix::mix_ramp;

/// One biquad stage with its history slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadStage {
    /// Coefficients.
    pub parameter: BiquadFilterParameter,
    /// History slot.
    pub state: StateHandle<BiquadFilterState>,
    /// Zero the history before filtering.
    pub needs_initialization: bool,
}

/// Single biquad from `input` to `output`.
#[derive(Debug, Clone)]
pub struct BiquadFilterCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    stage: BiquadStage,
}

impl BiquadFilterCommand {
    /// Filter `input` into `output` through `stage`.
    pub fn new(node_id: NodeId, input: usize, output: usize, stage: BiquadStage) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            stage,
        }
    }
}

impl Command for BiquadFilterCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::BiquadFilter
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.biquad_filter()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let state = &mut context.states.biquads[self.stage.state];
        if self.stage.needs_initialization {
            state.clear();
        }
        let (input, output) = context.arena.input_output(self.input, self.output);
        process_biquad_filter(&self.stage.parameter, state, output, input);
    }
}

/// Cascade of up to [`VOICE_BIQUAD_FILTER_COUNT`] stages over one buffer pair.
///
/// Disabled stages are skipped; when every stage is disabled the input is
/// copied.
#[derive(Debug, Clone)]
pub struct MultiTapBiquadFilterCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    stages: Vec<BiquadStage>,
}

impl MultiTapBiquadFilterCommand {
    /// Cascade `stages` in order.
    pub fn new(node_id: NodeId, input: usize, output: usize, stages: &[BiquadStage]) -> Result<Self, CommandError> {
        if stages.len() > VOICE_BIQUAD_FILTER_COUNT {
            return Err(CommandError::TooManyBiquadStages(stages.len()));
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            stages: stages.to_vec(),
        })
    }
}

impl Command for MultiTapBiquadFilterCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::MultiTapBiquadFilter
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, _estimator: &ProcessingTimeEstimator) -> u32 {
        0
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        context.arena.copy(self.input, self.output);
        let output = context.arena.get(self.output);
        for stage in self.stages.iter().filter(|stage| stage.parameter.enable) {
            let state = &mut context.states.biquads[stage.state];
            if stage.needs_initialization {
                state.clear();
            }
            process_biquad_filter_in_place(&stage.parameter, state, output);
        }
    }
}

/// Gain applied after filtering: constant or ramped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixVolume {
    /// Constant volume.
    Constant(f32),
    /// Linear ramp; the last contribution goes to the voice's last-sample slot.
    Ramp {
        /// Volume at the first sample.
        from: f32,
        /// Volume the ramp heads toward.
        to: f32,
        /// Last-sample slot.
        last_sample_index: usize,
    },
}

/// A voice's biquad fused with its mix into one mix buffer.
///
/// A voice mixing into several buffers runs the same filter once per buffer.
/// The first buffer saves the pre-frame history into `previous`; later
/// buffers restore from it so each sees identical filter output.
#[derive(Debug, Clone)]
pub struct BiquadFilterAndMixCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
    stage: BiquadStage,
    previous: StateHandle<BiquadFilterState>,
    is_first_mix_buffer: bool,
    volume: MixVolume,
    voice: StateHandle<VoiceUpdateState>,
}

impl BiquadFilterAndMixCommand {
    /// Filter `input` through `stage` and mix into `output` with `volume`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: NodeId,
        input: usize,
        output: usize,
        stage: BiquadStage,
        previous: StateHandle<BiquadFilterState>,
        is_first_mix_buffer: bool,
        volume: MixVolume,
        voice: StateHandle<VoiceUpdateState>,
    ) -> Result<Self, CommandError> {
        if let MixVolume::Ramp { last_sample_index, .. } = volume
            && last_sample_index >= MIX_BUFFER_COUNT_MAX
        {
            return Err(CommandError::BufferIndexOutOfRange {
                index: last_sample_index,
                buffer_count: MIX_BUFFER_COUNT_MAX,
            });
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            input,
            output,
            stage,
            previous,
            is_first_mix_buffer,
            volume,
            voice,
        })
    }
}

impl Command for BiquadFilterAndMixCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::BiquadFilterAndMix
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, _estimator: &ProcessingTimeEstimator) -> u32 {
        0
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let biquads = &mut context.states.biquads;
        if self.stage.needs_initialization {
            biquads[self.stage.state].clear();
        } else if self.is_first_mix_buffer {
            biquads[self.previous] = biquads[self.stage.state];
        } else {
            biquads[self.stage.state] = biquads[self.previous];
        }

        let filtered = &mut context.scratch.samples;
        filtered.clear();
        filtered.resize(context.sample_count, 0.0);
        process_biquad_filter(
            &self.stage.parameter,
            &mut biquads[self.stage.state],
            filtered,
            context.arena.get_const(self.input),
        );

        let output = context.arena.get(self.output);
        match self.volume {
            MixVolume::Constant(volume) => kernels::mix(output, filtered, volume),
            MixVolume::Ramp {
                from,
                to,
                last_sample_index,
            } => {
                let last = mix_ramp(output, filtered, from, to);
                context.states.voices[self.voice].last_samples[last_sample_index] = last;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    fn lowpass() -> BiquadFilterParameter {
        BiquadFilterParameter::from_coefficients([0.25, 0.5, 0.25], [-0.5, 0.25])
    }

    fn stage(state: StateHandle<BiquadFilterState>, needs_initialization: bool) -> BiquadStage {
        BiquadStage {
            parameter: lowpass(),
            state,
            needs_initialization,
        }
    }

    fn impulse(harness: &mut Harness) {
        harness.arena.get(0).fill(0.0);
        harness.arena.set_sample(0, 0, 1000.0);
    }

    #[test]
    fn test_initialization_ignores_garbage() {
        let mut fresh = Harness::new(2, 8);
        let handle = fresh.states.insert(BiquadFilterState::default());
        impulse(&mut fresh);
        fresh.run(&mut BiquadFilterCommand::new(0, 0, 1, stage(handle, false)));

        let mut dirty = Harness::new(2, 8);
        let handle = dirty.states.insert(BiquadFilterState {
            x1: 55.0,
            x2: -3.0,
            y1: 1e4,
            y2: 7.0,
        });
        impulse(&mut dirty);
        dirty.run(&mut BiquadFilterCommand::new(0, 0, 1, stage(handle, true)));

        assert_eq!(fresh.arena.get_const(1), dirty.arena.get_const(1));
    }

    #[test]
    fn test_history_carries_across_frames() {
        let mut harness = Harness::new(2, 4);
        let handle = harness.states.insert(BiquadFilterState::default());
        impulse(&mut harness);
        harness.run(&mut BiquadFilterCommand::new(0, 0, 1, stage(handle, false)));
        harness.arena.get(0).fill(0.0);
        harness.run(&mut BiquadFilterCommand::new(0, 0, 1, stage(handle, false)));
        // The impulse response keeps ringing into the second frame.
        assert!(harness.arena.get_const(1).iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_multi_tap_rejects_three_stages() {
        let s = stage(StateHandle::from_index(0), true);
        assert_eq!(
            MultiTapBiquadFilterCommand::new(0, 0, 1, &[s, s, s]).err(),
            Some(CommandError::TooManyBiquadStages(3))
        );
    }

    #[test]
    fn test_multi_tap_matches_two_single_stages() {
        let mut cascade = Harness::new(3, 8);
        let a = cascade.states.insert(BiquadFilterState::default());
        let b = cascade.states.insert(BiquadFilterState::default());
        impulse(&mut cascade);
        let mut command = MultiTapBiquadFilterCommand::new(0, 0, 1, &[stage(a, true), stage(b, true)]).unwrap();
        cascade.run(&mut command);

        let mut singles = Harness::new(3, 8);
        let a = singles.states.insert(BiquadFilterState::default());
        let b = singles.states.insert(BiquadFilterState::default());
        impulse(&mut singles);
        singles.run(&mut BiquadFilterCommand::new(0, 0, 2, stage(a, true)));
        singles.run(&mut BiquadFilterCommand::new(1, 2, 1, stage(b, true)));

        assert_eq!(cascade.arena.get_const(1), singles.arena.get_const(1));
    }

    #[test]
    fn test_multi_tap_disabled_stages_copy() {
        let mut harness = Harness::new(2, 4);
        let a = harness.states.insert(BiquadFilterState::default());
        harness.arena.get(0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let disabled = BiquadStage {
            parameter: BiquadFilterParameter::default(),
            state: a,
            needs_initialization: true,
        };
        harness.run(&mut MultiTapBiquadFilterCommand::new(0, 0, 1, &[disabled]).unwrap());
        assert_eq!(harness.arena.get_const(1), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fused_mix_gives_every_buffer_the_same_filter_output() {
        let mut harness = Harness::new(3, 8);
        let state = harness.states.insert(BiquadFilterState::default());
        let previous = harness.states.insert(BiquadFilterState::default());
        let voice = harness.states.insert(VoiceUpdateState::default());

        // Warm the filter so history is non-zero.
        impulse(&mut harness);
        harness.run(&mut BiquadFilterCommand::new(0, 0, 2, stage(state, false)));
        harness.arena.get(2).fill(0.0);

        harness.arena.get(0).fill(100.0);
        let volume = MixVolume::Constant(1.0);
        let mut first =
            BiquadFilterAndMixCommand::new(0, 0, 1, stage(state, false), previous, true, volume, voice).unwrap();
        let mut second = BiquadFilterAndMixCommand::new(
            0,
            0,
            2,
            stage(state, false),
            previous,
            false,
            MixVolume::Ramp {
                from: 1.0,
                to: 1.0,
                last_sample_index: 2,
            },
            voice,
        )
        .unwrap();
        harness.run(&mut first);
        harness.run(&mut second);

        assert_eq!(harness.arena.get_const(1), harness.arena.get_const(2));
        assert_eq!(harness.states.voices[voice].last_samples[2], harness.arena.sample(2, 7));
    }
}
