//! Surround to stereo fold-down.
//!
//! ```text
//! L = round_up(back * RL + lfe * LFE + center * FC + front * FL)
//! R = round_up(back * RR + lfe * LFE + center * FC + front * FR)
//! ```
//!
//! The four remaining outputs are zeroed.

use audren_core::{
    CHANNEL_COUNT_MAX, Command, CommandContext, CommandError, CommandHeader, CommandKind, NodeId,
    ProcessingTimeEstimator, round_up,
};

use crate::effect::EffectIo;

/// Front, center, LFE and back weights used when the server supplies none.
pub const DEFAULT_DOWNMIX_COEFFICIENTS: [f32; 4] = [1.0, 0.707, 0.251, 0.707];

const FRONT: usize = 0;
const CENTER: usize = 1;
const LFE: usize = 2;
const BACK: usize = 3;

/// Folds six channels `[FL, FR, FC, LFE, RL, RR]` into two.
#[derive(Debug, Clone)]
pub struct DownMixSurroundToStereoCommand {
    header: CommandHeader,
    io: EffectIo,
    coefficients: [f32; 4],
}

impl DownMixSurroundToStereoCommand {
    /// Downmix between six input and six output offsets relative to `buffer_offset`.
    ///
    /// # Errors
    ///
    /// Propagates [`EffectIo::new`] errors.
    pub fn new(
        node_id: NodeId,
        buffer_offset: usize,
        input: &[u8; CHANNEL_COUNT_MAX],
        output: &[u8; CHANNEL_COUNT_MAX],
        coefficients: [f32; 4],
    ) -> Result<Self, CommandError> {
        Ok(Self {
            header: CommandHeader::new(node_id),
            io: EffectIo::new("downmix", buffer_offset, input, output, CHANNEL_COUNT_MAX)?,
            coefficients,
        })
    }
}

#[inline]
fn fold(c: &[f32; 4], front: f32, center: f32, lfe: f32, back: f32) -> f32 {
    round_up(c[BACK] * back + c[LFE] * lfe + c[CENTER] * center + c[FRONT] * front)
}

impl Command for DownMixSurroundToStereoCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::DownMixSurroundToStereo
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.io.max_buffer_index())
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.downmix_surround_to_stereo()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let c = &self.coefficients;
        self.io.process_frames(context.arena, context.sample_count, |input, output| {
            let [fl, fr, fc, lfe, rl, rr] = [input[0], input[1], input[2], input[3], input[4], input[5]];
            output[0] = fold(c, fl, fc, lfe, rl);
            output[1] = fold(c, fr, fc, lfe, rr);
            output[2..].fill(0.0);
        });
    }
}
