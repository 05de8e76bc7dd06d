//! Shared plumbing of the stateful effect commands.
//!
//! Every effect maps up to six arena buffers in and out, rebuilds or updates
//! its persistent state according to the parameter block's [`UsageState`],
//! and degrades to a copy when the effect is disabled.

use audren_core::{
    CHANNEL_COUNT_MAX, ChannelLayout, CommandError, CpuAddress, DelayParameter, DelayState, LimiterParameter,
    LimiterState, Reverb3dParameter, Reverb3dState, ReverbParameter, ReverbState, SampleBufferArena, UsageState,
};

/// Arena buffers an effect reads and writes, one pair per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectIo {
    input: [usize; CHANNEL_COUNT_MAX],
    output: [usize; CHANNEL_COUNT_MAX],
    layout: ChannelLayout,
}

impl EffectIo {
    /// Map `input`/`output` offsets relative to `buffer_offset`.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnsupportedChannelCount`] unless `channel_count` is 1, 2, 4 or 6.
    pub fn new(
        effect: &'static str,
        buffer_offset: usize,
        input: &[u8; CHANNEL_COUNT_MAX],
        output: &[u8; CHANNEL_COUNT_MAX],
        channel_count: usize,
    ) -> Result<Self, CommandError> {
        let layout = ChannelLayout::for_effect(effect, channel_count)?;
        Ok(Self {
            input: input.map(|offset| buffer_offset + usize::from(offset)),
            output: output.map(|offset| buffer_offset + usize::from(offset)),
            layout,
        })
    }

    /// Like [`EffectIo::new`] for an effect whose state is sized by `channel_count_max`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::UnsupportedChannelCount`] unless `channel_count` is 1, 2, 4 or 6
    /// - [`CommandError::ChannelCountAboveMax`] when `channel_count` exceeds `channel_count_max`
    pub fn bounded(
        effect: &'static str,
        buffer_offset: usize,
        input: &[u8; CHANNEL_COUNT_MAX],
        output: &[u8; CHANNEL_COUNT_MAX],
        channel_count: usize,
        channel_count_max: usize,
    ) -> Result<Self, CommandError> {
        let io = Self::new(effect, buffer_offset, input, output, channel_count)?;
        if channel_count > channel_count_max {
            return Err(CommandError::ChannelCountAboveMax {
                effect,
                channel_count,
                channel_count_max,
            });
        }
        Ok(io)
    }

    /// Channel layout.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Active channel count.
    pub fn channel_count(&self) -> usize {
        self.layout.channel_count()
    }

    /// Input buffer of `channel`.
    pub fn input(&self, channel: usize) -> usize {
        self.input[channel]
    }

    /// Output buffer of `channel`.
    pub fn output(&self, channel: usize) -> usize {
        self.output[channel]
    }

    /// Highest buffer index used by the active channels.
    pub fn max_buffer_index(&self) -> usize {
        let n = self.channel_count();
        self.input[..n].iter().chain(&self.output[..n]).copied().max().unwrap_or(0)
    }

    /// Disabled effect: copy each input to its output when they differ.
    pub fn pass_through(&self, arena: &mut SampleBufferArena) {
        for ch in 0..self.channel_count() {
            arena.copy(self.input[ch], self.output[ch]);
        }
    }

    /// Bring `state` in line with `status` for this layout.
    pub fn prepare<S: EffectState>(
        &self,
        state: &mut S,
        parameter: &S::Parameter,
        status: UsageState,
        work_buffer: CpuAddress,
    ) {
        state.prepare(parameter, status, self.layout, work_buffer);
    }

    /// Run `process` once per sample index with one value per channel.
    ///
    /// All inputs of a sample are gathered before any output of that sample
    /// is written, so in-place mappings are safe.
    pub fn process_frames<F>(&self, arena: &mut SampleBufferArena, sample_count: usize, mut process: F)
    where
        F: FnMut(&[f32], &mut [f32]),
    {
        let n = self.channel_count();
        let mut input = [0.0_f32; CHANNEL_COUNT_MAX];
        let mut output = [0.0_f32; CHANNEL_COUNT_MAX];
        for i in 0..sample_count {
            for ch in 0..n {
                input[ch] = arena.sample(self.input[ch], i);
            }
            process(&input[..n], &mut output[..n]);
            for ch in 0..n {
                arena.set_sample(self.output[ch], i, output[ch]);
            }
        }
    }
}

/// Persistent state of an effect, built from and updated by its parameter block.
pub trait EffectState: Sized {
    /// Parameter block type.
    type Parameter;

    /// Build fresh state (zeroed lines, derived coefficients).
    fn create(parameter: &Self::Parameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self;

    /// Recompute coefficients, keeping line contents.
    fn update(&mut self, parameter: &Self::Parameter, layout: ChannelLayout);

    /// Whether [`EffectState::create`] has run for this slot.
    fn is_configured(&self) -> bool;

    /// Layout the state currently processes.
    fn layout(&self) -> Option<ChannelLayout>;

    /// Channels the state holds per-channel storage for.
    fn channel_capacity(&self) -> usize {
        CHANNEL_COUNT_MAX
    }

    /// Process one sample index, one value per channel.
    fn process_frame(&mut self, input: &[f32], output: &mut [f32]);

    /// Bring `self` in line with `status`.
    ///
    /// `Invalid` always rebuilds, `New` updates, `Unchanged` leaves the state
    /// alone. A slot that was never configured, or is too small for `layout`,
    /// is built regardless; an `Unchanged` slot on another layout is updated.
    fn prepare(
        &mut self,
        parameter: &Self::Parameter,
        status: UsageState,
        layout: ChannelLayout,
        work_buffer: CpuAddress,
    ) {
        match status {
            UsageState::Invalid => *self = Self::create(parameter, layout, work_buffer),
            _ if !self.is_configured() || layout.channel_count() > self.channel_capacity() => {
                *self = Self::create(parameter, layout, work_buffer);
            }
            UsageState::New => self.update(parameter, layout),
            UsageState::Unchanged if self.layout() != Some(layout) => self.update(parameter, layout),
            UsageState::Unchanged => {}
        }
    }
}

macro_rules! effect_state {
    (@impl $state:ty, $parameter:ty, { $($extra:tt)* }) => {
        impl EffectState for $state {
            type Parameter = $parameter;

            fn create(parameter: &$parameter, layout: ChannelLayout, work_buffer: CpuAddress) -> Self {
                <$state>::new(parameter, layout, work_buffer)
            }

            fn update(&mut self, parameter: &$parameter, layout: ChannelLayout) {
                self.update_parameter(parameter, layout);
            }

            fn is_configured(&self) -> bool {
                <$state>::is_configured(self)
            }

            fn layout(&self) -> Option<ChannelLayout> {
                <$state>::layout(self)
            }

            fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
                <$state>::process_frame(self, input, output);
            }

            $($extra)*
        }
    };
    // State with storage sized per channel at construction.
    ($state:ty, $parameter:ty, per_channel) => {
        effect_state!(@impl $state, $parameter, {
            fn channel_capacity(&self) -> usize {
                <$state>::channel_capacity(self)
            }
        });
    };
    ($state:ty, $parameter:ty) => {
        effect_state!(@impl $state, $parameter, {});
    };
}

effect_state!(DelayState, DelayParameter, per_channel);
effect_state!(ReverbState, ReverbParameter);
effect_state!(Reverb3dState, Reverb3dParameter);
effect_state!(LimiterState, LimiterParameter, per_channel);
