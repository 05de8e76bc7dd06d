//! The [`Command`] trait and the context commands process against.
//!
//! A command is a small descriptor built once per frame: buffer indices, a
//! parameter snapshot and handles into the [`StateStore`]. The engine calls
//! [`Command::process`] exactly once per pass, in list order.

use core::fmt;

use crate::buffer::SampleBufferArena;
use crate::device::OutputDevice;
use crate::estimator::ProcessingTimeEstimator;
use crate::memory::MemoryManager;
use crate::state::StateStore;

/// Diagnostic identifier of the voice, mix or effect node that emitted a command.
pub type NodeId = u32;

/// Kind tag of every command variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CommandKind {
    ClearMixBuffer,
    CopyMixBuffer,
    PcmInt16DataSourceVersion1,
    PcmFloatDataSourceVersion1,
    AdpcmDataSourceVersion1,
    DataSourceVersion2,
    BiquadFilter,
    MultiTapBiquadFilter,
    BiquadFilterAndMix,
    Mix,
    MixRamp,
    MixRampGrouped,
    Volume,
    VolumeRamp,
    DepopPrepare,
    DepopForMixBuffers,
    Delay,
    Reverb,
    Reverb3d,
    LimiterVersion1,
    LimiterVersion2,
    Upsample,
    DownMixSurroundToStereo,
    CircularBufferSink,
    DeviceSink,
}

impl CommandKind {
    /// Stable name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClearMixBuffer => "clear_mix_buffer",
            Self::CopyMixBuffer => "copy_mix_buffer",
            Self::PcmInt16DataSourceVersion1 => "pcm_int16_data_source_v1",
            Self::PcmFloatDataSourceVersion1 => "pcm_float_data_source_v1",
            Self::AdpcmDataSourceVersion1 => "adpcm_data_source_v1",
            Self::DataSourceVersion2 => "data_source_v2",
            Self::BiquadFilter => "biquad_filter",
            Self::MultiTapBiquadFilter => "multi_tap_biquad_filter",
            Self::BiquadFilterAndMix => "biquad_filter_and_mix",
            Self::Mix => "mix",
            Self::MixRamp => "mix_ramp",
            Self::MixRampGrouped => "mix_ramp_grouped",
            Self::Volume => "volume",
            Self::VolumeRamp => "volume_ramp",
            Self::DepopPrepare => "depop_prepare",
            Self::DepopForMixBuffers => "depop_for_mix_buffers",
            Self::Delay => "delay",
            Self::Reverb => "reverb",
            Self::Reverb3d => "reverb3d",
            Self::LimiterVersion1 => "limiter_v1",
            Self::LimiterVersion2 => "limiter_v2",
            Self::Upsample => "upsample",
            Self::DownMixSurroundToStereo => "downmix_surround_to_stereo",
            Self::CircularBufferSink => "circular_buffer_sink",
            Self::DeviceSink => "device_sink",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields every command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Emitting node, for diagnostics.
    pub node_id: NodeId,
    /// Disabled commands are skipped by the engine.
    pub enabled: bool,
    /// Budget in nanoseconds, filled in when pushed into a list.
    pub estimated_processing_time: u32,
}

impl CommandHeader {
    /// Enabled header for `node_id` with no estimate yet.
    pub const fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            enabled: true,
            estimated_processing_time: 0,
        }
    }
}

/// Reusable staging buffers for decoding guest samples.
#[derive(Debug, Clone, Default)]
pub struct DecodeScratch {
    /// Raw 16-bit samples read or decoded from guest memory.
    pub pcm: Vec<i16>,
    /// Float samples (resampler history followed by new input).
    pub samples: Vec<f32>,
}

/// Everything a command may touch while processing.
pub struct CommandContext<'a> {
    /// Mix buffers.
    pub arena: &'a mut SampleBufferArena,
    /// Server-owned persistent state.
    pub states: &'a mut StateStore,
    /// Guest memory.
    pub memory: &'a mut dyn MemoryManager,
    /// Final output.
    pub device: &'a mut dyn OutputDevice,
    /// Decode staging.
    pub scratch: &'a mut DecodeScratch,
    /// Mixer sample rate.
    pub sample_rate: u32,
    /// Samples per buffer.
    pub sample_count: usize,
}

/// One processing step of a command list.
///
/// # Example
///
/// ```rust
/// use audren_core::{Command, CommandContext, CommandHeader, CommandKind, ProcessingTimeEstimator};
///
/// struct Silence {
///     header: CommandHeader,
///     output: usize,
/// }
///
/// impl Command for Silence {
///     fn header(&self) -> &CommandHeader {
///         &self.header
///     }
///
///     fn header_mut(&mut self) -> &mut CommandHeader {
///         &mut self.header
///     }
///
///     fn kind(&self) -> CommandKind {
///         CommandKind::ClearMixBuffer
///     }
///
///     fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
///         estimator.clear_mix_buffer()
///     }
///
///     fn process(&mut self, context: &mut CommandContext<'_>) {
///         context.arena.clear(self.output);
///     }
/// }
/// ```
pub trait Command: Send {
    /// Common fields.
    fn header(&self) -> &CommandHeader;

    /// Common fields, mutably.
    fn header_mut(&mut self) -> &mut CommandHeader;

    /// Kind tag.
    fn kind(&self) -> CommandKind;

    /// Whether the engine times this command.
    fn should_meter(&self) -> bool {
        true
    }

    /// Highest arena buffer index this command touches, if any.
    fn max_buffer_index(&self) -> Option<usize> {
        None
    }

    /// Cost of this command in nanoseconds.
    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32;

    /// Run once against the shared context.
    fn process(&mut self, context: &mut CommandContext<'_>);

    /// Whether the engine will run this command.
    fn is_enabled(&self) -> bool {
        self.header().enabled
    }

    /// Toggle the command.
    fn set_enabled(&mut self, enabled: bool) {
        self.header_mut().enabled = enabled;
    }

    /// Emitting node.
    fn node_id(&self) -> NodeId {
        self.header().node_id
    }

    /// Budget in nanoseconds.
    fn estimated_processing_time(&self) -> u32 {
        self.header().estimated_processing_time
    }
}
