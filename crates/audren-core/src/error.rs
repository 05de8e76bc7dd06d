//! Error types shared across the pipeline.
//!
//! Processing never returns errors: per-frame failures driven by guest data are
//! absorbed (silence, skipped writes). The types here cover the two places
//! where a caller can act on a failure, guest memory access and command
//! construction.

use thiserror::Error;

use crate::memory::CpuAddress;

/// Failure reported by a [`MemoryManager`](crate::MemoryManager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The range does not map to guest memory.
    #[error("invalid guest address {address:#x} (size {size})")]
    InvalidAddress {
        /// Start of the rejected range.
        address: CpuAddress,
        /// Length of the rejected range in bytes.
        size: usize,
    },

    /// The address does not satisfy the alignment of the accessed type.
    #[error("guest address {address:#x} is not {align}-byte aligned")]
    Misaligned {
        /// Rejected address.
        address: CpuAddress,
        /// Required alignment in bytes.
        align: usize,
    },
}

/// A command list was built with values this pipeline does not support.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Effects only support 1, 2, 4 or 6 channels.
    #[error("{effect} does not support {channel_count} channels")]
    UnsupportedChannelCount {
        /// Effect name, for diagnostics.
        effect: &'static str,
        /// Rejected channel count.
        channel_count: usize,
    },

    /// The active channel count exceeds the count the state is sized for.
    #[error("{effect} uses {channel_count} channels but is sized for {channel_count_max}")]
    ChannelCountAboveMax {
        /// Effect name, for diagnostics.
        effect: &'static str,
        /// Requested channel count.
        channel_count: usize,
        /// Channel count the parameter block allocates for.
        channel_count_max: usize,
    },

    /// Raw sample format tag is not PCM16, PCM float or ADPCM.
    #[error("unsupported sample format {0}")]
    UnsupportedSampleFormat(u8),

    /// Raw sample-rate-conversion quality tag is unknown.
    #[error("unsupported sample rate conversion quality {0}")]
    UnsupportedQuality(u8),

    /// A buffer index points outside the arena.
    #[error("buffer index {index} out of range (arena holds {buffer_count} buffers)")]
    BufferIndexOutOfRange {
        /// Rejected index.
        index: usize,
        /// Buffers in the arena.
        buffer_count: usize,
    },

    /// Grouped biquad commands carry a small fixed number of stages.
    #[error("{0} biquad stages requested, at most 2 are supported")]
    TooManyBiquadStages(usize),

    /// A version 1 data source only decodes mono sources.
    #[error("version 1 data sources are mono only, got {0} channels")]
    MultichannelVersion1Source(usize),
}
