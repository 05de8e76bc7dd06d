//! Audren Core - the audio renderer's DSP command pipeline
//!
//! This crate holds everything a frame of audio rendering needs except the
//! command implementations themselves: the mix buffer arena, the numeric
//! primitives whose rounding must match the reference output bit for bit, the
//! persistent effect state, and the engine that runs a command list.
//!
//! # Core Abstractions
//!
//! ## Engine
//!
//! - [`Command`] - Object-safe trait every command kind implements
//! - [`CommandList`] - Owns the arena, runs commands in order, meters overruns
//! - [`ProcessingTimeEstimator`] - Per-kind cost tables for 160/240-sample frames
//!
//! ## Storage
//!
//! - [`SampleBufferArena`] - Contiguous per-frame float buffers addressed by index
//! - [`StateStore`] - Server-owned slabs of persistent state, addressed by [`StateHandle`]
//!
//! ## Collaborators
//!
//! - [`MemoryManager`] / [`GuestMemory`] - Guest memory access, fail-soft
//! - [`OutputDevice`] / [`CapturingDevice`] - Final PCM destination
//!
//! ## DSP Primitives
//!
//! - Rounding: [`round_up`], [`round_down`], [`multiply_round_up`], [`multiply_round_down`]
//! - Fixed point: [`fixed_point::to_float`] and friends (Q14/Q15)
//! - PCM: [`saturate`], [`float_to_pcm`]
//! - Kernels: [`kernels::apply_volume`], [`kernels::mix`] (scalar and lane-blocked paths)
//! - Filters and lines: [`BiquadFilterState`], [`DelayLine`], [`DecayDelay`], [`DecayFilter`]
//! - Decoding: [`adpcm::decode`], [`resample`]
//!
//! # Numeric conventions
//!
//! Mix buffers hold `f32` samples on the 16-bit PCM scale (a full-scale
//! sample is `32767.0`). Effect parameters arrive as Q14 fixed point.
//!
//! # Example
//!
//! ```rust
//! use audren_core::{CapturingDevice, CommandList, GuestMemory, ProcessingTimeEstimator, StateStore};
//!
//! let mut list = CommandList::new(24, 240, 48_000)
//!     .with_estimator(ProcessingTimeEstimator::new(240, 24));
//! let mut states = StateStore::new(24);
//! let mut memory = GuestMemory::new(0x8000_0000, 0x1_0000);
//! let mut device = CapturingDevice::new(48_000, 2);
//!
//! // Commands are pushed in data-flow order, then the frame runs once.
//! let report = list.process(&mut states, &mut memory, &mut device);
//! assert_eq!(report.overruns, 0);
//! ```

pub mod adpcm;
pub mod biquad;
pub mod buffer;
pub mod command;
pub mod command_list;
pub mod constants;
pub mod delay;
pub mod device;
pub mod error;
pub mod estimator;
pub mod fixed_point;
pub mod kernels;
pub mod math;
pub mod memory;
pub mod one_pole;
pub mod parameter;
pub mod pcm;
pub mod resampler;
pub mod state;

pub use adpcm::AdpcmLoopContext;
pub use biquad::{BiquadFilterParameter, BiquadFilterState, process_biquad_filter, process_biquad_filter_in_place};
pub use buffer::SampleBufferArena;
pub use command::{Command, CommandContext, CommandHeader, CommandKind, DecodeScratch, NodeId};
pub use command_list::{CommandList, PassReport};
pub use constants::*;
pub use delay::{DecayDelay, DelayLine, delay_time_to_samples};
pub use device::{CapturingDevice, OutputDevice};
pub use error::{CommandError, MemoryError};
pub use estimator::ProcessingTimeEstimator;
pub use kernels::KernelPath;
pub use math::{
    db_to_linear, flush_denormal, millibels_to_linear, multiply_round_down, multiply_round_up, pow10, round_down,
    round_up,
};
pub use memory::{CpuAddress, GuestMemory, MemoryManager};
pub use one_pole::{DecayFilter, ExponentialMovingAverage};
pub use parameter::{
    ChannelLayout, CircularBufferParameter, DecodingBehaviour, DelayParameter, LimiterParameter, Reverb3dParameter,
    ReverbEarlyMode, ReverbLateMode, ReverbParameter, SampleFormat, UsageState, WaveBuffer, WaveBufferQueue,
};
pub use pcm::{float_to_pcm, saturate, saturate_slice};
pub use resampler::{SampleRateConversionQuality, copy_through, input_sample_count, resample};
pub use state::{
    CircularBufferSinkState, DelayState, LimitedSample, LimiterState, LimiterStatistics, Reverb3dState, ReverbState,
    Slab, StateHandle, StateSlot, StateStore, UpsamplerState, VoiceUpdateState,
};
