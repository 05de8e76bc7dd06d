//! Audren Commands - one type per command kind of the DSP pipeline
//!
//! Every type here implements [`audren_core::Command`] and is pushed into an
//! [`audren_core::CommandList`] in data-flow order:
//!
//! - Housekeeping: [`ClearMixBufferCommand`], [`CopyMixBufferCommand`]
//! - Sources: [`DataSourceCommand`] (version 1 per format, version 2 unified)
//! - Filters: [`BiquadFilterCommand`], [`MultiTapBiquadFilterCommand`], [`BiquadFilterAndMixCommand`]
//! - Gain: [`VolumeCommand`], [`VolumeRampCommand`], [`MixCommand`], [`MixRampCommand`], [`MixRampGroupedCommand`]
//! - Click suppression: [`DepopPrepareCommand`], [`DepopForMixBuffersCommand`]
//! - Effects: [`DelayCommand`], [`ReverbCommand`], [`Reverb3dCommand`], [`LimiterCommand`]
//! - Output: [`UpsampleCommand`], [`DownMixSurroundToStereoCommand`], [`CircularBufferSinkCommand`],
//!   [`DeviceSinkCommand`]
//!
//! ## Example
//!
//! ```rust
//! use audren_commands::{ClearMixBufferCommand, DeviceSinkCommand, VolumeCommand};
//! use audren_core::{CapturingDevice, CommandList, GuestMemory, StateStore};
//!
//! let mut list = CommandList::new(2, 240, 48_000);
//! list.push(ClearMixBufferCommand::new(0));
//! list.push(VolumeCommand::new(0, 0, 1, 0.5));
//! list.push(DeviceSinkCommand::new(0, &[0, 1], None));
//!
//! let mut states = StateStore::new(2);
//! let mut memory = GuestMemory::new(0, 0);
//! let mut device = CapturingDevice::new(48_000, 2);
//! list.process(&mut states, &mut memory, &mut device);
//! assert_eq!(device.frame_count(), 240);
//! ```

/// Implements `header`/`header_mut` for a struct with a `header` field.
macro_rules! command_header {
    () => {
        fn header(&self) -> &audren_core::CommandHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut audren_core::CommandHeader {
            &mut self.header
        }
    };
}

pub mod biquad_filter;
pub mod buffer_ops;
pub mod circular_buffer;
pub mod data_source;
pub mod delay;
pub mod depop;
pub mod device_sink;
pub mod downmix;
pub mod effect;
pub mod limiter;
pub mod mix;
pub mod reverb;
pub mod reverb3d;
pub mod upsample;
pub mod volume;

pub use biquad_filter::{
    BiquadFilterAndMixCommand, BiquadFilterCommand, BiquadStage, MixVolume, MultiTapBiquadFilterCommand,
};
pub use buffer_ops::{ClearMixBufferCommand, CopyMixBufferCommand};
pub use circular_buffer::CircularBufferSinkCommand;
pub use data_source::{DataSourceCommand, DataSourceVersion, VoiceSource};
pub use delay::DelayCommand;
pub use depop::{DepopForMixBuffersCommand, DepopPrepareCommand, depop_decay};
pub use device_sink::DeviceSinkCommand;
pub use downmix::{DEFAULT_DOWNMIX_COEFFICIENTS, DownMixSurroundToStereoCommand};
pub use effect::{EffectIo, EffectState};
pub use limiter::{LimiterCommand, LimiterVersion};
pub use mix::{MixCommand, MixRampCommand, MixRampGroupedCommand};
pub use reverb::ReverbCommand;
pub use reverb3d::Reverb3dCommand;
pub use upsample::UpsampleCommand;
pub use volume::{VolumeCommand, VolumeRampCommand};
