//! Parameter blocks supplied by the renderer server.
//!
//! Commands snapshot these when they are constructed; nothing in the pipeline
//! mutates them afterwards. Gains and times in effect parameters are Q14
//! fixed point unless a field says otherwise.

pub mod effect;
pub mod voice;

pub use effect::{
    ChannelLayout, CircularBufferParameter, DelayParameter, LimiterParameter, Reverb3dParameter,
    ReverbEarlyMode, ReverbLateMode, ReverbParameter,
};
pub use voice::{DecodingBehaviour, SampleFormat, WaveBuffer, WaveBufferQueue};

/// Lifecycle of an effect's parameter block.
///
/// Drives how an effect command treats its persistent state:
///
/// | Status | Action |
/// |--------|--------|
/// | `Invalid` | rebuild state from scratch (first use or discontinuity) |
/// | `New` | recompute coefficients, keep delay-line contents |
/// | `Unchanged` | use the state as is |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UsageState {
    /// State must be (re)initialized.
    #[default]
    Invalid,
    /// Parameters changed since the last frame.
    New,
    /// Parameters are the same as last frame.
    Unchanged,
}
