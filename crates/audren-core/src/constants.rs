//! Renderer-wide limits and fixed rates.
//!
//! These values size the persistent state slabs and the inline arrays carried
//! by parameter blocks. They are shared by every crate in the workspace so a
//! command list and the state it references always agree on capacities.

/// Mixer (target) sample rate in Hz. Device sinks only support this rate.
pub const TARGET_SAMPLE_RATE: u32 = 48_000;

/// Samples per frame at [`TARGET_SAMPLE_RATE`].
pub const TARGET_SAMPLE_COUNT: usize = 240;

/// Maximum number of mix buffers a voice or effect can address.
pub const MIX_BUFFER_COUNT_MAX: usize = 24;

/// Maximum number of wave buffers queued on a voice.
pub const VOICE_WAVE_BUFFER_COUNT: usize = 4;

/// Maximum number of channels carried by a voice.
pub const VOICE_CHANNEL_COUNT_MAX: usize = 6;

/// Biquad filters attached to each voice.
pub const VOICE_BIQUAD_FILTER_COUNT: usize = 2;

/// Maximum channel count of an effect or sink.
pub const CHANNEL_COUNT_MAX: usize = 6;

/// Resampler history kept between frames (enough for the highest quality).
pub const PITCH_HISTORY_MAX: usize = 8;

/// Scratch capacity (in samples) used while decoding wave buffers.
pub const DECODE_SCRATCH_SIZE: usize = 0x3F00;

/// Samples per DSP-ADPCM frame.
pub const ADPCM_SAMPLES_PER_FRAME: usize = 14;

/// Bytes per DSP-ADPCM frame (one header byte plus seven data bytes).
pub const ADPCM_FRAME_SIZE: usize = 8;

/// Entries in a DSP-ADPCM coefficient table (eight predictor pairs).
pub const ADPCM_COEFFICIENT_COUNT: usize = 16;
