//! Effect parameter blocks.
//!
//! `input`/`output` hold buffer offsets relative to the effect's mix-buffer
//! base; only the first `channel_count` entries are meaningful.

use crate::constants::CHANNEL_COUNT_MAX;
use crate::error::CommandError;
use crate::memory::CpuAddress;

use super::UsageState;

/// Channel layouts supported by the stateful effects.
///
/// Six-channel buffers are ordered `[FL, FR, FC, LFE, RL, RR]`, the same
/// order the device sink and downmix use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// One channel.
    Mono,
    /// Two channels.
    Stereo,
    /// Four channels.
    Quad,
    /// 5.1.
    Surround,
}

impl ChannelLayout {
    /// Layout for `channel_count`, or `None` when unsupported.
    pub const fn from_channel_count(channel_count: usize) -> Option<Self> {
        match channel_count {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            4 => Some(Self::Quad),
            6 => Some(Self::Surround),
            _ => None,
        }
    }

    /// Layout for `channel_count`, or an error naming `effect`.
    pub fn for_effect(effect: &'static str, channel_count: usize) -> Result<Self, CommandError> {
        Self::from_channel_count(channel_count).ok_or(CommandError::UnsupportedChannelCount {
            effect,
            channel_count,
        })
    }

    /// Channels in this layout.
    pub const fn channel_count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Quad => 4,
            Self::Surround => 6,
        }
    }
}

/// Feedback delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayParameter {
    /// Input buffer offsets.
    pub input: [u8; CHANNEL_COUNT_MAX],
    /// Output buffer offsets.
    pub output: [u8; CHANNEL_COUNT_MAX],
    /// Channels the state is sized for.
    pub channel_count_max: u16,
    /// Active channels.
    pub channel_count: u16,
    /// Longest delay the lines must hold, in milliseconds.
    pub delay_time_max: u32,
    /// Current delay in milliseconds.
    pub delay_time: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Gain into the delay network (Q14).
    pub in_gain: i32,
    /// Feedback gain (Q14).
    pub feedback_gain: i32,
    /// Wet output gain (Q14).
    pub out_gain: i32,
    /// Dry output gain (Q14).
    pub dry_gain: i32,
    /// Cross-feed between channels (Q14, 0 = none, 1 = all).
    pub channel_spread: i32,
    /// Feedback low-pass amount (Q14).
    pub low_pass_amount: i32,
    /// Parameter lifecycle.
    pub status: UsageState,
}

impl Default for DelayParameter {
    fn default() -> Self {
        Self {
            input: [0, 1, 2, 3, 4, 5],
            output: [0, 1, 2, 3, 4, 5],
            channel_count_max: 1,
            channel_count: 1,
            delay_time_max: 1000,
            delay_time: 100,
            sample_rate: 48_000,
            in_gain: 1 << 14,
            feedback_gain: 1 << 13,
            out_gain: 1 << 14,
            dry_gain: 1 << 14,
            channel_spread: 0,
            low_pass_amount: 0,
            status: UsageState::Invalid,
        }
    }
}

/// Early reflection presets of the reverb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReverbEarlyMode {
    /// Small room.
    #[default]
    SmallRoom,
    /// Large room.
    LargeRoom,
    /// Hall.
    Hall,
    /// Cathedral.
    Cathedral,
    /// No early reflections.
    Disabled,
}

/// Late reverberation presets of the reverb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReverbLateMode {
    /// Room.
    #[default]
    Room,
    /// Hall.
    Hall,
    /// Metal plate.
    Plate,
    /// Cathedral.
    Cathedral,
    /// Longest delay network, hall timing.
    NoDelay,
}

/// Reverb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverbParameter {
    /// Input buffer offsets.
    pub input: [u8; CHANNEL_COUNT_MAX],
    /// Output buffer offsets.
    pub output: [u8; CHANNEL_COUNT_MAX],
    /// Channels the state is sized for.
    pub channel_count_max: u16,
    /// Active channels.
    pub channel_count: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Early reflection preset.
    pub early_mode: ReverbEarlyMode,
    /// Early reflection gain (Q14).
    pub early_gain: i32,
    /// Extra pre-delay in milliseconds (Q14).
    pub pre_delay_time: i32,
    /// Late reverberation preset.
    pub late_mode: ReverbLateMode,
    /// Late reverberation gain (Q14).
    pub late_gain: i32,
    /// Decay time in seconds (Q14).
    pub decay_time: i32,
    /// High-frequency decay time relative to `decay_time` (Q14).
    pub high_freq_decay_ratio: i32,
    /// Diffusion allpass coloration, 0 = most diffuse (Q14).
    pub coloration: i32,
    /// Gain into the reverb network (Q14).
    pub reverb_gain: i32,
    /// Wet output gain (Q14).
    pub out_gain: i32,
    /// Dry output gain (Q14).
    pub dry_gain: i32,
    /// Parameter lifecycle.
    pub status: UsageState,
}

impl Default for ReverbParameter {
    fn default() -> Self {
        Self {
            input: [0, 1, 2, 3, 4, 5],
            output: [0, 1, 2, 3, 4, 5],
            channel_count_max: 1,
            channel_count: 1,
            sample_rate: 48_000,
            early_mode: ReverbEarlyMode::SmallRoom,
            early_gain: 1 << 14,
            pre_delay_time: 0,
            late_mode: ReverbLateMode::Room,
            late_gain: 1 << 14,
            decay_time: 1 << 14,
            high_freq_decay_ratio: 1 << 13,
            coloration: 1 << 13,
            reverb_gain: 1 << 14,
            out_gain: 1 << 14,
            dry_gain: 1 << 14,
            status: UsageState::Invalid,
        }
    }
}

/// I3DL2-style 3D reverb. Levels are in millibels, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reverb3dParameter {
    /// Input buffer offsets.
    pub input: [u8; CHANNEL_COUNT_MAX],
    /// Output buffer offsets.
    pub output: [u8; CHANNEL_COUNT_MAX],
    /// Channels the state is sized for.
    pub channel_count_max: u16,
    /// Active channels.
    pub channel_count: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Room high-frequency attenuation (mB).
    pub room_hf_gain: f32,
    /// Reference frequency for `room_hf_gain` and `decay_hf_ratio` (Hz).
    pub reference_hf: f32,
    /// Late reverberation decay time (s).
    pub decay_time: f32,
    /// High-frequency decay time relative to `decay_time`.
    pub decay_hf_ratio: f32,
    /// Master room level (mB).
    pub room_gain: f32,
    /// Early reflections level relative to room (mB).
    pub reflection_gain: f32,
    /// Late reverberation level relative to room (mB).
    pub reverb_gain: f32,
    /// Echo density of the late tail (%).
    pub diffusion: f32,
    /// Delay of the first reflection (s).
    pub reflection_delay: f32,
    /// Delay of the late tail after the first reflection (s).
    pub reverb_delay_time: f32,
    /// Modal density of the late tail (%).
    pub density: f32,
    /// Dry output gain (linear).
    pub dry_gain: f32,
    /// Parameter lifecycle.
    pub status: UsageState,
}

impl Default for Reverb3dParameter {
    fn default() -> Self {
        Self {
            input: [0, 1, 2, 3, 4, 5],
            output: [0, 1, 2, 3, 4, 5],
            channel_count_max: 1,
            channel_count: 1,
            sample_rate: 48_000,
            room_hf_gain: -100.0,
            reference_hf: 5000.0,
            decay_time: 1.49,
            decay_hf_ratio: 0.83,
            room_gain: -1000.0,
            reflection_gain: -2602.0,
            reverb_gain: 200.0,
            diffusion: 100.0,
            reflection_delay: 0.007,
            reverb_delay_time: 0.011,
            density: 100.0,
            dry_gain: 1.0,
            status: UsageState::Invalid,
        }
    }
}

/// Look-ahead limiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterParameter {
    /// Input buffer offsets.
    pub input: [u8; CHANNEL_COUNT_MAX],
    /// Output buffer offsets.
    pub output: [u8; CHANNEL_COUNT_MAX],
    /// Channels the state is sized for.
    pub channel_count_max: u16,
    /// Active channels.
    pub channel_count: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Longest look-ahead the delay ring must hold (ms).
    pub look_ahead_time_max: i32,
    /// Attack time (ms), informational once coefficients are set.
    pub attack_time: i32,
    /// Release time (ms), informational once coefficients are set.
    pub release_time: i32,
    /// Current look-ahead (ms).
    pub look_ahead_time: i32,
    /// Smoothing coefficient while the level rises.
    pub attack_coefficient: f32,
    /// Smoothing coefficient while the level falls.
    pub release_coefficient: f32,
    /// Detector level above which gain is reduced (normalized).
    pub threshold: f32,
    /// Gain applied before detection (linear).
    pub input_gain: f32,
    /// Gain applied after limiting (linear).
    pub output_gain: f32,
    /// Active look-ahead in samples.
    pub delay_buffer_sample_count_min: u32,
    /// Look-ahead ring capacity in samples.
    pub delay_buffer_sample_count_max: u32,
    /// Parameter lifecycle.
    pub status: UsageState,
    /// Accumulate peak input and minimum gain (version 2 only).
    pub statistics_enabled: bool,
    /// Reset statistics before this frame (version 2 only).
    pub statistics_reset: bool,
}

impl Default for LimiterParameter {
    fn default() -> Self {
        Self {
            input: [0, 1, 2, 3, 4, 5],
            output: [0, 1, 2, 3, 4, 5],
            channel_count_max: 1,
            channel_count: 1,
            sample_rate: 48_000,
            look_ahead_time_max: 10,
            attack_time: 1,
            release_time: 200,
            look_ahead_time: 5,
            attack_coefficient: 0.5,
            release_coefficient: 0.005,
            threshold: 0.5,
            input_gain: 1.0,
            output_gain: 1.0,
            delay_buffer_sample_count_min: 240,
            delay_buffer_sample_count_max: 480,
            status: UsageState::Invalid,
            statistics_enabled: false,
            statistics_reset: false,
        }
    }
}

/// Guest ring buffer fed by the circular-buffer sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircularBufferParameter {
    /// Ring start in guest memory.
    pub buffer_address: CpuAddress,
    /// Ring size in bytes.
    pub buffer_size: u32,
    /// Input buffer offsets.
    pub input: [u8; CHANNEL_COUNT_MAX],
    /// Inputs to write.
    pub input_count: u32,
    /// Samples between consecutive frames of one input (interleave factor).
    pub stride: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layouts() {
        for n in [1, 2, 4, 6] {
            let layout = ChannelLayout::from_channel_count(n).unwrap();
            assert_eq!(layout.channel_count(), n);
        }
        for n in [0, 3, 5, 7] {
            assert!(ChannelLayout::from_channel_count(n).is_none());
        }
    }

    #[test]
    fn test_for_effect_error_names_effect() {
        let err = ChannelLayout::for_effect("delay", 3).unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedChannelCount {
                effect: "delay",
                channel_count: 3
            }
        );
        assert_eq!(err.to_string(), "delay does not support 3 channels");
    }
}
