//! Voice-side parameters: sample formats, wave buffers and decode flags.

use crate::constants::VOICE_WAVE_BUFFER_COUNT;
use crate::error::CommandError;
use crate::memory::CpuAddress;

/// Encoding of a voice's wave buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Interleaved signed 16-bit PCM.
    PcmInt16,
    /// Interleaved 32-bit float PCM, nominal range `-1.0..=1.0`.
    PcmFloat,
    /// Mono DSP-ADPCM.
    Adpcm,
}

impl SampleFormat {
    /// Raw tag used in guest parameter blocks.
    pub const fn raw(self) -> u8 {
        match self {
            Self::PcmInt16 => 2,
            Self::PcmFloat => 5,
            Self::Adpcm => 6,
        }
    }

    /// Bytes per sample per channel (ADPCM is not byte-addressable per sample).
    pub const fn sample_size(self) -> usize {
        match self {
            Self::PcmInt16 => 2,
            Self::PcmFloat => 4,
            Self::Adpcm => 0,
        }
    }
}

impl TryFrom<u8> for SampleFormat {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::PcmInt16),
            5 => Ok(Self::PcmFloat),
            6 => Ok(Self::Adpcm),
            other => Err(CommandError::UnsupportedSampleFormat(other)),
        }
    }
}

/// Per-voice decode behaviour flags.
///
/// # Example
///
/// ```rust
/// use audren_core::DecodingBehaviour;
///
/// let flags = DecodingBehaviour::SKIP_PITCH_AND_SAMPLE_RATE_CONVERSION
///     .union(DecodingBehaviour::PLAYED_SAMPLE_COUNT_RESET_WHEN_LOOPING);
/// assert!(flags.contains(DecodingBehaviour::SKIP_PITCH_AND_SAMPLE_RATE_CONVERSION));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DecodingBehaviour(u16);

impl DecodingBehaviour {
    /// Resample with pitch, keep the played count across loops.
    pub const DEFAULT: Self = Self(0);
    /// Reset the played sample count each time a buffer loops.
    pub const PLAYED_SAMPLE_COUNT_RESET_WHEN_LOOPING: Self = Self(1 << 0);
    /// Copy decoded samples straight to the output, no pitch or rate conversion.
    pub const SKIP_PITCH_AND_SAMPLE_RATE_CONVERSION: Self = Self(1 << 1);

    /// From raw guest bits (unknown bits are kept).
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// One queued wave buffer.
///
/// Offsets are in samples per channel, relative to `buffer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveBuffer {
    /// Start of the encoded data in guest memory.
    pub buffer: CpuAddress,
    /// Size of the encoded data in bytes.
    pub size: u64,
    /// First sample to play.
    pub start_sample_offset: u32,
    /// One past the last sample to play.
    pub end_sample_offset: u32,
    /// Whether playback wraps back to the loop start.
    pub looping: bool,
    /// Whether this buffer ends the stream (resets the played count).
    pub is_end_of_stream: bool,
    /// First sample of the loop region (0 means unset).
    pub loop_start_sample_offset: u32,
    /// One past the last sample of the loop region (0 means unset).
    pub loop_end_sample_offset: u32,
    /// Loops to play before the buffer ends; `-1` loops forever.
    pub loop_count: i32,
    /// ADPCM loop context in guest memory, 0 if absent.
    pub context: CpuAddress,
    /// Size of the context block.
    pub context_size: u64,
}

impl WaveBuffer {
    /// Sample range of the first pass: `(start, end)`.
    pub fn play_range(&self) -> (u32, u32) {
        (self.start_sample_offset, self.end_sample_offset)
    }

    /// Sample range of loop passes: `(start, end)`.
    ///
    /// The loop region applies only when both offsets are set and ordered;
    /// otherwise loops replay the [`play_range`](Self::play_range).
    pub fn loop_range(&self) -> (u32, u32) {
        let (start, end) = (self.loop_start_sample_offset, self.loop_end_sample_offset);
        if start != 0 && end != 0 && start <= end {
            (start, end)
        } else {
            self.play_range()
        }
    }
}

/// The fixed-size wave buffer queue of a voice.
pub type WaveBufferQueue = [WaveBuffer; VOICE_WAVE_BUFFER_COUNT];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format_tags() {
        for format in [SampleFormat::PcmInt16, SampleFormat::PcmFloat, SampleFormat::Adpcm] {
            assert_eq!(SampleFormat::try_from(format.raw()), Ok(format));
        }
        assert_eq!(
            SampleFormat::try_from(1),
            Err(CommandError::UnsupportedSampleFormat(1))
        );
    }

    #[test]
    fn test_flags() {
        let flags = DecodingBehaviour::from_bits(3);
        assert!(flags.contains(DecodingBehaviour::PLAYED_SAMPLE_COUNT_RESET_WHEN_LOOPING));
        assert!(flags.contains(DecodingBehaviour::SKIP_PITCH_AND_SAMPLE_RATE_CONVERSION));
        assert!(!DecodingBehaviour::DEFAULT.contains(DecodingBehaviour::PLAYED_SAMPLE_COUNT_RESET_WHEN_LOOPING));
    }

    #[test]
    fn test_loop_range_defaults_to_play_range() {
        let wb = WaveBuffer {
            start_sample_offset: 10,
            end_sample_offset: 100,
            ..WaveBuffer::default()
        };
        assert_eq!(wb.loop_range(), (10, 100));

        let wb = WaveBuffer {
            loop_start_sample_offset: 20,
            loop_end_sample_offset: 50,
            ..wb
        };
        assert_eq!(wb.loop_range(), (20, 50));
        assert_eq!(wb.play_range(), (10, 100));
    }

    #[test]
    fn test_partial_or_reversed_loop_region_uses_play_range() {
        let base = WaveBuffer {
            start_sample_offset: 1,
            end_sample_offset: 4,
            ..WaveBuffer::default()
        };
        for (loop_start, loop_end) in [(0, 2), (2, 0), (3, 2)] {
            let wb = WaveBuffer {
                loop_start_sample_offset: loop_start,
                loop_end_sample_offset: loop_end,
                ..base
            };
            assert_eq!(wb.loop_range(), (1, 4), "loop fields ({loop_start}, {loop_end})");
        }
    }
}
