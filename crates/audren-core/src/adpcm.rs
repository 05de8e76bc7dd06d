//! DSP-ADPCM decoding.
//!
//! A stream is a sequence of 8-byte frames. Each frame starts with a header
//! byte (`predictor << 4 | scale`) followed by 14 signed 4-bit nibbles, high
//! nibble first. Decoding a nibble uses the previous two output samples and a
//! coefficient pair selected by the predictor:
//!
//! ```text
//! sample = clamp(((nibble << scale) << 11) + 1024 + c0 * hist0 + c1 * hist1) >> 11
//! ```
//!
//! Decoding may start mid-frame, in which case the predictor/scale and history
//! come from the [`AdpcmLoopContext`] carried in the voice state.

use crate::constants::{ADPCM_COEFFICIENT_COUNT, ADPCM_FRAME_SIZE, ADPCM_SAMPLES_PER_FRAME};

/// Predictor/scale and history needed to resume decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdpcmLoopContext {
    /// Last header byte seen (`predictor << 4 | scale`).
    pub predictor_scale: u16,
    /// Most recent decoded sample.
    pub history0: i16,
    /// Sample before `history0`.
    pub history1: i16,
}

impl AdpcmLoopContext {
    /// Size of the context block in guest memory.
    pub const SIZE: usize = 6;

    /// Parse the little-endian guest layout.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            predictor_scale: u16::from_le_bytes([bytes[0], bytes[1]]),
            history0: i16::from_le_bytes([bytes[2], bytes[3]]),
            history1: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Byte offset of the frame holding sample `sample_index`.
#[inline]
pub fn frame_offset(sample_index: usize) -> usize {
    (sample_index / ADPCM_SAMPLES_PER_FRAME) * ADPCM_FRAME_SIZE
}

/// Number of bytes needed to hold `sample_count` samples.
#[inline]
pub fn encoded_size(sample_count: usize) -> usize {
    sample_count.div_ceil(ADPCM_SAMPLES_PER_FRAME) * ADPCM_FRAME_SIZE
}

#[inline]
fn sign_extend_nibble(nibble: u8) -> i32 {
    (i32::from(nibble) << 28) >> 28
}

/// Decode up to `output.len()` samples starting at sample `start`.
///
/// Decoding stops early at `end` (exclusive) or when `input` runs out of
/// frames. Returns the number of samples written.
///
/// # Arguments
///
/// * `output` - Destination samples
/// * `input` - Whole encoded stream
/// * `start` - Absolute sample index to start at
/// * `end` - Absolute sample index to stop before
/// * `coefficients` - Eight predictor pairs
/// * `context` - Resume state, updated as samples are produced
pub fn decode(
    output: &mut [i16],
    input: &[u8],
    start: usize,
    end: usize,
    coefficients: &[i16; ADPCM_COEFFICIENT_COUNT],
    context: &mut AdpcmLoopContext,
) -> usize {
    if start >= end {
        return 0;
    }
    let count = output.len().min(end - start);

    let mut frame = frame_offset(start);
    let mut position = start % ADPCM_SAMPLES_PER_FRAME;
    let mut hist0 = i32::from(context.history0);
    let mut hist1 = i32::from(context.history1);

    let mut written = 0;
    while written < count {
        if frame + ADPCM_FRAME_SIZE > input.len() {
            break;
        }
        if position == 0 {
            context.predictor_scale = u16::from(input[frame]);
        }

        let scale = 1_i32 << (context.predictor_scale & 0xF);
        let predictor = usize::from((context.predictor_scale >> 4) & 0x7);
        let c0 = i32::from(coefficients[predictor * 2]);
        let c1 = i32::from(coefficients[predictor * 2 + 1]);

        let byte = input[frame + 1 + position / 2];
        let nibble = if position % 2 == 0 { byte >> 4 } else { byte & 0xF };

        let value = ((sign_extend_nibble(nibble) * scale) << 11) + 1024 + c0 * hist0 + c1 * hist1;
        let sample = (value >> 11).clamp(i32::from(i16::MIN), i32::from(i16::MAX));

        output[written] = sample as i16;
        hist1 = hist0;
        hist0 = sample;
        written += 1;

        position += 1;
        if position == ADPCM_SAMPLES_PER_FRAME {
            position = 0;
            frame += ADPCM_FRAME_SIZE;
        }
    }

    context.history0 = hist0 as i16;
    context.history1 = hist1 as i16;
    written
}
