//! Per-voice decode and mix bookkeeping.

use crate::adpcm::AdpcmLoopContext;
use crate::constants::{MIX_BUFFER_COUNT_MAX, PITCH_HISTORY_MAX, VOICE_WAVE_BUFFER_COUNT};
use crate::parameter::WaveBuffer;

/// Decode cursor, resampler history and last mixed samples of one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceUpdateState {
    /// Fractional resampler position.
    pub fraction: f32,
    /// Wave buffer currently playing.
    pub wave_buffer_index: usize,
    /// Offset in samples into the current pass of that buffer.
    pub offset: u32,
    /// Samples played since the stream started (or last reset).
    pub played_sample_count: u64,
    /// Wave buffers finished so far.
    pub wave_buffer_consumed: u32,
    /// Loops completed on the current buffer.
    pub loop_count: i32,
    /// Which queue slots hold a buffer still to play.
    pub is_wave_buffer_valid: [bool; VOICE_WAVE_BUFFER_COUNT],
    /// Tail of the previous frame's decoded samples.
    pub pitch_history: [f32; PITCH_HISTORY_MAX],
    /// Last sample mixed into each mix buffer, consumed by depop.
    pub last_samples: [f32; MIX_BUFFER_COUNT_MAX],
    /// ADPCM resume state.
    pub loop_context: AdpcmLoopContext,
}

impl Default for VoiceUpdateState {
    fn default() -> Self {
        Self {
            fraction: 0.0,
            wave_buffer_index: 0,
            offset: 0,
            played_sample_count: 0,
            wave_buffer_consumed: 0,
            loop_count: 0,
            is_wave_buffer_valid: [false; VOICE_WAVE_BUFFER_COUNT],
            pitch_history: [0.0; PITCH_HISTORY_MAX],
            last_samples: [0.0; MIX_BUFFER_COUNT_MAX],
            loop_context: AdpcmLoopContext::default(),
        }
    }
}

impl VoiceUpdateState {
    /// Mark the first `count` queue slots as holding buffers to play.
    pub fn queue_wave_buffers(&mut self, count: usize) {
        for (i, valid) in self.is_wave_buffer_valid.iter_mut().enumerate() {
            *valid = i < count;
        }
    }

    /// Retire the current wave buffer and move to the next slot.
    pub fn mark_end_of_wave_buffer(&mut self, wave_buffer: &WaveBuffer) {
        self.is_wave_buffer_valid[self.wave_buffer_index] = false;
        self.wave_buffer_consumed += 1;
        self.wave_buffer_index = (self.wave_buffer_index + 1) % VOICE_WAVE_BUFFER_COUNT;
        self.offset = 0;
        self.loop_count = 0;

        if wave_buffer.is_end_of_stream {
            self.played_sample_count = 0;
        }
    }

    /// Whether any queued buffer is left to play.
    pub fn has_pending_wave_buffer(&self) -> bool {
        self.is_wave_buffer_valid.iter().any(|&v| v)
    }
}
