//! Voice decoding: wave buffers in guest memory to one mix buffer.
//!
//! A data source walks the voice's wave-buffer queue, decodes as many source
//! samples as the pitch ratio requires, and converts them to the mixer rate.
//! The decode cursor (queue index, offset, loop count, ADPCM context) and the
//! resampler history live in the voice's [`VoiceUpdateState`], so consecutive
//! frames continue seamlessly.
//!
//! Guest memory is untrusted. A read that fails decodes nothing, which ends
//! the current wave buffer; whatever the frame could not decode is silence.
//!
//! | Version | Formats | Channels | Conversion quality |
//! |---------|---------|----------|--------------------|
//! | 1 | one command kind per format | mono only | always [`Default`](SampleRateConversionQuality::Default) |
//! | 2 | unified | any channel of an interleaved source | per voice |

use audren_core::{
    ADPCM_COEFFICIENT_COUNT, AdpcmLoopContext, Command, CommandContext, CommandError, CommandHeader, CommandKind,
    DECODE_SCRATCH_SIZE, DecodingBehaviour, MemoryError, MemoryManager, NodeId, ProcessingTimeEstimator,
    SampleFormat, SampleRateConversionQuality, StateHandle, VOICE_CHANNEL_COUNT_MAX, VoiceUpdateState, WaveBuffer,
    WaveBufferQueue, adpcm, copy_through, input_sample_count, resample,
};

/// Command generation of a data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataSourceVersion {
    /// Mono sources, one command kind per sample format.
    Version1,
    /// Unified command with channel selection and conversion quality.
    #[default]
    Version2,
}

/// Snapshot of the voice parameters a data source decodes with.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSource {
    /// Encoding of the wave buffers.
    pub format: SampleFormat,
    /// Interpolation used when converting to the mixer rate.
    pub quality: SampleRateConversionQuality,
    /// Decode flags.
    pub behaviour: DecodingBehaviour,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
    /// Playback speed ratio (1.0 plays at the source rate).
    pub pitch: f32,
    /// Channel of an interleaved PCM source to decode.
    pub channel_index: usize,
    /// Interleaved channels in the PCM source.
    pub channel_count: usize,
    /// Queued wave buffers.
    pub wave_buffers: WaveBufferQueue,
    /// DSP-ADPCM predictor coefficients.
    pub adpcm_coefficients: [i16; ADPCM_COEFFICIENT_COUNT],
}

impl Default for VoiceSource {
    fn default() -> Self {
        Self {
            format: SampleFormat::PcmInt16,
            quality: SampleRateConversionQuality::Default,
            behaviour: DecodingBehaviour::DEFAULT,
            sample_rate: 48_000,
            pitch: 1.0,
            channel_index: 0,
            channel_count: 1,
            wave_buffers: WaveBufferQueue::default(),
            adpcm_coefficients: [0; ADPCM_COEFFICIENT_COUNT],
        }
    }
}

/// Result of filling one decode window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decoded {
    count: usize,
    starved: bool,
}

impl VoiceSource {
    /// Fill `output` from the wave-buffer queue, advancing the cursor in `voice`.
    fn decode(
        &self,
        memory: &dyn MemoryManager,
        voice: &mut VoiceUpdateState,
        pcm: &mut Vec<i16>,
        output: &mut [f32],
    ) -> Decoded {
        let mut written = 0;
        while written < output.len() {
            let index = voice.wave_buffer_index;
            if !voice.is_wave_buffer_valid[index] {
                return Decoded {
                    count: written,
                    starved: true,
                };
            }
            let wave_buffer = &self.wave_buffers[index];

            if voice.offset == 0 && self.format == SampleFormat::Adpcm && wave_buffer.context != 0 {
                load_loop_context(memory, wave_buffer, &mut voice.loop_context);
            }

            let (start, end) = active_range(wave_buffer, voice.loop_count);
            let length = end.saturating_sub(start) as usize;
            let position = start as usize + voice.offset as usize;
            let want = (output.len() - written).min(length.saturating_sub(voice.offset as usize));

            let window = &mut output[written..written + want];
            let count = match self.read_samples(memory, wave_buffer, position, end as usize, voice, pcm, window) {
                Ok(count) => count,
                Err(error) => {
                    tracing::trace!(%error, wave_buffer = index, "wave buffer read failed");
                    0
                }
            };

            written += count;
            voice.offset += count as u32;
            voice.played_sample_count += count as u64;

            if voice.offset as usize >= length || count == 0 {
                voice.offset = 0;
                if wave_buffer.looping {
                    voice.loop_count += 1;
                    let limited = wave_buffer.loop_count >= 0;
                    if limited && (count == 0 || voice.loop_count > wave_buffer.loop_count) {
                        voice.mark_end_of_wave_buffer(wave_buffer);
                    }
                    if count == 0 {
                        return Decoded {
                            count: written,
                            starved: true,
                        };
                    }
                    if self.behaviour.contains(DecodingBehaviour::PLAYED_SAMPLE_COUNT_RESET_WHEN_LOOPING) {
                        voice.played_sample_count = 0;
                    }
                } else {
                    voice.mark_end_of_wave_buffer(wave_buffer);
                }
            }
        }

        Decoded {
            count: written,
            starved: false,
        }
    }

    /// Decode `output.len()` samples starting at absolute sample `position`.
    #[allow(clippy::too_many_arguments)]
    fn read_samples(
        &self,
        memory: &dyn MemoryManager,
        wave_buffer: &WaveBuffer,
        position: usize,
        end: usize,
        voice: &mut VoiceUpdateState,
        pcm: &mut Vec<i16>,
        output: &mut [f32],
    ) -> Result<usize, MemoryError> {
        if output.is_empty() {
            return Ok(0);
        }
        let size = usize::try_from(wave_buffer.size).unwrap_or(usize::MAX);

        match self.format {
            SampleFormat::Adpcm => {
                let bytes = memory.borrow_bytes(wave_buffer.buffer, size)?;
                pcm.clear();
                pcm.resize(output.len(), 0);
                let count = adpcm::decode(
                    pcm,
                    bytes,
                    position,
                    end,
                    &self.adpcm_coefficients,
                    &mut voice.loop_context,
                );
                for (out, &sample) in output.iter_mut().zip(&pcm[..count]) {
                    *out = f32::from(sample);
                }
                Ok(count)
            }
            SampleFormat::PcmInt16 | SampleFormat::PcmFloat => {
                let sample_size = self.format.sample_size();
                let frame_size = sample_size * self.channel_count;
                let available = (size / frame_size).min(end);
                let count = output.len().min(available.saturating_sub(position));
                if count == 0 {
                    return Ok(0);
                }

                let address = (position as u64)
                    .checked_mul(frame_size as u64)
                    .and_then(|offset| wave_buffer.buffer.checked_add(offset))
                    .ok_or(MemoryError::InvalidAddress {
                        address: wave_buffer.buffer,
                        size: count * frame_size,
                    })?;
                let bytes = memory.borrow_bytes(address, count * frame_size)?;
                let lane = self.channel_index * sample_size;
                for (out, frame) in output.iter_mut().zip(bytes.chunks_exact(frame_size)) {
                    let raw = &frame[lane..lane + sample_size];
                    *out = if self.format == SampleFormat::PcmInt16 {
                        f32::from(i16::from_le_bytes([raw[0], raw[1]]))
                    } else {
                        f32::from(audren_core::float_to_pcm(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])))
                    };
                }
                Ok(count)
            }
        }
    }
}

/// Sample range to play given how often the buffer has looped.
fn active_range(wave_buffer: &WaveBuffer, loop_count: i32) -> (u32, u32) {
    if loop_count > 0 {
        wave_buffer.loop_range()
    } else {
        wave_buffer.play_range()
    }
}

fn load_loop_context(memory: &dyn MemoryManager, wave_buffer: &WaveBuffer, context: &mut AdpcmLoopContext) {
    let mut raw = [0_u8; AdpcmLoopContext::SIZE];
    match memory.read_bytes(wave_buffer.context, &mut raw) {
        Ok(()) => *context = AdpcmLoopContext::from_bytes(&raw),
        Err(error) => tracing::trace!(%error, "adpcm loop context unreadable, keeping previous"),
    }
}

/// Decodes one channel of a voice into a mix buffer at the mixer rate.
#[derive(Debug, Clone)]
pub struct DataSourceCommand {
    header: CommandHeader,
    version: DataSourceVersion,
    source: VoiceSource,
    output: usize,
    voice: StateHandle<VoiceUpdateState>,
}

impl DataSourceCommand {
    /// Data source decoding `source` into buffer `output`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::MultichannelVersion1Source`] for a version 1 source with more than one channel
    /// - [`CommandError::UnsupportedChannelCount`] when the channel count or index is out of range
    pub fn new(
        node_id: NodeId,
        version: DataSourceVersion,
        source: VoiceSource,
        output: usize,
        voice: StateHandle<VoiceUpdateState>,
    ) -> Result<Self, CommandError> {
        if version == DataSourceVersion::Version1 && source.channel_count != 1 {
            return Err(CommandError::MultichannelVersion1Source(source.channel_count));
        }
        if source.channel_count == 0
            || source.channel_count > VOICE_CHANNEL_COUNT_MAX
            || source.channel_index >= source.channel_count
        {
            return Err(CommandError::UnsupportedChannelCount {
                effect: "data_source",
                channel_count: source.channel_count,
            });
        }
        Ok(Self {
            header: CommandHeader::new(node_id),
            version,
            source,
            output,
            voice,
        })
    }

    /// Voice parameters.
    pub fn source(&self) -> &VoiceSource {
        &self.source
    }

    fn quality(&self) -> SampleRateConversionQuality {
        match self.version {
            DataSourceVersion::Version1 => SampleRateConversionQuality::Default,
            DataSourceVersion::Version2 => self.source.quality,
        }
    }
}

impl Command for DataSourceCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        match (self.version, self.source.format) {
            (DataSourceVersion::Version2, _) => CommandKind::DataSourceVersion2,
            (DataSourceVersion::Version1, SampleFormat::PcmInt16) => CommandKind::PcmInt16DataSourceVersion1,
            (DataSourceVersion::Version1, SampleFormat::PcmFloat) => CommandKind::PcmFloatDataSourceVersion1,
            (DataSourceVersion::Version1, SampleFormat::Adpcm) => CommandKind::AdpcmDataSourceVersion1,
        }
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.output)
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        let source = &self.source;
        match self.version {
            DataSourceVersion::Version1 => {
                estimator.data_source_version1(source.format, source.sample_rate, source.pitch)
            }
            DataSourceVersion::Version2 => {
                estimator.data_source_version2(source.format, source.quality, source.sample_rate, source.pitch)
            }
        }
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let sample_count = context.sample_count;
        let skip_conversion = self
            .source
            .behaviour
            .contains(DecodingBehaviour::SKIP_PITCH_AND_SAMPLE_RATE_CONVERSION);
        let quality = self.quality();
        let taps = if skip_conversion { 0 } else { quality.history_len() };
        let ratio = self.source.sample_rate as f32 / context.sample_rate as f32 * self.source.pitch;

        let voice = &mut context.states.voices[self.voice];
        let scratch = &mut *context.scratch;
        let output = context.arena.get(self.output);
        output.fill(0.0);

        let mut fraction = voice.fraction;
        let total_needed = fraction + ratio * sample_count as f32;
        if !ratio.is_finite()
            || !total_needed.is_finite()
            || total_needed < 0.0
            || total_needed as usize + quality.history_len() > DECODE_SCRATCH_SIZE
        {
            tracing::debug!(
                node_id = self.header.node_id,
                pitch = self.source.pitch,
                ratio,
                "source ratio out of range, voice skipped"
            );
            return;
        }

        let max_per_pass = if skip_conversion || ratio <= 0.0 {
            sample_count
        } else {
            ((((DECODE_SCRATCH_SIZE - taps) as f32) - fraction) / ratio) as usize
        }
        .clamp(1, sample_count.max(1));

        let mut produced = 0;
        while produced < sample_count {
            let chunk = (sample_count - produced).min(max_per_pass);
            let needed = if skip_conversion {
                chunk
            } else {
                input_sample_count(ratio, fraction, chunk)
            };

            scratch.samples.clear();
            scratch.samples.resize(taps + needed, 0.0);
            scratch.samples[..taps].copy_from_slice(&voice.pitch_history[..taps]);

            let decoded = self
                .source
                .decode(&*context.memory, voice, &mut scratch.pcm, &mut scratch.samples[taps..]);
            let out = &mut output[produced..produced + chunk];

            if skip_conversion {
                out[..decoded.count].copy_from_slice(&scratch.samples[..decoded.count]);
            } else {
                if ratio == 1.0 && fraction == 0.0 {
                    copy_through(out, &scratch.samples[taps..]);
                } else {
                    resample(out, &scratch.samples, ratio, &mut fraction, quality);
                }
                voice.pitch_history[..taps].copy_from_slice(&scratch.samples[needed..needed + taps]);
            }

            produced += chunk;
            if decoded.starved {
                tracing::trace!(node_id = self.header.node_id, produced, "voice ran out of wave buffers");
                break;
            }
        }

        voice.fraction = fraction;
    }
}
