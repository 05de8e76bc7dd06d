//! Renders a short voice through a complete command list and writes a WAV.
//!
//! One PCM16 tone sits in guest memory. Every frame the list decodes it,
//! ramps it into a stereo mix, runs a feedback delay over the mix and sinks
//! the result to a capturing device. The voice stops halfway through, so the
//! second half shows the delay tail and the depop fade.
//!
//! Run with: cargo run -p audren-commands --example render_demo [output.wav]
//! Set `RUST_LOG=debug` to see state construction and overrun warnings.

use audren_commands::{
    ClearMixBufferCommand, DataSourceCommand, DataSourceVersion, DelayCommand, DepopForMixBuffersCommand,
    DepopPrepareCommand, DeviceSinkCommand, MixRampGroupedCommand, VoiceSource,
};
use audren_core::{
    CapturingDevice, CommandList, DelayParameter, DelayState, GuestMemory, ProcessingTimeEstimator, StateStore,
    UsageState, VoiceUpdateState, WaveBuffer,
};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: u32 = 48_000;
const SAMPLE_COUNT: usize = 240;
const MIX_BUFFER_COUNT: usize = 3;
const VOICE_BUFFER: usize = 2;
const FRAMES: usize = 400;
const BASE: u64 = 0x8000_0000;

fn tone(frequency: f32, seconds: f32, amplitude: f32) -> Vec<i16> {
    let count = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            ((2.0 * std::f32::consts::PI * frequency * t).sin() * amplitude) as i16
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "render_demo.wav".to_string());

    let samples = tone(440.0, 1.0, 12_000.0);
    let mut memory = GuestMemory::new(BASE, samples.len() * 2);
    memory.write_i16_slice(BASE, &samples)?;

    let mut source = VoiceSource::default();
    source.wave_buffers[0] = WaveBuffer {
        buffer: BASE,
        size: (samples.len() * 2) as u64,
        end_sample_offset: samples.len() as u32,
        is_end_of_stream: true,
        ..WaveBuffer::default()
    };

    let mut states = StateStore::new(MIX_BUFFER_COUNT);
    let mut voice = VoiceUpdateState::default();
    voice.queue_wave_buffers(1);
    let voice = states.insert(voice);
    let delay = states.insert(DelayState::default());

    let mut parameter = DelayParameter {
        channel_count_max: 2,
        channel_count: 2,
        delay_time_max: 500,
        delay_time: 180,
        feedback_gain: 0x2400,
        out_gain: 0x2000,
        channel_spread: 0x0800,
        low_pass_amount: 0x1000,
        ..DelayParameter::default()
    };

    let estimator = ProcessingTimeEstimator::new(SAMPLE_COUNT as u32, MIX_BUFFER_COUNT as u32);
    let mut list = CommandList::new(MIX_BUFFER_COUNT, SAMPLE_COUNT, SAMPLE_RATE).with_estimator(estimator);
    let mut device = CapturingDevice::new(SAMPLE_RATE, 2);
    let mut overruns = 0;
    let mut was_playing = false;

    for frame in 0..FRAMES {
        let playing = states.voices[voice].has_pending_wave_buffer();

        list.clear();
        list.push(ClearMixBufferCommand::new(0));
        list.push(DepopPrepareCommand::new(1, voice, 0, 2, was_playing && !playing));
        if playing {
            list.push(DataSourceCommand::new(
                1,
                DataSourceVersion::Version2,
                source.clone(),
                VOICE_BUFFER,
                voice,
            )?);
            list.push(MixRampGroupedCommand::new(1, VOICE_BUFFER, 0, &[0.7, 0.5], &[0.7, 0.5], voice)?);
        }
        list.push(DepopForMixBuffersCommand::new(2, 0, 2, SAMPLE_RATE));
        list.push(DelayCommand::new(3, 0, parameter, delay, true, 0)?);
        list.push(DeviceSinkCommand::new(4, &[0, 1], None));

        if frame == 0 {
            tracing::info!(
                commands = list.len(),
                estimated_ns = list.estimated_total(),
                "first frame built"
            );
        }

        overruns += list.process(&mut states, &mut memory, &mut device).overruns;
        parameter.status = UsageState::Unchanged;
        was_playing = playing;
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in device.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::info!(path = %path, frames = device.frame_count(), overruns, "render complete");
    Ok(())
}
