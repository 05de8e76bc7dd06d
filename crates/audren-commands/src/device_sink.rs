//! Final hand-off of rendered audio to the output device.

use audren_core::{
    Command, CommandContext, CommandHeader, CommandKind, NodeId, ProcessingTimeEstimator, StateHandle,
    TARGET_SAMPLE_RATE, UpsamplerState, saturate,
};

/// Interleaves saturated PCM for the device, one input per device channel.
///
/// Inputs come from the mix arena, or from an upsampler's output buffers
/// when the mixer runs below the target rate. Device channels without an
/// input are silent.
#[derive(Debug, Clone)]
pub struct DeviceSinkCommand {
    header: CommandHeader,
    inputs: Vec<usize>,
    upsampler: Option<StateHandle<UpsamplerState>>,
    pcm: Vec<i16>,
}

impl DeviceSinkCommand {
    /// Sink reading arena buffers `inputs`, or channels of `upsampler` when given.
    pub fn new(node_id: NodeId, inputs: &[usize], upsampler: Option<StateHandle<UpsamplerState>>) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            inputs: inputs.to_vec(),
            upsampler,
            pcm: Vec::new(),
        }
    }
}

impl Command for DeviceSinkCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::DeviceSink
    }

    fn max_buffer_index(&self) -> Option<usize> {
        match self.upsampler {
            Some(_) => None,
            None => self.inputs.iter().copied().max(),
        }
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.device_sink(self.inputs.len())
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let device_rate = context.device.sample_rate();
        if device_rate != TARGET_SAMPLE_RATE {
            tracing::error!(device_rate, target_rate = TARGET_SAMPLE_RATE, "device sample rate mismatch");
            unimplemented!("device sample rate {device_rate} differs from {TARGET_SAMPLE_RATE}");
        }

        let channel_count = context.device.channel_count() as usize;
        let upsampler = self.upsampler.map(|handle| &context.states.upsamplers[handle]);
        let frame_count = upsampler.map_or(context.sample_count, UpsamplerState::output_sample_count);
        let sources = self.inputs.len().min(channel_count);

        self.pcm.clear();
        self.pcm.resize(frame_count * channel_count, 0);
        for channel in 0..sources {
            let samples = match upsampler {
                Some(upsampler) if channel < upsampler.channel_count() => upsampler.output(channel),
                Some(_) => continue,
                None => context.arena.get_const(self.inputs[channel]),
            };
            for (frame, &sample) in samples.iter().take(frame_count).enumerate() {
                self.pcm[frame * channel_count + channel] = saturate(sample);
            }
        }

        context.device.append_buffer(&self.pcm, frame_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn test_interleaves_stereo() {
        let mut harness = Harness::new(2, 3);
        harness.arena.get(0).copy_from_slice(&[1.0, 2.0, 40_000.0]);
        harness.arena.get(1).copy_from_slice(&[-1.0, -2.0, -40_000.0]);
        harness.run(&mut DeviceSinkCommand::new(0, &[0, 1], None));

        assert_eq!(harness.device.samples(), &[1, -1, 2, -2, i16::MAX, i16::MIN]);
        assert_eq!(harness.device.frame_count(), 3);
    }

    #[test]
    fn test_missing_channels_are_silent() {
        let mut harness = Harness::new(1, 2);
        harness.arena.get(0).fill(9.0);
        harness.run(&mut DeviceSinkCommand::new(0, &[0], None));
        assert_eq!(harness.device.samples(), &[9, 0, 9, 0]);
    }

    #[test]
    fn test_reads_upsampler_output() {
        let mut harness = Harness::new(2, 160).with_sample_rate(32_000);
        let state = harness.states.insert(UpsamplerState::new(2, 240));
        let mut command = DeviceSinkCommand::new(0, &[0, 1], Some(state));
        assert_eq!(command.max_buffer_index(), None);
        harness.run(&mut command);
        assert_eq!(harness.device.frame_count(), 240);
        assert_eq!(harness.device.samples().len(), 480);
    }

    #[test]
    #[should_panic(expected = "device sample rate")]
    fn test_device_rate_mismatch_is_fatal() {
        let mut harness = Harness::new(1, 2);
        harness.device = audren_core::CapturingDevice::new(44_100, 2);
        harness.run(&mut DeviceSinkCommand::new(0, &[0], None));
    }
}
