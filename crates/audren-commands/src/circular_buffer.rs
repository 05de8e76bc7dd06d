//! Circular-buffer sink: saturated PCM into a guest ring.
//!
//! Sample `y` of input `i` lands at byte `cursor + (y * stride + i) * 2`,
//! modulo the ring size. After a frame the cursor advances by
//! `sample_count * stride * 2` bytes, also modulo the ring size. An odd
//! trailing byte of the ring is never written.

use audren_core::{
    CHANNEL_COUNT_MAX, CircularBufferParameter, CircularBufferSinkState, Command, CommandContext, CommandHeader,
    CommandKind, NodeId, ProcessingTimeEstimator, StateHandle, saturate,
};

const SAMPLE_SIZE: u64 = 2;

/// Writes up to six mix buffers into a guest ring buffer.
#[derive(Debug, Clone)]
pub struct CircularBufferSinkCommand {
    header: CommandHeader,
    inputs: Vec<usize>,
    parameter: CircularBufferParameter,
    state: StateHandle<CircularBufferSinkState>,
}

impl CircularBufferSinkCommand {
    /// Sink for the inputs named by `parameter`, relative to `buffer_offset`.
    pub fn new(
        node_id: NodeId,
        buffer_offset: usize,
        parameter: CircularBufferParameter,
        state: StateHandle<CircularBufferSinkState>,
    ) -> Self {
        let count = (parameter.input_count as usize).min(CHANNEL_COUNT_MAX);
        Self {
            header: CommandHeader::new(node_id),
            inputs: parameter.input[..count]
                .iter()
                .map(|&offset| buffer_offset + usize::from(offset))
                .collect(),
            parameter,
            state,
        }
    }
}

impl Command for CircularBufferSinkCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::CircularBufferSink
    }

    fn max_buffer_index(&self) -> Option<usize> {
        self.inputs.iter().copied().max()
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.circular_buffer_sink(self.inputs.len())
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        let ring_size = u64::from(self.parameter.buffer_size) & !(SAMPLE_SIZE - 1);
        if self.parameter.buffer_address == 0 || ring_size == 0 {
            return;
        }
        let stride = u64::from(self.parameter.stride.max(1));
        let state = &mut context.states.circular_buffers[self.state];
        let cursor = u64::from(state.current_offset) % ring_size;

        for (lane, &buffer) in self.inputs.iter().enumerate() {
            for (y, &sample) in context.arena.get_const(buffer).iter().enumerate() {
                let offset = (cursor + (y as u64 * stride + lane as u64) * SAMPLE_SIZE) % ring_size;
                let Some(address) = self.parameter.buffer_address.checked_add(offset) else {
                    tracing::trace!(node_id = self.header.node_id, offset, "circular buffer address overflows");
                    break;
                };
                if let Err(error) = context.memory.write_i16(address, saturate(sample)) {
                    tracing::trace!(%error, node_id = self.header.node_id, "circular buffer write skipped");
                    break;
                }
            }
        }

        let advance = context.sample_count as u64 * stride * SAMPLE_SIZE;
        state.current_offset = ((cursor + advance) % ring_size) as u32;
    }
}
