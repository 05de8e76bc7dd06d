//! Whole-buffer housekeeping: clearing the arena and copying buffers.

use audren_core::{Command, CommandContext, CommandHeader, CommandKind, NodeId, ProcessingTimeEstimator};

/// Zeroes every mix buffer at the start of a frame.
#[derive(Debug, Clone)]
pub struct ClearMixBufferCommand {
    header: CommandHeader,
}

impl ClearMixBufferCommand {
    /// Clear command for `node_id`.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            header: CommandHeader::new(node_id),
        }
    }
}

impl Command for ClearMixBufferCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::ClearMixBuffer
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.clear_mix_buffer()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        context.arena.clear_all();
    }
}

/// Copies one buffer onto another.
#[derive(Debug, Clone)]
pub struct CopyMixBufferCommand {
    header: CommandHeader,
    input: usize,
    output: usize,
}

impl CopyMixBufferCommand {
    /// Copy `input` to `output`.
    pub fn new(node_id: NodeId, input: usize, output: usize) -> Self {
        Self {
            header: CommandHeader::new(node_id),
            input,
            output,
        }
    }
}

impl Command for CopyMixBufferCommand {
    command_header!();

    fn kind(&self) -> CommandKind {
        CommandKind::CopyMixBuffer
    }

    fn should_meter(&self) -> bool {
        false
    }

    fn max_buffer_index(&self) -> Option<usize> {
        Some(self.input.max(self.output))
    }

    fn estimate(&self, estimator: &ProcessingTimeEstimator) -> u32 {
        estimator.copy_mix_buffer()
    }

    fn process(&mut self, context: &mut CommandContext<'_>) {
        context.arena.copy(self.input, self.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn test_clear_zeroes_everything() {
        let mut harness = Harness::new(3, 4);
        harness.arena.get(1).fill(5.0);
        harness.arena.get(2).fill(-5.0);
        harness.run(&mut ClearMixBufferCommand::new(0));
        for i in 0..3 {
            assert!(harness.arena.get_const(i).iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_copy() {
        let mut harness = Harness::new(2, 4);
        harness.arena.get(0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let mut command = CopyMixBufferCommand::new(0, 0, 1);
        assert!(!command.should_meter());
        harness.run(&mut command);
        assert_eq!(harness.arena.get_const(1), &[1.0, 2.0, 3.0, 4.0]);
    }
}
