//! Execution engine: an ordered command list run once per audio frame.

use std::time::{Duration, Instant};

use crate::buffer::SampleBufferArena;
use crate::command::{Command, CommandContext, DecodeScratch};
use crate::device::OutputDevice;
use crate::error::CommandError;
use crate::estimator::ProcessingTimeEstimator;
use crate::memory::MemoryManager;
use crate::state::StateStore;

/// Summary of one [`CommandList::process`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Wall time of the whole pass.
    pub elapsed: Duration,
    /// Enabled commands that ran.
    pub commands_run: usize,
    /// Metered commands that exceeded their estimate.
    pub overruns: usize,
}

/// Owns the mix arena and runs commands against it, strictly in order.
///
/// ```rust
/// use audren_core::{CapturingDevice, CommandList, GuestMemory, StateStore};
///
/// let mut list = CommandList::new(4, 240, 48_000);
/// let mut states = StateStore::new(4);
/// let mut memory = GuestMemory::new(0x1000, 0x100);
/// let mut device = CapturingDevice::new(48_000, 2);
///
/// let report = list.process(&mut states, &mut memory, &mut device);
/// assert_eq!(report.commands_run, 0);
/// assert!(list.end_time() >= list.start_time());
/// ```
pub struct CommandList {
    arena: SampleBufferArena,
    scratch: DecodeScratch,
    commands: Vec<Box<dyn Command>>,
    sample_rate: u32,
    estimator: Option<ProcessingTimeEstimator>,
    estimated_total: u64,
    metering: bool,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl CommandList {
    /// Empty list over `buffer_count` buffers of `sample_count` samples.
    pub fn new(buffer_count: usize, sample_count: usize, sample_rate: u32) -> Self {
        Self {
            arena: SampleBufferArena::new(buffer_count, sample_count),
            scratch: DecodeScratch::default(),
            commands: Vec::new(),
            sample_rate,
            estimator: None,
            estimated_total: 0,
            metering: true,
            start_time: None,
            end_time: None,
        }
    }

    /// Fill estimates from `estimator` as commands are pushed.
    #[must_use]
    pub fn with_estimator(mut self, estimator: ProcessingTimeEstimator) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Enable or disable per-command timing.
    pub fn set_metering(&mut self, metering: bool) {
        self.metering = metering;
    }

    /// Append a command; list order is execution order.
    pub fn push<C: Command + 'static>(&mut self, command: C) {
        self.push_boxed(Box::new(command));
    }

    /// Append a command after checking its buffer indices against the arena.
    ///
    /// # Errors
    ///
    /// [`CommandError::BufferIndexOutOfRange`] if the command addresses a
    /// buffer the arena does not hold.
    pub fn try_push<C: Command + 'static>(&mut self, command: C) -> Result<(), CommandError> {
        let buffer_count = self.arena.buffer_count();
        if let Some(index) = command.max_buffer_index().filter(|&index| index >= buffer_count) {
            return Err(CommandError::BufferIndexOutOfRange { index, buffer_count });
        }
        self.push(command);
        Ok(())
    }

    /// Append an already boxed command.
    pub fn push_boxed(&mut self, mut command: Box<dyn Command>) {
        if let Some(estimator) = &self.estimator {
            let estimate = command.estimate(estimator);
            command.header_mut().estimated_processing_time = estimate;
            self.estimated_total += u64::from(estimate);
        }
        self.commands.push(command);
    }

    /// Drop every command and zero the arena for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.estimated_total = 0;
        self.arena.clear_all();
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    /// Commands, mutably (for toggling `enabled`).
    pub fn commands_mut(&mut self) -> &mut [Box<dyn Command>] {
        &mut self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` when no commands are queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sum of estimates of every pushed command, in nanoseconds.
    pub fn estimated_total(&self) -> u64 {
        self.estimated_total
    }

    /// The mix arena.
    pub fn arena(&self) -> &SampleBufferArena {
        &self.arena
    }

    /// The mix arena, mutably.
    pub fn arena_mut(&mut self) -> &mut SampleBufferArena {
        &mut self.arena
    }

    /// Mixer sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per buffer.
    pub fn sample_count(&self) -> usize {
        self.arena.sample_count()
    }

    /// Start of the last pass.
    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// End of the last pass.
    pub fn end_time(&self) -> Option<Instant> {
        self.end_time
    }

    /// Run every enabled command once, in order.
    ///
    /// Overruns are reported through `tracing` and counted; they never stop
    /// the pass.
    pub fn process(
        &mut self,
        states: &mut StateStore,
        memory: &mut dyn MemoryManager,
        device: &mut dyn OutputDevice,
    ) -> PassReport {
        let start = Instant::now();
        self.start_time = Some(start);

        let sample_count = self.arena.sample_count();
        let mut context = CommandContext {
            arena: &mut self.arena,
            states,
            memory,
            device,
            scratch: &mut self.scratch,
            sample_rate: self.sample_rate,
            sample_count,
        };

        let mut report = PassReport::default();
        for command in &mut self.commands {
            if !command.is_enabled() {
                continue;
            }
            report.commands_run += 1;

            if !(self.metering && command.should_meter()) {
                command.process(&mut context);
                continue;
            }

            let command_start = Instant::now();
            command.process(&mut context);
            let elapsed_ns = command_start.elapsed().as_nanos();
            let estimated_ns = command.estimated_processing_time();

            if estimated_ns > 0 && elapsed_ns > u128::from(estimated_ns) {
                report.overruns += 1;
                tracing::warn!(
                    kind = %command.kind(),
                    node_id = command.node_id(),
                    elapsed_ns = elapsed_ns as u64,
                    estimated_ns,
                    "command exceeded its processing time estimate"
                );
            }
        }

        let end = Instant::now();
        self.end_time = Some(end);
        report.elapsed = end - start;
        report
    }
}

impl core::fmt::Debug for CommandList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandList")
            .field("commands", &self.commands.len())
            .field("buffer_count", &self.arena.buffer_count())
            .field("sample_count", &self.arena.sample_count())
            .field("sample_rate", &self.sample_rate)
            .field("estimated_total", &self.estimated_total)
            .finish_non_exhaustive()
    }
}
