//! Delay lines for the delay and reverb states.
//!
//! [`DelayLine`] is a ring buffer whose capacity is fixed at construction
//! (from a maximum delay time) and whose active length can be changed later
//! without discarding its contents. [`DecayDelay`] wraps one as a Schroeder
//! allpass used for diffusion in the reverb feedback network.
//!
//! # Indexing
//!
//! The line remembers the last `delay` written samples. [`DelayLine::read`]
//! returns the oldest of them (the sample written `delay` updates ago) and
//! [`DelayLine::tap`] returns the sample written `n` updates ago, `1..=delay`.

use libm::roundf;

use crate::math::flush_denormal;

/// Samples covered by `delay_time_ms` at `sample_rate`, rounded to nearest.
#[inline]
pub fn delay_time_to_samples(sample_rate: u32, delay_time_ms: f32) -> usize {
    let samples = roundf(sample_rate as f32 * delay_time_ms / 1000.0);
    if samples > 0.0 { samples as usize } else { 0 }
}

/// Ring buffer with a reconfigurable active length.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    position: usize,
    delay: usize,
    sample_rate: u32,
}

impl DelayLine {
    /// Creates a zeroed line able to hold up to `max_delay_ms`.
    ///
    /// The active delay starts at the full capacity.
    pub fn new(sample_rate: u32, max_delay_ms: f32) -> Self {
        let capacity = delay_time_to_samples(sample_rate, max_delay_ms).max(1);
        Self {
            buffer: vec![0.0; capacity],
            position: 0,
            delay: capacity,
            sample_rate,
        }
    }

    /// Maximum delay in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Sample rate the line was built for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set the active delay in samples, clamped to `1..=capacity()`.
    ///
    /// Stored samples are kept. The cursor only moves when it falls outside
    /// the new window.
    pub fn configure_delay(&mut self, samples: usize) {
        self.delay = samples.clamp(1, self.buffer.len());
        if self.position >= self.delay {
            self.position = 0;
        }
    }

    /// Set the active delay in milliseconds.
    pub fn set_delay(&mut self, delay_time_ms: f32) {
        self.configure_delay(delay_time_to_samples(self.sample_rate, delay_time_ms));
    }

    /// Oldest sample in the active window.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.position]
    }

    /// Write `value` and return the new oldest sample.
    #[inline]
    pub fn update(&mut self, value: f32) -> f32 {
        self.buffer[self.position] = flush_denormal(value);
        self.position += 1;
        if self.position >= self.delay {
            self.position = 0;
        }
        self.read()
    }

    /// Sample written `samples_ago` updates ago, clamped to `1..=delay()`.
    #[inline]
    pub fn tap(&self, samples_ago: usize) -> f32 {
        let back = samples_ago.clamp(1, self.delay);
        let index = (self.position + self.delay - back) % self.delay;
        self.buffer[index]
    }

    /// Zero the contents.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.position = 0;
    }
}

/// Schroeder allpass built on a [`DelayLine`].
///
/// ```text
/// w[n] = x[n] - g * w[n-D]
/// y[n] = g * w[n] + w[n-D]
/// ```
#[derive(Debug, Clone)]
pub struct DecayDelay {
    line: DelayLine,
    decay_rate: f32,
}

impl DecayDelay {
    /// Wrap a delay line with a zero decay rate.
    pub fn new(line: DelayLine) -> Self {
        Self {
            line,
            decay_rate: 0.0,
        }
    }

    /// Set the allpass gain `g`.
    pub fn set_decay_rate(&mut self, decay_rate: f32) {
        self.decay_rate = decay_rate;
    }

    /// Current allpass gain.
    pub fn decay_rate(&self) -> f32 {
        self.decay_rate
    }

    /// Set the allpass delay in milliseconds.
    pub fn set_delay(&mut self, delay_time_ms: f32) {
        self.line.set_delay(delay_time_ms);
    }

    /// Current delay in samples.
    pub fn delay(&self) -> usize {
        self.line.delay()
    }

    /// Process one sample.
    #[inline]
    pub fn update(&mut self, value: f32) -> f32 {
        let delayed = self.line.read();
        let processed = value - self.decay_rate * delayed;
        self.line.update(processed);
        processed * self.decay_rate + delayed
    }

    /// Zero the contents.
    pub fn clear(&mut self) {
        self.line.clear();
    }
}
