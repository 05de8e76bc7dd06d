//! One-pole smoothers used inside effect feedback paths.
//!
//! - [`ExponentialMovingAverage`]: the limiter's envelope and gain followers,
//!   `mean += alpha * (x - mean)` with a per-call coefficient so attack and
//!   release can share one state.
//! - [`DecayFilter`]: loop-gain plus high-frequency damping for a feedback
//!   delay line,
//!
//! ```text
//! y[n] = direct * x[n] + previous * y[n-1]
//! ```
//!
//! with `direct` and `previous` chosen so the DC gain equals the loop gain and
//! the Nyquist gain equals the (smaller) high-frequency loop gain.
//!
//! # Reference
//!
//! Jean-Marc Jot, "An analysis/synthesis approach to real-time artificial
//! reverberation", ICASSP 1992.

use crate::math::{flush_denormal, pow10};

/// Exponential moving average with an externally supplied coefficient.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExponentialMovingAverage {
    mean: f32,
}

impl ExponentialMovingAverage {
    /// Start at `mean`.
    pub fn new(mean: f32) -> Self {
        Self { mean }
    }

    /// Current value.
    #[inline]
    pub fn read(&self) -> f32 {
        self.mean
    }

    /// Move toward `value` by `alpha` and return the new mean.
    #[inline]
    pub fn update(&mut self, value: f32, alpha: f32) -> f32 {
        self.mean = flush_denormal(self.mean + alpha * (value - self.mean));
        self.mean
    }
}

/// Loop-gain filter for one feedback delay line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayFilter {
    direct: f32,
    previous: f32,
    last: f32,
}

impl DecayFilter {
    /// High-frequency ratios at or above this are treated as no damping.
    pub const FLAT_RATIO: f32 = 0.995;

    /// Coefficients for a loop of `loop_samples` samples.
    ///
    /// # Arguments
    ///
    /// * `loop_samples` - Total delay around the feedback loop
    /// * `decay_time` - Time for the loop to decay by 60 dB, in seconds
    /// * `hf_ratio` - High-frequency decay time relative to `decay_time`
    /// * `sample_rate` - Sample rate in Hz
    pub fn configure(&mut self, loop_samples: usize, decay_time: f32, hf_ratio: f32, sample_rate: u32) {
        let rate = sample_rate as f32;
        let decay_time = decay_time.max(1e-3);
        let exponent = -3.0 * loop_samples as f32 / (decay_time * rate);
        let gain = pow10(exponent);

        if hf_ratio >= Self::FLAT_RATIO || hf_ratio <= 0.0 {
            self.direct = gain;
            self.previous = 0.0;
            return;
        }

        let hf_gain = pow10(exponent / hf_ratio);
        self.previous = (gain - hf_gain) / (gain + hf_gain);
        self.direct = gain * (1.0 - self.previous);
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.last = flush_denormal(self.direct * input + self.previous * self.last);
        self.last
    }

    /// Feedforward gain.
    pub fn direct(&self) -> f32 {
        self.direct
    }

    /// Feedback gain.
    pub fn previous(&self) -> f32 {
        self.previous
    }

    /// Zero the history, keeping coefficients.
    pub fn clear(&mut self) {
        self.last = 0.0;
    }
}
