//! Biquad filter with Q14 coefficients.
//!
//! Voices and effects carry biquad coefficients as Q14 fixed-point integers
//! (three feedforward, two feedback; `a0` is implicitly 1). The state is a
//! Direct Form I history that lives in the server-owned state slab so it
//! survives from one frame to the next.
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
//!                - a1*y[n-1] - a2*y[n-2]
//! ```

use crate::fixed_point::{Q14, to_float};

/// Coefficients of one biquad stage as supplied by the renderer server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiquadFilterParameter {
    /// Whether the stage is active.
    pub enable: bool,
    /// `b0, b1, b2` in Q14.
    pub numerator: [i16; 3],
    /// `a1, a2` in Q14.
    pub denominator: [i16; 2],
}

impl BiquadFilterParameter {
    /// Stage that passes input through unchanged (`b0 = 1`).
    pub const PASSTHROUGH: Self = Self {
        enable: true,
        numerator: [1 << 14, 0, 0],
        denominator: [0, 0],
    };

    /// Build a stage from float coefficients, truncating to Q14.
    pub fn from_coefficients(b: [f32; 3], a: [f32; 2]) -> Self {
        let q = |v: f32| (v * (1 << Q14) as f32) as i16;
        Self {
            enable: true,
            numerator: [q(b[0]), q(b[1]), q(b[2])],
            denominator: [q(a[0]), q(a[1])],
        }
    }

    /// Float coefficients `(b0, b1, b2, a1, a2)`.
    #[inline]
    pub fn coefficients(&self) -> (f32, f32, f32, f32, f32) {
        let f = |v: i16| to_float(i64::from(v), Q14);
        (
            f(self.numerator[0]),
            f(self.numerator[1]),
            f(self.numerator[2]),
            f(self.denominator[0]),
            f(self.denominator[1]),
        )
    }
}

/// Direct Form I history of one biquad stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadFilterState {
    /// x[n-1]
    pub x1: f32,
    /// x[n-2]
    pub x2: f32,
    /// y[n-1]
    pub y1: f32,
    /// y[n-2]
    pub y2: f32,
}

impl BiquadFilterState {
    /// Zero the history.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Filter one sample and advance the history.
    #[inline]
    pub fn process(&mut self, coefficients: (f32, f32, f32, f32, f32), input: f32) -> f32 {
        let (b0, b1, b2, a1, a2) = coefficients;
        let output = b0 * input + b1 * self.x1 + b2 * self.x2 - a1 * self.y1 - a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Run one stage over a block.
///
/// `output` and `input` must have the same length.
pub fn process_biquad_filter(
    parameter: &BiquadFilterParameter,
    state: &mut BiquadFilterState,
    output: &mut [f32],
    input: &[f32],
) {
    let coefficients = parameter.coefficients();
    for (out, &x) in output.iter_mut().zip(input) {
        *out = state.process(coefficients, x);
    }
}

/// Run one stage in place.
pub fn process_biquad_filter_in_place(
    parameter: &BiquadFilterParameter,
    state: &mut BiquadFilterState,
    buffer: &mut [f32],
) {
    let coefficients = parameter.coefficients();
    for sample in buffer.iter_mut() {
        *sample = state.process(coefficients, *sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let mut state = BiquadFilterState::default();
        let input = [1.0, -2.0, 3.0, 100.0];
        let mut output = [0.0; 4];
        process_biquad_filter(
            &BiquadFilterParameter::PASSTHROUGH,
            &mut state,
            &mut output,
            &input,
        );
        assert_eq!(output, input);
    }

    #[test]
    fn test_q14_conversion() {
        let p = BiquadFilterParameter {
            enable: true,
            numerator: [0x2000, -0x2000, 0x1000],
            denominator: [0x4000, -0x1000],
        };
        assert_eq!(p.coefficients(), (0.5, -0.5, 0.25, 1.0, -0.25));
    }

    #[test]
    fn test_from_coefficients_truncates() {
        let p = BiquadFilterParameter::from_coefficients([0.5, 0.25, 0.0], [-0.5, 0.125]);
        assert_eq!(p.numerator, [0x2000, 0x1000, 0]);
        assert_eq!(p.denominator, [-0x2000, 0x0800]);
    }

    #[test]
    fn test_feedback_uses_history() {
        // y[n] = x[n] + 0.5 * y[n-1]  (a1 = -0.5)
        let p = BiquadFilterParameter::from_coefficients([1.0, 0.0, 0.0], [-0.5, 0.0]);
        let mut state = BiquadFilterState::default();
        let mut buffer = [1.0, 0.0, 0.0];
        process_biquad_filter_in_place(&p, &mut state, &mut buffer);
        assert_eq!(buffer, [1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_clear() {
        let mut state = BiquadFilterState { x1: 1.0, x2: 2.0, y1: 3.0, y2: 4.0 };
        state.clear();
        assert_eq!(state, BiquadFilterState::default());
    }
}
