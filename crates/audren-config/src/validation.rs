//! Renderer configuration checks.

use audren_core::{MIX_BUFFER_COUNT_MAX, TARGET_SAMPLE_RATE};
use thiserror::Error;

use crate::RendererConfig;

/// Sample rates the mixer can run at.
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [32_000, TARGET_SAMPLE_RATE];

/// Frames per second; a frame is `sample_rate / FRAMES_PER_SECOND` samples.
pub const FRAMES_PER_SECOND: u32 = 200;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Mixer rate other than 32 or 48 kHz.
    #[error("unsupported sample rate {0} Hz (expected 32000 or 48000)")]
    SampleRate(u32),

    /// Frame length that does not match the sample rate.
    #[error("sample count {actual} does not match {expected} for the configured sample rate")]
    SampleCount {
        /// Configured frame length.
        actual: usize,
        /// Frame length the sample rate requires.
        expected: usize,
    },

    /// Mix buffer count outside `1..=MIX_BUFFER_COUNT_MAX`.
    #[error("mix buffer count {0} out of range [1, {max}]", max = MIX_BUFFER_COUNT_MAX)]
    MixBufferCount(usize),

    /// No voices.
    #[error("voice count must be non-zero")]
    VoiceCount,

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check every field of `config`.
///
/// A single problem is returned as is; several are wrapped in
/// [`ValidationError::Multiple`].
pub fn validate_config(config: &RendererConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if SUPPORTED_SAMPLE_RATES.contains(&config.sample_rate) {
        let expected = (config.sample_rate / FRAMES_PER_SECOND) as usize;
        if config.sample_count != expected {
            errors.push(ValidationError::SampleCount {
                actual: config.sample_count,
                expected,
            });
        }
    } else {
        errors.push(ValidationError::SampleRate(config.sample_rate));
    }

    if !(1..=MIX_BUFFER_COUNT_MAX).contains(&config.mix_buffer_count) {
        errors.push(ValidationError::MixBufferCount(config.mix_buffer_count));
    }

    if config.voice_count == 0 {
        errors.push(ValidationError::VoiceCount);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&RendererConfig::default()), Ok(()));
    }

    #[test]
    fn test_32k_needs_160_samples() {
        let config = RendererConfig {
            sample_rate: 32_000,
            ..RendererConfig::default()
        };
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::SampleCount {
                actual: 240,
                expected: 160
            })
        );

        let config = RendererConfig {
            sample_count: 160,
            ..config
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_unsupported_rate_skips_sample_count_check() {
        let config = RendererConfig {
            sample_rate: 44_100,
            ..RendererConfig::default()
        };
        assert_eq!(validate_config(&config), Err(ValidationError::SampleRate(44_100)));
    }

    #[test]
    fn test_collects_every_problem() {
        let config = RendererConfig {
            sample_rate: 22_050,
            mix_buffer_count: 0,
            voice_count: 0,
            ..RendererConfig::default()
        };
        let Err(ValidationError::Multiple(errors)) = validate_config(&config) else {
            panic!("expected several errors");
        };
        assert_eq!(
            errors,
            vec![
                ValidationError::SampleRate(22_050),
                ValidationError::MixBufferCount(0),
                ValidationError::VoiceCount,
            ]
        );
    }

    #[test]
    fn test_mix_buffer_bounds() {
        for (count, ok) in [(1, true), (MIX_BUFFER_COUNT_MAX, true), (MIX_BUFFER_COUNT_MAX + 1, false)] {
            let config = RendererConfig {
                mix_buffer_count: count,
                ..RendererConfig::default()
            };
            assert_eq!(validate_config(&config).is_ok(), ok, "count {count}");
        }
    }

    #[test]
    fn test_multiple_display_joins() {
        let err = ValidationError::Multiple(vec![ValidationError::VoiceCount, ValidationError::MixBufferCount(30)]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: voice count must be non-zero; mix buffer count 30 out of range [1, 24]"
        );
    }
}
