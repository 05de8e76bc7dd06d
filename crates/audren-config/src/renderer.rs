//! Renderer configuration file format and operations.

use audren_core::{CommandList, MIX_BUFFER_COUNT_MAX, ProcessingTimeEstimator, TARGET_SAMPLE_COUNT, TARGET_SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Per-command timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeteringConfig {
    /// Time each command and report the ones that overrun their estimate.
    pub enabled: bool,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Processing-time estimation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Fill each command's estimate as it is pushed.
    pub enabled: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Shape of one rendering frame.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// sample_count = 240
/// mix_buffer_count = 24
/// voice_count = 96
///
/// [metering]
/// enabled = true
///
/// [estimator]
/// enabled = true
/// ```
///
/// Every key is optional; missing keys take the defaults shown above.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RendererConfig {
    /// Mixer sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per mix buffer per frame.
    pub sample_count: usize,
    /// Buffers in the arena.
    pub mix_buffer_count: usize,
    /// Voice states the server allocates.
    pub voice_count: usize,
    /// Command timing.
    pub metering: MeteringConfig,
    /// Cost estimation.
    pub estimator: EstimatorConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sample_rate: TARGET_SAMPLE_RATE,
            sample_count: TARGET_SAMPLE_COUNT,
            mix_buffer_count: MIX_BUFFER_COUNT_MAX,
            voice_count: 96,
            metering: MeteringConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Parse a configuration from a TOML string.
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), sample_rate = config.sample_rate, "loaded renderer config");
        Ok(config)
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))
    }

    /// Check every field; see [`validate_config`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Processing-time estimator for this frame shape, if enabled.
    pub fn estimator(&self) -> Option<ProcessingTimeEstimator> {
        self.estimator
            .enabled
            .then(|| ProcessingTimeEstimator::new(self.sample_count as u32, self.mix_buffer_count as u32))
    }

    /// Empty command list sized for this configuration.
    pub fn command_list(&self) -> CommandList {
        let mut list = CommandList::new(self.mix_buffer_count, self.sample_count, self.sample_rate);
        if let Some(estimator) = self.estimator() {
            list = list.with_estimator(estimator);
        }
        list.set_metering(self.metering.enabled);
        list
    }
}
