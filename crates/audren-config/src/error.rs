//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur while loading, saving or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading, writing or creating a path failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration parsed but describes an unsupported renderer.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn test_io_factory_keeps_path() {
        let err = ConfigError::io("/some/path", mock_io_err());
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path == std::path::Path::new("/some/path")));
    }

    #[test]
    fn test_io_display_and_source() {
        let err = ConfigError::io("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_validation_display() {
        let err = ConfigError::from(ValidationError::VoiceCount);
        assert_eq!(err.to_string(), "validation failed: voice count must be non-zero");
    }
}
