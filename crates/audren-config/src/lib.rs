//! Renderer configuration for the audren DSP pipeline.
//!
//! A [`RendererConfig`] describes the frame shape (sample rate, samples per
//! frame, mix buffers, voices) and whether commands are metered and
//! estimated. It is stored as TOML, validated as a whole, and turned into an
//! empty [`audren_core::CommandList`] ready for the server to fill.
//!
//! # Example
//!
//! ```rust
//! use audren_config::RendererConfig;
//!
//! let config = RendererConfig::from_toml_str(
//!     r#"
//!     sample_rate = 32000
//!     sample_count = 160
//!     mix_buffer_count = 6
//!     "#,
//! )
//! .unwrap();
//! config.validate().unwrap();
//!
//! let list = config.command_list();
//! assert_eq!(list.sample_count(), 160);
//! ```

mod error;
mod renderer;

/// Configuration validation.
pub mod validation;

pub use error::ConfigError;
pub use renderer::{EstimatorConfig, MeteringConfig, RendererConfig};
pub use validation::{FRAMES_PER_SECOND, SUPPORTED_SAMPLE_RATES, ValidationError, ValidationResult, validate_config};
