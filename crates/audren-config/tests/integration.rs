//! Integration tests for audren-config.
//!
//! Load/save through the filesystem and the hand-off to the engine.

use audren_config::{ConfigError, RendererConfig, ValidationError};
use audren_core::{CapturingDevice, GuestMemory, StateStore};
use tempfile::TempDir;

// ============================================================================
// 1. Files
// ============================================================================

#[test]
fn save_then_load_preserves_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("renderer.toml");

    let config = RendererConfig {
        sample_rate: 32_000,
        sample_count: 160,
        mix_buffer_count: 8,
        voice_count: 32,
        ..RendererConfig::default()
    };
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = RendererConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("renderer.toml");
    std::fs::write(&path, "sample_rate = 44100\n").unwrap();

    let result = RendererConfig::load(&path);
    assert!(matches!(
        result,
        Err(ConfigError::Validation(ValidationError::SampleRate(44_100)))
    ));
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = RendererConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

// ============================================================================
// 2. Engine hand-off
// ============================================================================

#[test]
fn configured_list_runs_an_empty_frame() {
    let config = RendererConfig::default();
    let mut list = config.command_list();
    let mut states = StateStore::new(config.mix_buffer_count);
    let mut memory = GuestMemory::new(0, 0);
    let mut device = CapturingDevice::new(config.sample_rate, 2);

    let report = list.process(&mut states, &mut memory, &mut device);
    assert_eq!(report.commands_run, 0);
    assert_eq!(list.arena().sample_count(), config.sample_count);
    assert!(list.end_time().is_some());
}
