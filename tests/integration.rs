// SPDX-License-Identifier: MPL-2.0
use linkpage_studio::config::{self, EngineConfig, OutputFormat, LOAD_WARNING_KEY};
use linkpage_studio::domain::settings::AssetSlot;
use linkpage_studio::infrastructure::MemoryAssetHost;
use linkpage_studio::media::ImagePipeline;
use linkpage_studio::Error;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_slot_limits_follow_config_file() {
    // Create a temporary directory for the config file
    let dir = tempdir().expect("Failed to create temporary directory");

    // 1. Tighten the avatar ceiling and switch it to JPEG output
    let mut tightened = EngineConfig::default();
    tightened.avatar.max_upload_bytes = 1024;
    tightened.avatar.output_format = OutputFormat::Jpeg;
    config::save_with_override(&tightened, Some(dir.path().to_path_buf()))
        .expect("Failed to write config file");

    let (loaded, warning) = config::load_with_override(Some(dir.path().to_path_buf()));
    assert!(warning.is_none());
    assert_eq!(loaded, tightened);

    // 2. The pipeline built from it enforces the new ceiling per slot
    let pipeline = ImagePipeline::new(loaded, Arc::new(MemoryAssetHost::new()));
    let bytes = vec![0u8; 2048];
    let err = pipeline
        .prepare(AssetSlot::Avatar, bytes.clone(), "image/png")
        .unwrap_err();
    assert!(matches!(err, Error::ImageTooLarge { limit: 1024, .. }));
    // The background ceiling is untouched; these bytes fail later, on content.
    let err = pipeline
        .prepare(AssetSlot::Background, bytes, "image/png")
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedImage(_)));

    // Clean up temporary directory
    dir.close().expect("Failed to close temporary directory");
}

#[test]
fn test_invalid_config_falls_back_with_warning() {
    let dir = tempdir().expect("Failed to create temporary directory");
    std::fs::write(
        dir.path().join("engine.toml"),
        "[crop]\nmax_zoom = 1000.0\n",
    )
    .expect("Failed to write config file");

    let (loaded, warning) = config::load_with_override(Some(dir.path().to_path_buf()));
    assert_eq!(loaded, EngineConfig::default());
    assert_eq!(warning.as_deref(), Some(LOAD_WARNING_KEY));
}

#[test]
fn test_missing_config_uses_defaults_silently() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let (loaded, warning) = config::load_with_override(Some(dir.path().join("nowhere")));
    assert_eq!(loaded, EngineConfig::default());
    assert!(warning.is_none());
}
