use std::fs;
use std::path::PathBuf;

use esrgan_upscale::UpscaleError;
use esrgan_upscale::config::{DEFAULT_PYTHON_RUNTIME, UpscaleConfig};
use tempfile::tempdir;

#[test]
fn partial_yaml_keeps_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("upscale.yaml");
    fs::write(
        &path,
        r#"python_runtime: /opt/conda/bin/python
strict: true
crop:
  hwaccel: null
  codec: libx265
"#,
    )
    .unwrap();

    let config = UpscaleConfig::load(&path).unwrap();
    assert_eq!(config.python_runtime, PathBuf::from("/opt/conda/bin/python"));
    assert!(config.strict);
    assert_eq!(config.crop.hwaccel, None);
    assert_eq!(config.crop.codec, "libx265");
    assert_eq!(config.crop.pixel_format, "yuv420p");
    assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
}

#[test]
fn empty_file_yields_defaults() {
    let config = UpscaleConfig::from_yaml("  \n").unwrap();
    assert_eq!(config, UpscaleConfig::default());
    assert_eq!(config.python_runtime, PathBuf::from(DEFAULT_PYTHON_RUNTIME));
    assert_eq!(config.crop.hwaccel.as_deref(), Some("cuda"));
}

#[test]
fn empty_codec_is_rejected() {
    let err = UpscaleConfig::from_yaml("crop:\n  codec: \"\"\n").unwrap_err();
    assert!(matches!(err, UpscaleError::Config(_)));
}

#[test]
fn missing_file_is_config_error() {
    let temp = tempdir().unwrap();
    let err = UpscaleConfig::load(&temp.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, UpscaleError::Config(_)));
}
