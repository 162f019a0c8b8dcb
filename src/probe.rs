//! Source dimension probing through `ffprobe`.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, UpscaleError};
use crate::plan::VideoDimensions;

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Reads the first video stream's frame size from `path`.
pub fn probe_dimensions(ffprobe: &Path, path: &Path) -> Result<VideoDimensions> {
    if !path.is_file() {
        return Err(UpscaleError::Input(format!(
            "Not a readable video file: {}",
            path.display()
        )));
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|err| UpscaleError::Collaborator {
            tool: "ffprobe",
            detail: format!("failed to launch {}: {err}", ffprobe.display()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UpscaleError::Input(format!(
            "ffprobe could not read '{}': {}",
            path.display(),
            stderr.trim()
        )));
    }

    let dims = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
    debug!(video = %path.display(), %dims, "Probed source dimensions");
    Ok(dims)
}

pub fn parse_probe_output(json: &str) -> Result<VideoDimensions> {
    let report: ProbeReport = serde_json::from_str(json)
        .map_err(|err| UpscaleError::Input(format!("unreadable ffprobe output: {err}")))?;

    let stream = report
        .streams
        .into_iter()
        .find(|stream| stream.width.is_some() && stream.height.is_some())
        .ok_or_else(|| UpscaleError::Input("no video stream found".to_string()))?;

    VideoDimensions::new(stream.width.unwrap_or(0), stream.height.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::parse_probe_output;
    use crate::error::UpscaleError;

    #[test]
    fn reads_first_video_stream() {
        let json = r#"{"programs": [], "streams": [{"width": 1280, "height": 720}]}"#;
        let dims = parse_probe_output(json).unwrap();
        assert_eq!((dims.width, dims.height), (1280, 720));
    }

    #[test]
    fn empty_stream_list_is_input_error() {
        let err = parse_probe_output(r#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, UpscaleError::Input(_)));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = parse_probe_output(r#"{"streams": [{"width": 0, "height": 720}]}"#).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }
}
