use std::process::Command;

use tracing::debug;

/// Overrides detection when set to a boolean-ish value (`1`, `true`, `0`, `false`).
pub const FORCE_GPU_ENV: &str = "UPSCALE_FORCE_GPU";

pub const GPU_MISSING_MESSAGE: &str = "GPU not detected.. Please change runtime to GPU";

pub fn detect_gpu() -> bool {
    if let Some(forced) = std::env::var(FORCE_GPU_ENV)
        .ok()
        .and_then(|value| parse_flag(&value))
    {
        debug!(forced, "GPU detection overridden by {FORCE_GPU_ENV}");
        return forced;
    }

    match Command::new("nvidia-smi").arg("-L").output() {
        Ok(output) => {
            output.status.success() && String::from_utf8_lossy(&output.stdout).contains("GPU")
        }
        Err(err) => {
            debug!(error = %err, "nvidia-smi unavailable");
            false
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
