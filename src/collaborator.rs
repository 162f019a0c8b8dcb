//! Command-line contracts for the external inference and transcoding tools.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::config::{CropSettings, UpscaleConfig};
use crate::model::InferenceModel;
use crate::plan::OutputPlan;

pub const INFERENCE_TOOL: &str = "inference";
pub const CROP_TOOL: &str = "crop";

/// A single external program launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(tool: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished collaborator process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CollaboratorOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches collaborators. Blocks until the child exits.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CollaboratorOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CollaboratorOutput> {
        let output = invocation.to_command().output()?;
        Ok(CollaboratorOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorReport {
    pub tool: &'static str,
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CollaboratorReport {
    pub fn new(invocation: &Invocation, output: CollaboratorOutput) -> Self {
        Self {
            tool: invocation.tool,
            command_line: invocation.to_string(),
            exit_code: output.exit_code,
            success: output.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// `<runtime> <script> -n <model> -i <video> -o <dir> --outscale <scale>`
pub fn inference_invocation(
    config: &UpscaleConfig,
    model: InferenceModel,
    video_path: &Path,
    output_dir: &Path,
    scale_factor: f64,
) -> Invocation {
    Invocation::new(INFERENCE_TOOL, &config.python_runtime)
        .arg(&config.inference_script)
        .args(["-n", model.as_str()])
        .arg("-i")
        .arg(video_path)
        .arg("-o")
        .arg(output_dir)
        .arg("--outscale")
        .arg(scale_factor.to_string())
}

pub fn crop_filter(plan: &OutputPlan) -> String {
    let (x, y) = plan.crop_offsets();
    format!("crop={}:{}:{x}:{y}", plan.final_width, plan.final_height)
}

/// Centered crop of `raw` down to the plan's final size, overwriting `destination`.
pub fn crop_invocation(
    ffmpeg: &Path,
    settings: &CropSettings,
    plan: &OutputPlan,
    raw: &Path,
    destination: &Path,
) -> Invocation {
    let mut invocation =
        Invocation::new(CROP_TOOL, ffmpeg).args(["-loglevel", settings.loglevel.as_str()]);
    if let Some(hwaccel) = settings.hwaccel.as_deref() {
        invocation = invocation.args(["-hwaccel", hwaccel]);
    }
    invocation
        .args(["-y", "-i"])
        .arg(raw)
        .arg("-filter:v")
        .arg(crop_filter(plan))
        .args(["-c:v", settings.codec.as_str()])
        .args(["-pix_fmt", settings.pixel_format.as_str()])
        .arg(destination)
}
