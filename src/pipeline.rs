use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::collaborator::{
    CollaboratorReport, CommandRunner, Invocation, SystemRunner, crop_invocation,
    inference_invocation,
};
use crate::config::UpscaleConfig;
use crate::error::{Result, UpscaleError};
use crate::gpu;
use crate::model::InferenceModel;
use crate::observability::MetricsCollector;
use crate::plan::{OutputPlan, ResolutionPolicy, VideoDimensions, plan};
use crate::probe::probe_dimensions;

/// One source video to upscale.
#[derive(Debug, Clone)]
pub struct UpscaleJob {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub policy: ResolutionPolicy,
    pub model: InferenceModel,
    /// Known source size; skips probing when set.
    pub dimensions: Option<VideoDimensions>,
}

impl UpscaleJob {
    pub fn new(video_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            output_dir: output_dir.into(),
            policy: ResolutionPolicy::default(),
            model: InferenceModel::default(),
            dimensions: None,
        }
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_model(mut self, model: InferenceModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_dimensions(mut self, dimensions: VideoDimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifacts {
    /// What the inference tool writes: `<dir>/<stem>_out.mp4`.
    pub raw: PathBuf,
    /// Cropped result, only for fixed-target policies.
    pub cropped: Option<PathBuf>,
}

impl OutputArtifacts {
    pub fn final_path(&self) -> &Path {
        self.cropped.as_deref().unwrap_or(&self.raw)
    }
}

/// Source file stem, which the inference tool also uses to name its output.
pub fn base_name(video_path: &Path) -> Result<String> {
    video_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            UpscaleError::Input(format!(
                "Cannot derive a file name from {}",
                video_path.display()
            ))
        })
}

pub fn artifact_paths(
    plan: &OutputPlan,
    video_path: &Path,
    output_dir: &Path,
) -> Result<OutputArtifacts> {
    let base = base_name(video_path)?;
    let raw = output_dir.join(format!("{base}_out.mp4"));
    let cropped = plan.requires_crop().then(|| {
        output_dir.join(format!(
            "{base}_upscaled_{}_{}.mp4",
            plan.final_width, plan.final_height
        ))
    });
    Ok(OutputArtifacts { raw, cropped })
}

#[derive(Debug, Clone)]
pub struct UpscaleOutcome {
    pub plan: OutputPlan,
    pub artifacts: OutputArtifacts,
    pub collaborators: Vec<CollaboratorReport>,
}

impl UpscaleOutcome {
    pub fn final_path(&self) -> &Path {
        self.artifacts.final_path()
    }

    pub fn crop_invoked(&self) -> bool {
        self.collaborators
            .iter()
            .any(|report| report.tool == crate::collaborator::CROP_TOOL)
    }
}

/// Drives probe, plan, inference and crop for a job, strictly in sequence.
pub struct Upscaler<R: CommandRunner = SystemRunner> {
    config: UpscaleConfig,
    runner: R,
    gpu_detector: fn() -> bool,
    metrics: MetricsCollector,
}

impl Upscaler<SystemRunner> {
    pub fn new(config: UpscaleConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Upscaler<R> {
    pub fn with_runner(config: UpscaleConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            gpu_detector: gpu::detect_gpu,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_gpu_detector(mut self, detector: fn() -> bool) -> Self {
        self.gpu_detector = detector;
        self
    }

    pub fn config(&self) -> &UpscaleConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Fatal checks that run before any planning work.
    pub fn preflight(&self, job: &UpscaleJob) -> Result<()> {
        if !(self.gpu_detector)() {
            return Err(UpscaleError::Environment(
                gpu::GPU_MISSING_MESSAGE.to_string(),
            ));
        }
        if !job.video_path.exists() {
            return Err(UpscaleError::Input(format!(
                "Video file does not exist: {}",
                job.video_path.display()
            )));
        }
        Ok(())
    }

    pub fn source_dimensions(&self, job: &UpscaleJob) -> Result<VideoDimensions> {
        let _timer = self.metrics.start_stage("probe");
        match job.dimensions {
            Some(dims) => {
                dims.validate()?;
                debug!(%dims, "Using supplied source dimensions");
                Ok(dims)
            }
            None => probe_dimensions(&self.config.ffprobe, &job.video_path),
        }
    }

    /// Preflight, probe and plan without launching any collaborator.
    #[instrument(skip(self, job), fields(video = %job.video_path.display()))]
    pub fn prepare(&self, job: &UpscaleJob) -> Result<OutputPlan> {
        self.preflight(job)?;
        let source = self.source_dimensions(job)?;
        let output_plan = {
            let _timer = self.metrics.start_stage("plan");
            plan(source, job.policy)?
        };
        info!(
            "Upscaling from {} to {}x{}, scale_factor={}",
            source, output_plan.final_width, output_plan.final_height, output_plan.scale_factor
        );
        Ok(output_plan)
    }

    #[instrument(skip(self, job), fields(video = %job.video_path.display(), policy = %job.policy))]
    pub fn run(&self, job: &UpscaleJob) -> Result<UpscaleOutcome> {
        self.metrics.reset();
        let started = Instant::now();
        let output_plan = self.prepare(job)?;
        let outcome = self.execute(&output_plan, job);
        self.metrics.record_total_duration(started.elapsed());
        outcome
    }

    /// Runs inference and, for fixed-target policies, the centered crop.
    pub fn execute(&self, output_plan: &OutputPlan, job: &UpscaleJob) -> Result<UpscaleOutcome> {
        if !job.output_dir.as_os_str().is_empty() && !job.output_dir.is_dir() {
            fs::create_dir_all(&job.output_dir)?;
        }
        let artifacts = artifact_paths(output_plan, &job.video_path, &job.output_dir)?;
        let mut collaborators = Vec::with_capacity(2);

        let inference = inference_invocation(
            &self.config,
            job.model,
            &job.video_path,
            &job.output_dir,
            output_plan.scale_factor,
        );
        collaborators.push(self.invoke(&inference)?);
        self.check_artifact(inference.tool, &artifacts.raw)?;

        if let Some(cropped) = artifacts.cropped.as_deref() {
            info!("Cropping to fit...");
            let crop = crop_invocation(
                &self.config.ffmpeg,
                &self.config.crop,
                output_plan,
                &artifacts.raw,
                cropped,
            );
            collaborators.push(self.invoke(&crop)?);
            self.check_artifact(crop.tool, cropped)?;
        }

        info!("Upscaled video saved to: {}", artifacts.final_path().display());
        Ok(UpscaleOutcome {
            plan: *output_plan,
            artifacts,
            collaborators,
        })
    }

    fn invoke(&self, invocation: &Invocation) -> Result<CollaboratorReport> {
        let _timer = self.metrics.start_stage(invocation.tool);
        info!(tool = invocation.tool, command = %invocation, "Launching collaborator");

        let output = self
            .runner
            .run(invocation)
            .map_err(|err| UpscaleError::Collaborator {
                tool: invocation.tool,
                detail: format!("failed to launch {}: {err}", invocation.program.display()),
            })?;

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(tool = invocation.tool, "{line}");
        }
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!(tool = invocation.tool, "{line}");
        }

        if !output.success() {
            self.metrics.record_collaborator_failure();
            let detail = format!(
                "exited with status {}{}",
                output
                    .exit_code
                    .map_or_else(|| "signal".to_string(), |code| code.to_string()),
                output
                    .stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .map(|l| format!(": {}", l.trim()))
                    .unwrap_or_default()
            );
            if self.config.strict {
                return Err(UpscaleError::Collaborator {
                    tool: invocation.tool,
                    detail,
                });
            }
            warn!(tool = invocation.tool, "Collaborator {detail}; continuing");
        } else {
            debug!(tool = invocation.tool, "Collaborator finished");
        }

        Ok(CollaboratorReport::new(invocation, output))
    }

    fn check_artifact(&self, tool: &'static str, path: &Path) -> Result<()> {
        if path.is_file() {
            return Ok(());
        }
        if self.config.strict {
            return Err(UpscaleError::Collaborator {
                tool,
                detail: format!("expected output {} was not produced", path.display()),
            });
        }
        warn!(tool, output = %path.display(), "Expected output is missing");
        Ok(())
    }
}
