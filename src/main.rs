use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, ValueHint};
use esrgan_upscale::collaborator::{crop_invocation, inference_invocation};
use esrgan_upscale::config::UpscaleConfig;
use esrgan_upscale::model::InferenceModel;
use esrgan_upscale::observability::{RunReport, log_snapshot};
use esrgan_upscale::pipeline::{UpscaleJob, Upscaler, artifact_paths};
use esrgan_upscale::plan::{ResolutionPolicy, VideoDimensions};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing()?;

    let config = load_config(&cli)?;
    let mut job = UpscaleJob::new(&cli.video_path, &cli.output_dir)
        .with_policy(cli.resolution)
        .with_model(cli.model);
    if let Some(dims) = cli.dimensions {
        job = job.with_dimensions(dims);
    }

    let upscaler = Upscaler::new(config);
    if cli.dry_run {
        dry_run(&upscaler, &job, cli.report)
    } else {
        run(&upscaler, &job, cli.report, cli.print_metrics)
    }
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))
}

fn load_config(cli: &Cli) -> Result<UpscaleConfig> {
    let mut config = match &cli.config {
        Some(path) => UpscaleConfig::load(path)?,
        None => UpscaleConfig::default(),
    };
    if let Some(runtime) = &cli.python_runtime {
        config.python_runtime = runtime.clone();
    }
    if let Some(script) = &cli.script {
        config.inference_script = script.clone();
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.ffmpeg = ffmpeg.clone();
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.ffprobe = ffprobe.clone();
    }
    if cli.strict {
        config.strict = true;
    }
    config.validate()?;
    Ok(config)
}

fn dry_run(upscaler: &Upscaler, job: &UpscaleJob, report: Option<PathBuf>) -> Result<()> {
    let plan = upscaler.prepare(job)?;
    let artifacts = artifact_paths(&plan, &job.video_path, &job.output_dir)?;
    let config = upscaler.config();

    let inference = inference_invocation(
        config,
        job.model,
        &job.video_path,
        &job.output_dir,
        plan.scale_factor,
    );
    let crop = artifacts.cropped.as_deref().map(|cropped| {
        crop_invocation(&config.ffmpeg, &config.crop, &plan, &artifacts.raw, cropped)
    });

    let summary = json!({
        "plan": plan,
        "raw_output": artifacts.raw,
        "final_output": artifacts.final_path(),
        "inference_command": inference.to_string(),
        "crop_command": crop.map(|c| c.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = report {
        RunReport {
            generated_at: Utc::now(),
            source: job.video_path.clone(),
            plan,
            raw_output: artifacts.raw.clone(),
            final_output: artifacts.final_path().to_path_buf(),
            dry_run: true,
            collaborators: Vec::new(),
            metrics: upscaler.metrics().snapshot(),
        }
        .write(&path)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }
    Ok(())
}

fn run(
    upscaler: &Upscaler,
    job: &UpscaleJob,
    report: Option<PathBuf>,
    print_metrics: bool,
) -> Result<()> {
    let outcome = upscaler.run(job)?;
    let snapshot = upscaler.metrics().snapshot();
    if print_metrics {
        log_snapshot(&snapshot);
    }

    if let Some(path) = report {
        RunReport {
            generated_at: Utc::now(),
            source: job.video_path.clone(),
            plan: outcome.plan,
            raw_output: outcome.artifacts.raw.clone(),
            final_output: outcome.final_path().to_path_buf(),
            dry_run: false,
            collaborators: outcome.collaborators.clone(),
            metrics: snapshot,
        }
        .write(&path)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(report = %path.display(), "Run report written");
    }

    println!("{}", outcome.final_path().display());
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "esrgan-upscale",
    version,
    about = "Upscale a video using Real-ESRGAN"
)]
struct Cli {
    #[arg(help = "Path to the input video file", value_hint = ValueHint::FilePath)]
    video_path: PathBuf,
    #[arg(
        short = 'o',
        long = "output_dir",
        visible_alias = "output-dir",
        default_value = ".",
        help = "Directory to save the output video"
    )]
    output_dir: PathBuf,
    #[arg(
        short = 'r',
        long,
        value_enum,
        default_value_t = ResolutionPolicy::FourK,
        help = "Desired output resolution"
    )]
    resolution: ResolutionPolicy,
    #[arg(
        short = 'm',
        long,
        value_enum,
        default_value_t = InferenceModel::X4Plus,
        help = "Real-ESRGAN model to use"
    )]
    model: InferenceModel,
    #[arg(
        short = 'p',
        long = "python_runtime",
        visible_alias = "python-runtime",
        help = "Python interpreter used to launch the inference script"
    )]
    python_runtime: Option<PathBuf>,
    #[arg(long, help = "YAML file with collaborator and encoding defaults")]
    config: Option<PathBuf>,
    #[arg(long, help = "Path to inference_realesrgan_video.py")]
    script: Option<PathBuf>,
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    #[arg(long)]
    ffprobe: Option<PathBuf>,
    #[arg(long, help = "Fail when a collaborator exits non-zero or skips its output")]
    strict: bool,
    #[arg(long, value_name = "WxH", help = "Source size; skips probing")]
    dimensions: Option<VideoDimensions>,
    #[arg(long, help = "Plan and print the commands without running them")]
    dry_run: bool,
    #[arg(long, help = "Write a JSON run report")]
    report: Option<PathBuf>,
    #[arg(long)]
    print_metrics: bool,
}
