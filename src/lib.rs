pub mod collaborator;
pub mod config;
pub mod error;
pub mod gpu;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod plan;
pub mod probe;

pub use error::{Result, UpscaleError};
pub use pipeline::{OutputArtifacts, UpscaleJob, UpscaleOutcome, Upscaler};
pub use plan::{OutputPlan, ResolutionPolicy, VideoDimensions, plan};
