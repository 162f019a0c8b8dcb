use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpscaleError {
    /// The host cannot run the inference collaborator at all.
    #[error("{0}")]
    Environment(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("{tool} failed: {detail}")]
    Collaborator { tool: &'static str, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, UpscaleError>;
