//! Resolution planning.
//!
//! Turns a probed source size and a [`ResolutionPolicy`] into an [`OutputPlan`]:
//! the frame size the caller asked for plus a scale factor the inference tool can
//! apply uniformly. Video encoders reject odd frame dimensions, so the scale
//! factor is walked upwards in [`SCALE_STEP`] increments until both scaled edges
//! land on even pixel counts.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Result, UpscaleError};

/// Increment applied to the scale factor while searching for even output edges.
pub const SCALE_STEP: f64 = 0.01;

/// Upper bound on search increments before planning gives up.
pub const MAX_SCALE_STEPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let dims = Self { width, height };
        dims.validate()?;
        Ok(dims)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(UpscaleError::Input(format!(
                "video dimensions must be positive, got {self}"
            )));
        }
        Ok(())
    }

    pub fn orientation(&self) -> Orientation {
        if self.width == self.height {
            Orientation::Square
        } else if self.width < self.height {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Frame produced when both edges are multiplied by `factor` and truncated.
    pub fn scaled(&self, factor: f64) -> FrameSize {
        FrameSize {
            width: (f64::from(self.width) * factor).floor() as u64,
            height: (f64::from(self.height) * factor).floor() as u64,
        }
    }
}

impl fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for VideoDimensions {
    type Err = UpscaleError;

    fn from_str(s: &str) -> Result<Self> {
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| UpscaleError::Input(format!("expected WIDTHxHEIGHT, got '{s}'")))?;
        let parse = |value: &str| {
            value.trim().parse::<u32>().map_err(|err| {
                UpscaleError::Input(format!("invalid dimension '{value}' in '{s}': {err}"))
            })
        };
        VideoDimensions::new(parse(width)?, parse(height)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u64,
    pub height: u64,
}

impl FrameSize {
    pub fn is_even(&self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }

    pub fn covers(&self, other: FrameSize) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
pub enum ResolutionPolicy {
    #[value(name = "FHD")]
    #[serde(rename = "FHD")]
    Fhd,
    #[value(name = "2k")]
    #[serde(rename = "2k")]
    TwoK,
    #[value(name = "4k")]
    #[serde(rename = "4k")]
    FourK,
    #[value(name = "2x")]
    #[serde(rename = "2x")]
    Double,
    #[value(name = "3x")]
    #[serde(rename = "3x")]
    Triple,
    #[value(name = "4x")]
    #[serde(rename = "4x")]
    Quadruple,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::FourK
    }
}

impl ResolutionPolicy {
    pub const ALL: [ResolutionPolicy; 6] = [
        ResolutionPolicy::Fhd,
        ResolutionPolicy::TwoK,
        ResolutionPolicy::FourK,
        ResolutionPolicy::Double,
        ResolutionPolicy::Triple,
        ResolutionPolicy::Quadruple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::Fhd => "FHD",
            ResolutionPolicy::TwoK => "2k",
            ResolutionPolicy::FourK => "4k",
            ResolutionPolicy::Double => "2x",
            ResolutionPolicy::Triple => "3x",
            ResolutionPolicy::Quadruple => "4x",
        }
    }

    /// Fixed-target policies name an absolute landscape resolution and get cropped.
    pub fn is_fixed_target(&self) -> bool {
        self.multiplier().is_none()
    }

    pub fn multiplier(&self) -> Option<u64> {
        match self {
            ResolutionPolicy::Double => Some(2),
            ResolutionPolicy::Triple => Some(3),
            ResolutionPolicy::Quadruple => Some(4),
            ResolutionPolicy::Fhd | ResolutionPolicy::TwoK | ResolutionPolicy::FourK => None,
        }
    }

    /// Target size before any orientation adjustment.
    pub fn nominal_target(&self, source: VideoDimensions) -> FrameSize {
        match self {
            ResolutionPolicy::Fhd => FrameSize {
                width: 1920,
                height: 1080,
            },
            ResolutionPolicy::TwoK => FrameSize {
                width: 2560,
                height: 1440,
            },
            ResolutionPolicy::FourK => FrameSize {
                width: 3840,
                height: 2160,
            },
            relative => {
                let factor = relative.multiplier().unwrap_or(1);
                FrameSize {
                    width: factor * u64::from(source.width),
                    height: factor * u64::from(source.height),
                }
            }
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputPlan {
    pub policy: ResolutionPolicy,
    pub source: VideoDimensions,
    pub final_width: u64,
    pub final_height: u64,
    pub scale_factor: f64,
}

impl OutputPlan {
    pub fn final_size(&self) -> FrameSize {
        FrameSize {
            width: self.final_width,
            height: self.final_height,
        }
    }

    /// Frame the inference tool writes for this plan's scale factor.
    pub fn raw_frame(&self) -> FrameSize {
        self.source.scaled(self.scale_factor)
    }

    pub fn requires_crop(&self) -> bool {
        self.policy.is_fixed_target()
    }

    /// Left and top offsets that center the final frame inside the raw frame.
    pub fn crop_offsets(&self) -> (u64, u64) {
        let raw = self.raw_frame();
        (
            raw.width.saturating_sub(self.final_width) / 2,
            raw.height.saturating_sub(self.final_height) / 2,
        )
    }
}

/// Resolves the final output size and an even-safe scale factor for `source`.
pub fn plan(source: VideoDimensions, policy: ResolutionPolicy) -> Result<OutputPlan> {
    source.validate()?;

    let mut target = policy.nominal_target(source);
    if policy.is_fixed_target() {
        match source.orientation() {
            Orientation::Square => target.height = target.width,
            Orientation::Portrait => std::mem::swap(&mut target.width, &mut target.height),
            Orientation::Landscape => {}
        }
    }

    let min_scale = minimum_scale(source, target);
    let scale_factor = find_scale_factor(source, min_scale, target)?;

    Ok(OutputPlan {
        policy,
        source,
        final_width: target.width,
        final_height: target.height,
        scale_factor,
    })
}

/// Smallest uniform factor that reaches `target` on both edges.
pub fn minimum_scale(source: VideoDimensions, target: FrameSize) -> f64 {
    let horizontal = target.width as f64 / f64::from(source.width);
    let vertical = target.height as f64 / f64::from(source.height);
    horizontal.max(vertical)
}

/// Walks up from `min_scale` in [`SCALE_STEP`] increments until the scaled
/// frame has even edges and still covers `target`.
///
/// Candidates are computed as `min_scale + n * SCALE_STEP` rather than by
/// repeated addition so rounding error does not accumulate over the search.
pub fn find_scale_factor(
    source: VideoDimensions,
    min_scale: f64,
    target: FrameSize,
) -> Result<f64> {
    source.validate()?;
    if !min_scale.is_finite() || min_scale <= 0.0 {
        return Err(UpscaleError::Planning(format!(
            "minimum scale factor must be a positive finite number, got {min_scale}"
        )));
    }

    for step in 0..=MAX_SCALE_STEPS {
        let candidate = min_scale + f64::from(step) * SCALE_STEP;
        let frame = source.scaled(candidate);
        if frame.is_even() && frame.covers(target) {
            return Ok(candidate);
        }
    }

    Err(UpscaleError::Planning(format!(
        "no even output frame found for {source} within {MAX_SCALE_STEPS} steps of {min_scale}"
    )))
}
