use std::fmt;

use clap::ValueEnum;

/// Real-ESRGAN weights accepted by the inference script's `-n` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InferenceModel {
    #[value(name = "RealESRGAN_x4plus")]
    X4Plus,
    #[value(name = "RealESRGAN_x4plus_anime_6B")]
    X4PlusAnime6B,
    #[value(name = "realesr-animevideov3")]
    AnimeVideoV3,
}

impl Default for InferenceModel {
    fn default() -> Self {
        InferenceModel::X4Plus
    }
}

impl InferenceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceModel::X4Plus => "RealESRGAN_x4plus",
            InferenceModel::X4PlusAnime6B => "RealESRGAN_x4plus_anime_6B",
            InferenceModel::AnimeVideoV3 => "realesr-animevideov3",
        }
    }
}

impl fmt::Display for InferenceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
