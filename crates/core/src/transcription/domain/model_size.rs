use std::fmt;
use std::str::FromStr;

use super::transcribe_error::TranscribeError;

/// Whisper model size identifiers, trading accuracy for resource cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelSize {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV1,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
}

impl ModelSize {
    pub const ALL: [ModelSize; 12] = [
        ModelSize::Tiny,
        ModelSize::TinyEn,
        ModelSize::Base,
        ModelSize::BaseEn,
        ModelSize::Small,
        ModelSize::SmallEn,
        ModelSize::Medium,
        ModelSize::MediumEn,
        ModelSize::LargeV1,
        ModelSize::LargeV2,
        ModelSize::LargeV3,
        ModelSize::LargeV3Turbo,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::TinyEn => "tiny.en",
            ModelSize::Base => "base",
            ModelSize::BaseEn => "base.en",
            ModelSize::Small => "small",
            ModelSize::SmallEn => "small.en",
            ModelSize::Medium => "medium",
            ModelSize::MediumEn => "medium.en",
            ModelSize::LargeV1 => "large-v1",
            ModelSize::LargeV2 => "large-v2",
            ModelSize::LargeV3 => "large-v3",
            ModelSize::LargeV3Turbo => "large-v3-turbo",
        }
    }

    /// whisper.cpp weight file for this size, e.g. `ggml-small.bin`.
    pub fn weights_filename(&self) -> String {
        format!("ggml-{}.bin", self.id())
    }

    /// English-only models cannot detect language.
    pub fn is_english_only(&self) -> bool {
        self.id().ends_with(".en")
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelSize {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "large" => return Ok(ModelSize::LargeV3),
            "turbo" => return Ok(ModelSize::LargeV3Turbo),
            _ => {}
        }
        ModelSize::ALL
            .iter()
            .copied()
            .find(|size| size.id() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = ModelSize::ALL.iter().map(|m| m.id()).collect();
                TranscribeError::model_unavailable(
                    s,
                    format!("unknown model size, expected one of: {}", known.join(", ")),
                )
            })
    }
}
