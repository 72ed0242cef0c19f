use std::path::PathBuf;

use thiserror::Error;

/// Where in the invocation an `InferenceFailure` happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferenceStage {
    Decode,
    Inference,
    Extraction,
}

impl std::fmt::Display for InferenceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InferenceStage::Decode => "audio decoding",
            InferenceStage::Inference => "inference",
            InferenceStage::Extraction => "result extraction",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Audio file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Whisper model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },
    #[error("Transcription failed during {stage}: {message}")]
    InferenceFailure {
        stage: InferenceStage,
        message: String,
    },
}

impl TranscribeError {
    pub fn model_unavailable(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        TranscribeError::ModelUnavailable {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(stage: InferenceStage, message: impl std::fmt::Display) -> Self {
        TranscribeError::InferenceFailure {
            stage,
            message: message.to_string(),
        }
    }
}
