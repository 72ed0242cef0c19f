use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;
use crate::transcription::domain::model_size::ModelSize;
use crate::transcription::domain::transcribe_error::TranscribeError;

#[derive(Error, Debug)]
pub enum ModelLocateError {
    #[error("weights file not found at {}", path.display())]
    Missing { path: PathBuf },
    #[error("{} is not a regular file", path.display())]
    NotAFile { path: PathBuf },
    #[error("could not determine model directory")]
    NoModelDir,
}

impl ModelLocateError {
    pub fn into_transcribe_error(self, model: ModelSize) -> TranscribeError {
        TranscribeError::model_unavailable(model.id(), self)
    }
}

/// Find the whisper.cpp weights for `model`.
///
/// Looks in `model_dir` when given, otherwise in [`default_model_dir`].
/// Weights are never fetched; a missing file is an error.
pub fn locate(model: ModelSize, model_dir: Option<&Path>) -> Result<PathBuf, ModelLocateError> {
    let dir = match model_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_model_dir()?,
    };
    locate_in(model, &dir)
}

fn locate_in(model: ModelSize, dir: &Path) -> Result<PathBuf, ModelLocateError> {
    let path = dir.join(model.weights_filename());
    if !path.exists() {
        return Err(ModelLocateError::Missing { path });
    }
    if !path.is_file() {
        return Err(ModelLocateError::NotAFile { path });
    }
    Ok(path)
}

/// Platform-specific model directory.
///
/// - macOS: `~/Library/Application Support/mediscribe/models/`
/// - Linux: `$XDG_CACHE_HOME/mediscribe/models/` or `~/.cache/mediscribe/models/`
/// - Windows: `%LOCALAPPDATA%/mediscribe/models/`
pub fn default_model_dir() -> Result<PathBuf, ModelLocateError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelLocateError::NoModelDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelLocateError::NoModelDir)
    }
}
