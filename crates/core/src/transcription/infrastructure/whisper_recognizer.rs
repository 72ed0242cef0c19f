use std::path::{Path, PathBuf};
use std::sync::Once;

use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::{MAX_DEFAULT_THREADS, WHISPER_SAMPLE_RATE};
use crate::transcription::domain::model_size::ModelSize;
use crate::transcription::domain::speech_recognizer::{RecognizerLoader, SpeechRecognizer};
use crate::transcription::domain::transcribe_error::{InferenceStage, TranscribeError};
use crate::transcription::domain::transcript::{Transcript, TranscriptSegment};
use crate::transcription::domain::word_assembler::{assemble_words, TimedToken};

use super::model_locator;

static LOGGING_HOOKS: Once = Once::new();

/// Route whisper.cpp's own output through the `log` crate.
pub fn install_logging_hooks() {
    LOGGING_HOOKS.call_once(whisper_rs::install_logging_hooks);
}

/// Inference options shared by every recognizer a loader builds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WhisperOptions {
    /// Force a language code (e.g. "en"); `None` auto-detects.
    pub language: Option<String>,
    /// Inference threads; `None` uses `min(available cores, 4)`.
    pub threads: Option<usize>,
}

/// Speech recognizer using whisper.cpp via whisper-rs.
pub struct WhisperRecognizer {
    model: ModelSize,
    model_path: PathBuf,
    context: WhisperContext,
    options: WhisperOptions,
}

impl WhisperRecognizer {
    /// Load the weights at `model_path` into a fresh context.
    pub fn load(
        model: ModelSize,
        model_path: &Path,
        options: WhisperOptions,
    ) -> Result<Self, TranscribeError> {
        if !model_path.exists() {
            return Err(TranscribeError::model_unavailable(
                model.id(),
                format!("Whisper model not found at: {}", model_path.display()),
            ));
        }
        let path_str = model_path.to_str().ok_or_else(|| {
            TranscribeError::model_unavailable(model.id(), "model path is not valid UTF-8")
        })?;

        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| {
                    TranscribeError::model_unavailable(
                        model.id(),
                        format!("failed to load {}: {e}", model_path.display()),
                    )
                })?;

        Ok(Self {
            model,
            model_path: model_path.to_path_buf(),
            context,
            options,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Language passed to whisper.cpp. English-only models are always "en".
    fn requested_language(&self) -> &str {
        if self.model.is_english_only() {
            return "en";
        }
        self.options.language.as_deref().unwrap_or("auto")
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &AudioSegment) -> Result<Transcript, TranscribeError> {
        if audio.sample_rate() != WHISPER_SAMPLE_RATE || audio.channels() != 1 {
            return Err(TranscribeError::inference(
                InferenceStage::Inference,
                format!(
                    "expected {WHISPER_SAMPLE_RATE} Hz mono audio, got {} Hz with {} channels",
                    audio.sample_rate(),
                    audio.channels()
                ),
            ));
        }

        let mut state = self.context.create_state().map_err(|e| {
            TranscribeError::inference(
                InferenceStage::Inference,
                format!("failed to create Whisper state: {e}"),
            )
        })?;

        let language = self.requested_language();
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(thread_count(self.options.threads));

        state.full(params, audio.samples()).map_err(|e| {
            TranscribeError::inference(
                InferenceStage::Inference,
                format!("Whisper inference failed: {e}"),
            )
        })?;

        let detected = if language == "auto" {
            let lang_id = state.full_lang_id_from_state();
            whisper_rs::get_lang_str(lang_id).map(str::to_string)
        } else {
            Some(language.to_string())
        };

        let segments = collect_segments(&state)?;
        let text = segments.iter().map(|s| s.text.as_str()).collect::<String>();

        Ok(Transcript {
            text,
            language: detected,
            segments,
        })
    }
}

fn collect_segments(state: &WhisperState) -> Result<Vec<TranscriptSegment>, TranscribeError> {
    let mut segments = Vec::new();
    let num_segments = state.full_n_segments();

    for seg_idx in 0..num_segments {
        let segment = match state.get_segment(seg_idx) {
            Some(s) => s,
            None => continue,
        };

        let text = segment
            .to_str_lossy()
            .map_err(|e| {
                TranscribeError::inference(
                    InferenceStage::Extraction,
                    format!("segment {seg_idx} text: {e}"),
                )
            })?
            .into_owned();

        let mut token_ids = Vec::new();
        let mut timed = Vec::new();
        for tok_idx in 0..segment.n_tokens() {
            let token = match segment.get_token(tok_idx) {
                Some(t) => t,
                None => continue,
            };
            let data = token.token_data();
            token_ids.push(data.id);

            // Raw bytes: a multi-byte character may span several tokens
            let token_bytes = match token.to_bytes() {
                Ok(b) => b.to_vec(),
                Err(_) => continue,
            };

            // Token timestamps are in centiseconds (10ms units)
            timed.push(TimedToken {
                bytes: token_bytes,
                start: data.t0 as f64 / 100.0,
                end: data.t1 as f64 / 100.0,
                probability: token.token_probability(),
            });
        }

        let words = assemble_words(&timed);

        segments.push(TranscriptSegment {
            id: segments.len(),
            start: segment.start_timestamp() as f64 / 100.0,
            end: segment.end_timestamp() as f64 / 100.0,
            text,
            tokens: token_ids,
            no_speech_prob: segment.no_speech_probability(),
            words: if words.is_empty() { None } else { Some(words) },
        });
    }

    Ok(segments)
}

/// Builds a [`WhisperRecognizer`] per call from weights on disk.
pub struct WhisperLoader {
    model_dir: Option<PathBuf>,
    options: WhisperOptions,
}

impl WhisperLoader {
    pub fn new(model_dir: Option<PathBuf>, options: WhisperOptions) -> Self {
        Self { model_dir, options }
    }
}

impl RecognizerLoader for WhisperLoader {
    fn load(&self, model: ModelSize) -> Result<Box<dyn SpeechRecognizer>, TranscribeError> {
        let model_path = model_locator::locate(model, self.model_dir.as_deref())
            .map_err(|e| e.into_transcribe_error(model))?;
        let recognizer = WhisperRecognizer::load(model, &model_path, self.options.clone())?;
        log::debug!("Loaded weights from {}", recognizer.model_path().display());
        Ok(Box::new(recognizer))
    }
}

/// Threads handed to whisper.cpp, always within `1..=i32::MAX`.
fn thread_count(requested: Option<usize>) -> i32 {
    let threads = requested
        .unwrap_or_else(|| num_cpus().min(MAX_DEFAULT_THREADS))
        .max(1);
    i32::try_from(threads).unwrap_or(i32::MAX)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
