use std::path::{Path, PathBuf};

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::model_size::ModelSize;
use crate::transcription::domain::speech_recognizer::RecognizerLoader;
use crate::transcription::domain::transcribe_error::{InferenceStage, TranscribeError};
use crate::transcription::domain::transcript::TranscriptionResult;
use crate::transcription::infrastructure::whisper_recognizer::{WhisperLoader, WhisperOptions};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio_path: PathBuf,
    /// Model size identifier as given by the caller, parsed on acquisition.
    pub model: String,
}

/// Settings resolved by the caller; nothing here reads the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscriptionConfig {
    pub model_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub threads: Option<usize>,
}

/// Transcribes one audio file into text, segments and flattened words.
///
/// The recognizer is loaded fresh for every call.
pub struct TranscribeFileUseCase {
    reader: Box<dyn AudioReader>,
    loader: Box<dyn RecognizerLoader>,
}

impl TranscribeFileUseCase {
    pub fn new(reader: Box<dyn AudioReader>, loader: Box<dyn RecognizerLoader>) -> Self {
        Self { reader, loader }
    }

    /// ffmpeg decoding with whisper.cpp recognition.
    pub fn with_whisper(config: TranscriptionConfig) -> Self {
        let options = WhisperOptions {
            language: config.language,
            threads: config.threads,
        };
        Self::new(
            Box::new(FfmpegAudioReader),
            Box::new(WhisperLoader::new(config.model_dir, options)),
        )
    }

    pub fn execute(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, TranscribeError> {
        let path = request.audio_path.as_path();
        check_audio_file(path)?;

        log::info!("Loading Whisper model: {}", request.model);
        let model: ModelSize = request.model.parse()?;
        let recognizer = self.loader.load(model)?;

        let audio = self
            .reader
            .read_audio(path, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| {
                TranscribeError::inference(
                    InferenceStage::Decode,
                    format!("no audio stream in {}", path.display()),
                )
            })?;
        log::debug!("Decoded {:.2}s of audio", audio.duration());

        log::info!("Transcribing audio...");
        let transcript = recognizer.transcribe(&audio)?;
        log::info!("Transcription complete!");

        let result = TranscriptionResult::from_transcript(transcript);
        log::debug!(
            "{} segments, {} words, language {}",
            result.segments.len(),
            result.words.len(),
            result.language
        );
        Ok(result)
    }
}

fn check_audio_file(path: &Path) -> Result<(), TranscribeError> {
    let exists = path.exists();
    let is_file = path.is_file();
    log::info!("Checking audio file: {}", path.display());
    log::info!("File exists: {exists}");
    log::info!("Is file: {is_file}");
    match std::env::current_dir() {
        Ok(cwd) => log::info!("Current working directory: {}", cwd.display()),
        Err(e) => log::warn!("Current working directory unavailable: {e}"),
    }

    if !exists || !is_file {
        return Err(TranscribeError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::transcription::domain::speech_recognizer::SpeechRecognizer;
    use crate::transcription::domain::transcript::{SegmentWord, Transcript, TranscriptSegment};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    // ─── Stubs ───

    struct StubAudioReader {
        segment: Option<AudioSegment>,
        fail: bool,
    }

    impl AudioReader for StubAudioReader {
        fn read_audio(
            &self,
            _: &Path,
            _: u32,
        ) -> Result<Option<AudioSegment>, TranscribeError> {
            if self.fail {
                return Err(TranscribeError::inference(
                    InferenceStage::Decode,
                    "Invalid data found when processing input",
                ));
            }
            Ok(self.segment.clone())
        }
    }

    struct StubRecognizer {
        transcript: Transcript,
    }

    impl SpeechRecognizer for StubRecognizer {
        fn transcribe(&self, _: &AudioSegment) -> Result<Transcript, TranscribeError> {
            Ok(self.transcript.clone())
        }
    }

    struct FailingRecognizer;

    impl SpeechRecognizer for FailingRecognizer {
        fn transcribe(&self, _: &AudioSegment) -> Result<Transcript, TranscribeError> {
            Err(TranscribeError::inference(
                InferenceStage::Inference,
                "out of memory",
            ))
        }
    }

    struct StubLoader {
        transcript: Option<Transcript>,
        loaded: Arc<Mutex<Vec<ModelSize>>>,
    }

    impl RecognizerLoader for StubLoader {
        fn load(&self, model: ModelSize) -> Result<Box<dyn SpeechRecognizer>, TranscribeError> {
            self.loaded.lock().unwrap().push(model);
            match &self.transcript {
                Some(t) => Ok(Box::new(StubRecognizer {
                    transcript: t.clone(),
                })),
                None => Err(TranscribeError::model_unavailable(model.id(), "no weights")),
            }
        }
    }

    struct FailingLoader;

    impl RecognizerLoader for FailingLoader {
        fn load(&self, _: ModelSize) -> Result<Box<dyn SpeechRecognizer>, TranscribeError> {
            Ok(Box::new(FailingRecognizer))
        }
    }

    fn silent_audio() -> AudioSegment {
        AudioSegment::new(vec![0.0; 16000], 16000, 1)
    }

    fn word(text: &str, start: f64, end: f64) -> SegmentWord {
        SegmentWord {
            word: text.to_string(),
            start,
            end,
            probability: 0.9,
        }
    }

    fn segment(id: usize, text: &str, words: Option<Vec<SegmentWord>>) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start: id as f64 * 2.0,
            end: id as f64 * 2.0 + 2.0,
            text: text.to_string(),
            tokens: vec![50364, 2425],
            no_speech_prob: 0.02,
            words,
        }
    }

    fn sample_transcript() -> Transcript {
        Transcript {
            text: " Patient reports pain. No fever.".to_string(),
            language: Some("en".to_string()),
            segments: vec![
                segment(
                    0,
                    " Patient reports pain.",
                    Some(vec![
                        word(" Patient", 0.0, 0.5),
                        word(" reports", 0.5, 0.9),
                        word(" pain.", 0.9, 1.4),
                    ]),
                ),
                segment(1, " [inaudible]", None),
                segment(
                    2,
                    " No fever.",
                    Some(vec![word(" No", 4.0, 4.2), word(" fever. ", 4.2, 4.8)]),
                ),
            ],
        }
    }

    fn audio_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"RIFF").unwrap();
        file
    }

    fn use_case(
        transcript: Option<Transcript>,
    ) -> (TranscribeFileUseCase, Arc<Mutex<Vec<ModelSize>>>) {
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let uc = TranscribeFileUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(silent_audio()),
                fail: false,
            }),
            Box::new(StubLoader {
                transcript,
                loaded: loaded.clone(),
            }),
        );
        (uc, loaded)
    }

    #[test]
    fn test_missing_file_is_not_found_and_skips_model_load() {
        let (uc, loaded) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: PathBuf::from("/nonexistent/visit.wav"),
            model: "small".to_string(),
        };
        let err = uc.execute(&request).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Audio file not found: /nonexistent/visit.wav"
        );
        assert!(loaded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_reported_before_unknown_model() {
        let (uc, loaded) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: PathBuf::from("/nonexistent/visit.wav"),
            model: "gigantic".to_string(),
        };
        assert!(matches!(
            uc.execute(&request),
            Err(TranscribeError::NotFound { .. })
        ));
        assert!(loaded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_model_is_model_unavailable() {
        let file = audio_file();
        let (uc, loaded) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "gigantic".to_string(),
        };
        match uc.execute(&request) {
            Err(TranscribeError::ModelUnavailable { model, .. }) => assert_eq!(model, "gigantic"),
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
        assert!(loaded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let (uc, _) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: dir.path().to_path_buf(),
            model: "small".to_string(),
        };
        assert!(matches!(
            uc.execute(&request),
            Err(TranscribeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_requested_model_is_loaded() {
        let file = audio_file();
        let (uc, loaded) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "tiny".to_string(),
        };
        uc.execute(&request).unwrap();
        assert_eq!(*loaded.lock().unwrap(), vec![ModelSize::Tiny]);
    }

    #[test]
    fn test_words_flatten_segments_with_word_data() {
        let file = audio_file();
        let (uc, _) = use_case(Some(sample_transcript()));
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "small".to_string(),
        };
        let result = uc.execute(&request).unwrap();

        let expected: usize = result
            .segments
            .iter()
            .filter_map(|s| s.words.as_ref())
            .map(|w| w.len())
            .sum();
        assert_eq!(result.words.len(), expected);
        let texts: Vec<&str> = result.words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(texts, vec!["Patient", "reports", "pain.", "No", "fever."]);
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.language, "en");
    }

    #[test]
    fn test_model_unavailable_propagates() {
        let file = audio_file();
        let (uc, _) = use_case(None);
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "medium".to_string(),
        };
        match uc.execute(&request) {
            Err(TranscribeError::ModelUnavailable { model, .. }) => assert_eq!(model, "medium"),
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_no_audio_stream_is_decode_failure() {
        let file = audio_file();
        let uc = TranscribeFileUseCase::new(
            Box::new(StubAudioReader {
                segment: None,
                fail: false,
            }),
            Box::new(FailingLoader),
        );
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "small".to_string(),
        };
        assert!(matches!(
            uc.execute(&request),
            Err(TranscribeError::InferenceFailure {
                stage: InferenceStage::Decode,
                ..
            })
        ));
    }

    #[test]
    fn test_decoder_error_is_decode_failure() {
        let file = audio_file();
        let uc = TranscribeFileUseCase::new(
            Box::new(StubAudioReader {
                segment: None,
                fail: true,
            }),
            Box::new(FailingLoader),
        );
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "small".to_string(),
        };
        let err = uc.execute(&request).unwrap_err();
        assert!(err.to_string().contains("Invalid data"), "got: {err}");
    }

    #[test]
    fn test_recognizer_error_is_inference_failure() {
        let file = audio_file();
        let uc = TranscribeFileUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(silent_audio()),
                fail: false,
            }),
            Box::new(FailingLoader),
        );
        let request = TranscriptionRequest {
            audio_path: file.path().to_path_buf(),
            model: "small".to_string(),
        };
        assert!(matches!(
            uc.execute(&request),
            Err(TranscribeError::InferenceFailure {
                stage: InferenceStage::Inference,
                ..
            })
        ));
    }
}
