use crate::audio::domain::audio_segment::AudioSegment;

use super::model_size::ModelSize;
use super::transcribe_error::TranscribeError;
use super::transcript::Transcript;

/// Domain interface for speech-to-text transcription.
///
/// Implementations run inference on audio and return segments with
/// word-level timestamps where the model provides them.
pub trait SpeechRecognizer: Send {
    fn transcribe(&self, audio: &AudioSegment) -> Result<Transcript, TranscribeError>;
}

/// Acquires a recognizer for a model size. Loading weights is expensive.
pub trait RecognizerLoader: Send {
    fn load(&self, model: ModelSize) -> Result<Box<dyn SpeechRecognizer>, TranscribeError>;
}
