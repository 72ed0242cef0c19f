use std::path::Path;

use crate::transcription::domain::transcribe_error::TranscribeError;

use super::audio_segment::AudioSegment;

/// Domain interface for decoding an audio file into samples.
pub trait AudioReader: Send {
    /// Decode the first audio stream to mono PCM at the given sample rate.
    /// Returns None if the file has no audio stream. Failures are
    /// `InferenceFailure` at the decode stage.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, TranscribeError>;
}
