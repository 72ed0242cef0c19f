use serde::Serialize;

/// Language reported when the model does not detect one.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A word inside a segment, as the model produced it (text untrimmed).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub probability: f32,
}

/// A contiguous span of recognized audio with its own text and timing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub id: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub tokens: Vec<i32>,
    pub no_speech_prob: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<SegmentWord>>,
}

/// Raw recognizer output before reshaping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub language: Option<String>,
    pub segments: Vec<TranscriptSegment>,
}

/// Flattened word entry with trimmed text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
    pub words: Vec<TranscriptWord>,
}

impl TranscriptionResult {
    pub fn from_transcript(transcript: Transcript) -> Self {
        let words = flatten_words(&transcript.segments);
        Self {
            text: transcript.text,
            language: transcript
                .language
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            segments: transcript.segments,
            words,
        }
    }
}

/// Flatten segment words in segment order, then word order.
///
/// Segments without word-level data contribute nothing.
pub fn flatten_words(segments: &[TranscriptSegment]) -> Vec<TranscriptWord> {
    segments
        .iter()
        .filter_map(|segment| segment.words.as_deref())
        .flatten()
        .map(|w| TranscriptWord {
            word: w.word.trim().to_string(),
            start: w.start,
            end: w.end,
        })
        .collect()
}
