//! Whisper transcription of audio files into text, segments and
//! word-level timestamps.

pub mod audio;
pub mod pipeline;
pub mod shared;
pub mod transcription;
