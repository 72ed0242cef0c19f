pub mod model_size;
pub mod speech_recognizer;
pub mod transcribe_error;
pub mod transcript;
pub mod word_assembler;
