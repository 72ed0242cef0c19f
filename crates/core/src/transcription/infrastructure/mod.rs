pub mod model_locator;
pub mod whisper_recognizer;
