/// whisper.cpp expects 16 kHz mono input.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

pub const DEFAULT_MODEL: &str = "small";

/// Directory name under the platform cache/data dir holding model weights.
pub const APP_DIR_NAME: &str = "mediscribe";

/// Upper bound on inference threads when none are configured.
pub const MAX_DEFAULT_THREADS: usize = 4;
