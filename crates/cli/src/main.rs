use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use mediscribe_core::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use mediscribe_core::pipeline::transcribe_file_use_case::{
    TranscribeFileUseCase, TranscriptionConfig, TranscriptionRequest,
};
use mediscribe_core::shared::constants::DEFAULT_MODEL;
use mediscribe_core::transcription::domain::transcribe_error::TranscribeError;
use mediscribe_core::transcription::domain::transcript::TranscriptionResult;
use mediscribe_core::transcription::infrastructure::whisper_recognizer;

const MODEL_ENV: &str = "WHISPER_MODEL";
const MODEL_DIR_ENV: &str = "WHISPER_MODEL_DIR";

/// Transcribe an audio file with Whisper and print JSON with word timestamps.
#[derive(Parser, Debug)]
#[command(name = "mediscribe-transcribe", version)]
struct Cli {
    /// Audio file to transcribe.
    audio_path: Option<PathBuf>,

    /// Model size (tiny, base, small, medium, large-v3, ...). Overrides WHISPER_MODEL.
    #[arg(long)]
    model: Option<String>,

    /// Directory holding ggml-<size>.bin weights. Overrides WHISPER_MODEL_DIR.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Force a language code instead of auto-detecting.
    #[arg(long)]
    language: Option<String>,

    /// Inference threads (default: available cores, at most 4).
    #[arg(long)]
    threads: Option<usize>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

/// Environment values read once in `main`.
#[derive(Debug, Default)]
struct Environment {
    whisper_model: Option<String>,
    model_dir: Option<PathBuf>,
}

impl Environment {
    fn capture() -> Self {
        Self {
            whisper_model: std::env::var(MODEL_ENV).ok(),
            model_dir: std::env::var_os(MODEL_DIR_ENV).map(PathBuf::from),
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Audio file path required")]
    MissingArgument,
    #[error("{0}")]
    Usage(clap::Error),
    #[error("Threads must be at least 1")]
    InvalidThreads,
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write result: {0}")]
    Output(#[from] io::Error),
}

#[derive(Serialize)]
struct ErrorReport {
    error: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let environment = Environment::capture();
    if let Err(e) = run(std::env::args_os(), &environment) {
        eprintln!("{}", render_error(&e));
        process::exit(1);
    }
}

fn run<I, T>(args: I, environment: &Environment) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = parse_args(args)?;
    let audio_path = cli.audio_path.clone().ok_or(CliError::MissingArgument)?;
    let request = TranscriptionRequest {
        audio_path,
        model: resolve_model(cli.model.clone(), environment.whisper_model.clone()),
    };
    let config = build_config(&cli, environment)?;
    log::debug!("Model {} with {:?}", request.model, config);

    check_dependencies()?;

    let result = TranscribeFileUseCase::with_whisper(config).execute(&request)?;
    emit(&result, cli.pretty)
}

fn parse_args<I, T>(args: I) -> Result<Cli, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => CliError::Usage(e),
    })
}

/// `--model` wins, then `WHISPER_MODEL`, then the default.
fn resolve_model(flag: Option<String>, env: Option<String>) -> String {
    flag.or(env).unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

fn build_config(cli: &Cli, environment: &Environment) -> Result<TranscriptionConfig, CliError> {
    if cli.threads == Some(0) {
        return Err(CliError::InvalidThreads);
    }
    Ok(TranscriptionConfig {
        model_dir: cli
            .model_dir
            .clone()
            .or_else(|| environment.model_dir.clone()),
        language: cli
            .language
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string),
        threads: cli.threads,
    })
}

/// Confirm the native libraries are usable before touching any input.
fn check_dependencies() -> Result<(), CliError> {
    whisper_recognizer::install_logging_hooks();
    FfmpegAudioReader::ensure_available()?;
    Ok(())
}

fn emit(result: &TranscriptionResult, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}

fn render_error(error: &CliError) -> String {
    let message = match error {
        CliError::Usage(e) => e.to_string().trim().to_string(),
        other => other.to_string(),
    };
    let report = ErrorReport { error: message };
    serde_json::to_string(&report).unwrap_or_else(|_| r#"{"error":"unknown error"}"#.to_string())
}
