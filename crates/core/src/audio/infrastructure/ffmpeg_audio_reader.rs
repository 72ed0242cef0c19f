use std::path::Path;

use ffmpeg_next::codec::decoder::Audio as AudioDecoder;
use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::software::resampling::Context as Resampler;
use ffmpeg_next::util::frame::audio::Audio;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::transcription::domain::transcribe_error::{InferenceStage, TranscribeError};

/// Decodes any container/codec ffmpeg understands into mono f32 PCM.
pub struct FfmpegAudioReader;

impl FfmpegAudioReader {
    /// Initialize ffmpeg, reporting failure as an unavailable dependency.
    pub fn ensure_available() -> Result<(), TranscribeError> {
        ffmpeg_next::init().map_err(|e| TranscribeError::model_unavailable("ffmpeg", e))?;
        log::debug!("ffmpeg initialized");
        Ok(())
    }
}

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, TranscribeError> {
        decode_mono(path, target_sample_rate).map_err(|e| {
            TranscribeError::inference(
                InferenceStage::Decode,
                format!("{}: {e}", path.display()),
            )
        })
    }
}

fn decode_mono(
    path: &Path,
    target_sample_rate: u32,
) -> Result<Option<AudioSegment>, ffmpeg_next::Error> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;

    let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
        Some(stream) => stream,
        None => return Ok(None),
    };
    let audio_stream_index = audio_stream.index();

    let codec_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
    let mut decoder = codec_ctx.decoder().audio()?;

    log::debug!(
        "Decoding {} ({} Hz, {} ch) to {} Hz mono",
        path.display(),
        decoder.rate(),
        decoder.channels(),
        target_sample_rate
    );

    let mut resampler = Resampler::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        Sample::F32(SampleType::Planar),
        ffmpeg_next::ChannelLayout::MONO,
        target_sample_rate,
    )?;

    let mut samples: Vec<f32> = Vec::new();
    for (stream, packet) in ictx.packets() {
        if stream.index() != audio_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        drain_decoder(&mut decoder, &mut resampler, &mut samples)?;
    }

    decoder.send_eof()?;
    drain_decoder(&mut decoder, &mut resampler, &mut samples)?;

    // The resampler may still hold buffered samples
    let mut tail = Audio::empty();
    if let Ok(Some(delay)) = resampler.flush(&mut tail) {
        if delay.output > 0 {
            extract_f32_samples(&tail, &mut samples);
        }
    }

    Ok(Some(AudioSegment::new(samples, target_sample_rate, 1)))
}

/// Resample every frame the decoder has ready into `out`.
fn drain_decoder(
    decoder: &mut AudioDecoder,
    resampler: &mut Resampler,
    out: &mut Vec<f32>,
) -> Result<(), ffmpeg_next::Error> {
    let mut decoded = Audio::empty();
    let mut resampled = Audio::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        resampler.run(&decoded, &mut resampled)?;
        extract_f32_samples(&resampled, out);
    }
    Ok(())
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}
