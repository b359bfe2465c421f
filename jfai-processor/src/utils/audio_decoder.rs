//! Audio Decoding Utilities
//!
//! Decode audio files to mono f32 PCM with symphonia (MP3, FLAC, AAC, WAV,
//! OGG, ...) and resample to the analysis rate with rubato.

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded mono audio
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source track
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples at its native rate
///
/// Channels are averaged. Packets that fail to decode are skipped (symphonia
/// reports these as recoverable); any other error aborts the decode.
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(anyhow::anyhow!("Error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped_packets += 1;
                tracing::trace!(path = %file_path.display(), error = msg, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to decode packet in {}: {}",
                    file_path.display(),
                    e
                ))
            }
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count().max(1);
        channels = channel_count;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        downmix_into(buffer.samples(), channel_count, &mut mono);
    }

    if skipped_packets > 0 {
        tracing::debug!(
            path = %file_path.display(),
            skipped_packets,
            "Some packets could not be decoded"
        );
    }

    tracing::debug!(
        path = %file_path.display(),
        total_samples = mono.len(),
        sample_rate,
        channels,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: mono,
        sample_rate,
        channels,
    })
}

/// Average interleaved frames into mono samples
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.reserve(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        out.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

/// Resample mono samples to `target_rate`
///
/// Single-pass sinc interpolation (the whole signal is one chunk).
/// Returns the input unchanged when the rates already match.
pub fn resample_mono(samples: Vec<f32>, source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples);
    }
    if source_rate == 0 || target_rate == 0 {
        anyhow::bail!("Invalid sample rates: {} -> {}", source_rate, target_rate);
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let frames = samples.len();
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, frames, 1)
        .context("Failed to create resampler")?;

    let input = vec![samples];
    let mut output = resampler
        .process(&input, None)
        .context("Resampling failed")?;

    let resampled = output.pop().unwrap_or_default();
    tracing::trace!(
        input_frames = frames,
        output_frames = resampled.len(),
        source_rate,
        target_rate,
        "Resampled audio"
    );

    Ok(resampled)
}

/// Decode and resample in one step
pub fn load_mono(file_path: &Path, target_rate: u32) -> Result<DecodedAudio> {
    let decoded = decode_audio_file(file_path)?;
    let samples = resample_mono(decoded.samples, decoded.sample_rate, target_rate)?;
    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
        channels: decoded.channels,
    })
}
