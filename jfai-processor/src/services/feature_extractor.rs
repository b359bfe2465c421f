//! Technical audio feature extraction
//!
//! Computes tempo, duration, MFCC means, spectral centroid/rolloff means,
//! zero-crossing rate mean and sample rate from a local audio file.
//!
//! This is synchronous, CPU-bound work; the processing loop runs it on the
//! blocking thread pool.

use crate::dsp::{mel, spectral, stft, tempo, HOP_LENGTH, N_FFT};
use crate::utils::audio_decoder;
use jfai_common::models::MFCC_COEFFICIENTS;
use jfai_common::AudioFeatures;
use std::path::Path;
use thiserror::Error;

/// Analysis sample rate (audio is resampled to this before analysis)
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// File missing or unreadable
    #[error("Audio file not readable: {0}")]
    Unreadable(String),

    /// Container/codec could not be decoded
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Decoded stream contained no samples
    #[error("No audio samples in {0}")]
    EmptySignal(String),
}

/// Computes [`AudioFeatures`] for a file path
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<AudioFeatures, FeatureError>;
}

/// STFT-based extractor (symphonia decode, rubato resample, rustfft)
#[derive(Debug, Clone)]
pub struct SpectralFeatureExtractor {
    sample_rate: u32,
}

impl Default for SpectralFeatureExtractor {
    fn default() -> Self {
        Self::new(ANALYSIS_SAMPLE_RATE)
    }
}

impl SpectralFeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl FeatureExtractor for SpectralFeatureExtractor {
    fn extract(&self, path: &Path) -> Result<AudioFeatures, FeatureError> {
        if !path.is_file() {
            return Err(FeatureError::Unreadable(path.display().to_string()));
        }

        let decoded = audio_decoder::load_mono(path, self.sample_rate)
            .map_err(|e| FeatureError::Decode(format!("{:#}", e)))?;

        if decoded.samples.is_empty() {
            return Err(FeatureError::EmptySignal(path.display().to_string()));
        }

        let features = compute_features(&decoded.samples, decoded.sample_rate);

        tracing::debug!(
            path = %path.display(),
            tempo = format!("{:.1}", features.tempo),
            duration = format!("{:.2}", features.duration),
            centroid = format!("{:.1}", features.spectral_centroid_mean),
            "Audio features extracted"
        );

        Ok(features)
    }
}

/// Compute all descriptors from mono samples at `sample_rate`
pub fn compute_features(samples: &[f32], sample_rate: u32) -> AudioFeatures {
    let magnitudes = stft::magnitude_spectrogram(samples, N_FFT, HOP_LENGTH);
    let freqs = stft::fft_frequencies(sample_rate, N_FFT);

    let bank = mel::MelBank::new(sample_rate, N_FFT, mel::N_MELS);
    let log_mel = mel::log_mel_spectrogram(&magnitudes, &bank);

    let envelope = tempo::onset_strength(&log_mel);

    AudioFeatures {
        tempo: tempo::estimate_tempo(&envelope, sample_rate, HOP_LENGTH),
        duration: if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        },
        mfcc_mean: mel::mfcc_mean(&log_mel, MFCC_COEFFICIENTS),
        spectral_centroid_mean: spectral::centroid_mean(&magnitudes, &freqs),
        spectral_rolloff_mean: spectral::rolloff_mean(&magnitudes, &freqs),
        zero_crossing_rate_mean: spectral::zero_crossing_rate_mean(samples, N_FFT, HOP_LENGTH),
        sample_rate,
    }
}
