//! Feature extraction on generated WAV files

mod helpers;

use helpers::{generate_test_wav, AudioConfig};
use jfai_common::models::MFCC_COEFFICIENTS;
use jfai_processor::services::feature_extractor::ANALYSIS_SAMPLE_RATE;
use jfai_processor::services::{FeatureError, FeatureExtractor, SpectralFeatureExtractor};
use jfai_processor::utils::decode_audio_file;
use tempfile::TempDir;

#[test]
fn test_tone_wav_features() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(
        &dir.path().join("tone.wav"),
        &AudioConfig {
            duration_seconds: 4.0,
            ..Default::default()
        },
    )
    .unwrap();

    let features = SpectralFeatureExtractor::default().extract(&path).unwrap();

    assert_eq!(features.sample_rate, ANALYSIS_SAMPLE_RATE);
    assert!((features.duration - 4.0).abs() < 0.05, "duration {}", features.duration);
    assert_eq!(features.mfcc_mean.len(), MFCC_COEFFICIENTS);
    assert!(
        (features.spectral_centroid_mean - 440.0).abs() < 150.0,
        "centroid {}",
        features.spectral_centroid_mean
    );
    assert!(
        (features.zero_crossing_rate_mean - 880.0 / ANALYSIS_SAMPLE_RATE as f64).abs() < 0.01,
        "zcr {}",
        features.zero_crossing_rate_mean
    );
    assert!(features.tempo >= 0.0 && features.tempo.is_finite());
}

#[test]
fn test_click_track_tempo() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(
        &dir.path().join("clicks.wav"),
        &AudioConfig {
            duration_seconds: 12.0,
            sample_rate: 22050,
            channels: 1,
            frequency: 220.0,
            click_bpm: Some(120.0),
        },
    )
    .unwrap();

    let features = SpectralFeatureExtractor::default().extract(&path).unwrap();
    assert!(
        (features.tempo - 120.0).abs() < 8.0,
        "tempo {}",
        features.tempo
    );
}

#[test]
fn test_stereo_is_downmixed_before_analysis() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("stereo.wav"), &AudioConfig::default()).unwrap();

    let decoded = decode_audio_file(&path).unwrap();
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.sample_rate, 44100);
    assert_eq!(decoded.samples.len(), 5 * 44100);
}

#[test]
fn test_truncated_file_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"RIFF\x10\x00\x00\x00WAVE").unwrap();

    let result = SpectralFeatureExtractor::default().extract(&path);
    assert!(
        matches!(result, Err(FeatureError::Decode(_)) | Err(FeatureError::EmptySignal(_))),
        "unexpected {:?}",
        result
    );
}
