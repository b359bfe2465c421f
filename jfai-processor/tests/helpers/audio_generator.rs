//! WAV fixtures for extractor and pipeline tests

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Tone frequency in Hz
    pub frequency: f32,
    /// Beats per minute of an added click track, if any
    pub click_bpm: Option<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 5.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            click_bpm: None,
        }
    }
}

/// Write a 16-bit PCM WAV: a 30% amplitude tone plus optional clicks
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
    let click_period = config
        .click_bpm
        .map(|bpm| (60.0 / bpm * config.sample_rate as f64) as usize);
    let click_len = (config.sample_rate / 100) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let mut value = 0.3 * (2.0 * std::f32::consts::PI * config.frequency * t).sin();

        if let Some(period) = click_period {
            if i % period < click_len {
                // Short decaying noise-like burst
                let phase = (i % period) as f32;
                value += 0.6 * (1.0 - phase / click_len as f32) * ((i * 7919) % 2000) as f32 / 1000.0
                    - 0.6 * (1.0 - phase / click_len as f32);
            }
        }

        let sample = (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}
