//! Short-time Fourier transform
//!
//! Centered, reflect-padded frames of `N_FFT` samples every `HOP_LENGTH`,
//! Hann windowed, returned as magnitude spectra.

use rustfft::{num_complex::Complex32, FftPlanner};

/// FFT size for all spectral features
pub const N_FFT: usize = 2048;
/// Hop between analysis frames
pub const HOP_LENGTH: usize = 512;

/// Periodic Hann window
pub fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0_f32; length.max(1)];
    }
    let n = length as f32;
    (0..length)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n).cos())
        .collect()
}

/// Pad `pad` samples on both sides by reflection (edge sample excluded)
///
/// Signals too short to reflect are zero padded.
pub fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() + 2 * pad);
    if samples.len() <= pad {
        out.extend(std::iter::repeat(0.0).take(pad));
        out.extend_from_slice(samples);
        out.extend(std::iter::repeat(0.0).take(pad));
        return out;
    }
    out.extend((1..=pad).rev().map(|i| samples[i]));
    out.extend_from_slice(samples);
    let last = samples.len() - 1;
    out.extend((1..=pad).map(|i| samples[last - i]));
    out
}

/// Magnitude spectrogram, one `Vec` of `n_fft / 2 + 1` bins per frame
///
/// Frames are centred: the signal is reflect padded by `n_fft / 2`.
pub fn magnitude_spectrogram(samples: &[f32], n_fft: usize, hop: usize) -> Vec<Vec<f32>> {
    if samples.is_empty() || n_fft == 0 || hop == 0 {
        return Vec::new();
    }

    let padded = reflect_pad(samples, n_fft / 2);
    if padded.len() < n_fft {
        return Vec::new();
    }

    let window = hann_window(n_fft);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];
    let mut scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    let frame_count = 1 + (padded.len() - n_fft) / hop;
    let bins = n_fft / 2 + 1;
    let mut frames = Vec::with_capacity(frame_count);

    for frame in 0..frame_count {
        let start = frame * hop;
        for (i, cell) in buffer.iter_mut().enumerate() {
            let sample = padded[start + i];
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *cell = Complex32::new(sample * window[i], 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);
        frames.push(buffer[..bins].iter().map(|c| c.norm()).collect());
    }

    frames
}

/// Center frequency in Hz of each FFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    let bins = n_fft / 2 + 1;
    (0..bins)
        .map(|bin| bin as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}
