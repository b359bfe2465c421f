//! Mel filterbank and MFCC
//!
//! Slaney mel scale with area-normalised triangular filters, power
//! spectrogram input, dB compression with an 80 dB floor and an orthonormal
//! DCT-II.

use super::stft::fft_frequencies;

/// Mel bands used for MFCC and onset detection
pub const N_MELS: usize = 128;
/// Dynamic range kept below the loudest mel cell
pub const TOP_DB: f32 = 80.0;

const AMIN: f32 = 1e-10;

pub struct MelBank {
    /// Per band: (first bin, weights from that bin on)
    filters: Vec<(usize, Vec<f32>)>,
}

impl MelBank {
    /// Filterbank spanning 0 Hz to Nyquist
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fft_freqs = fft_frequencies(sample_rate, n_fft);
        let f_max = sample_rate as f32 / 2.0;
        let mel_max = hz_to_mel(f_max);
        let mel_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let mut filters = Vec::with_capacity(n_mels);
        for m in 0..n_mels {
            let (lower, center, upper) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
            let enorm = 2.0 / (upper - lower).max(f32::EPSILON);

            let mut first = None;
            let mut weights = Vec::new();
            for (bin, &freq) in fft_freqs.iter().enumerate() {
                let rising = (freq - lower) / (center - lower).max(f32::EPSILON);
                let falling = (upper - freq) / (upper - center).max(f32::EPSILON);
                let w = rising.min(falling).max(0.0) * enorm;
                if w > 0.0 {
                    if first.is_none() {
                        first = Some(bin);
                    }
                    weights.push(w);
                } else if first.is_some() {
                    break;
                }
            }
            filters.push((first.unwrap_or(0), weights));
        }

        Self { filters }
    }

    pub fn bands(&self) -> usize {
        self.filters.len()
    }

    /// Mel energies of one power spectrum frame
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|(first, weights)| {
                weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| power.get(first + i).copied().unwrap_or(0.0) * w)
                    .sum()
            })
            .collect()
    }
}

/// Power spectrogram → mel spectrogram in dB, floored at `max - TOP_DB`
pub fn log_mel_spectrogram(magnitudes: &[Vec<f32>], bank: &MelBank) -> Vec<Vec<f32>> {
    let mut db: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| {
            let power: Vec<f32> = frame.iter().map(|m| m * m).collect();
            bank.apply(&power)
                .into_iter()
                .map(|e| 10.0 * e.max(AMIN).log10())
                .collect()
        })
        .collect();

    let peak = db
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() {
        let floor = peak - TOP_DB;
        for frame in &mut db {
            for value in frame.iter_mut() {
                *value = value.max(floor);
            }
        }
    }

    db
}

/// Orthonormal DCT-II, first `count` coefficients
pub fn dct_ortho(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; count];
    }
    let nf = n as f64;
    (0..count)
        .map(|k| {
            let sum: f64 = values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    v as f64 * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * nf)).cos()
                })
                .sum();
            let scale = if k == 0 { (1.0 / nf).sqrt() } else { (2.0 / nf).sqrt() };
            (sum * scale) as f32
        })
        .collect()
}

/// Per-coefficient mean of the MFCC frames
pub fn mfcc_mean(log_mel: &[Vec<f32>], n_mfcc: usize) -> Vec<f64> {
    let mut sums = vec![0.0_f64; n_mfcc];
    if log_mel.is_empty() {
        return sums;
    }
    for frame in log_mel {
        for (sum, c) in sums.iter_mut().zip(dct_ortho(frame, n_mfcc)) {
            *sum += c as f64;
        }
    }
    let frames = log_mel.len() as f64;
    sums.iter_mut().for_each(|s| *s /= frames);
    sums
}

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4_f32.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz < MIN_LOG_HZ {
        hz / F_SP
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    }
}
