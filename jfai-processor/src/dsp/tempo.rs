//! Global tempo estimation
//!
//! Onset strength is the positive spectral flux of the log-mel spectrogram,
//! averaged over bands. The envelope is smoothed with a small Gaussian so
//! beats that fall between frames still line up, then its autocorrelation is
//! weighted by a log-normal prior around 120 BPM and the best lag is refined
//! by parabolic interpolation.

/// Lowest tempo considered
pub const MIN_BPM: f64 = 30.0;
/// Highest tempo considered
pub const MAX_BPM: f64 = 300.0;
/// Centre of the tempo prior
pub const PRIOR_BPM: f64 = 120.0;
/// Prior width in octaves
pub const PRIOR_STD_OCTAVES: f64 = 1.0;

/// Onset strength per frame (first frame is 0)
pub fn onset_strength(log_mel: &[Vec<f32>]) -> Vec<f32> {
    let mut envelope = Vec::with_capacity(log_mel.len());
    if log_mel.is_empty() {
        return envelope;
    }
    envelope.push(0.0);
    for pair in log_mel.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let bands = cur.len().max(1) as f32;
        let flux: f32 = cur
            .iter()
            .zip(prev.iter())
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        envelope.push(flux / bands);
    }
    envelope
}

/// Tempo in BPM from an onset envelope sampled every `hop` samples
///
/// Returns 0.0 when there is no usable periodicity (silence, constant
/// signal, or an envelope shorter than the slowest tempo's period).
pub fn estimate_tempo(envelope: &[f32], sample_rate: u32, hop: usize) -> f64 {
    if envelope.len() < 3 || sample_rate == 0 || hop == 0 {
        return 0.0;
    }
    let frame_rate = sample_rate as f64 / hop as f64;
    let min_lag = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / MIN_BPM).ceil() as usize).min(envelope.len() - 2);
    if min_lag >= max_lag {
        return 0.0;
    }

    let smoothed = smooth(envelope);
    let mean = smoothed.iter().sum::<f64>() / smoothed.len() as f64;
    let centered: Vec<f64> = smoothed.iter().map(|v| v - mean).collect();
    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= f64::EPSILON {
        return 0.0;
    }

    let autocorr = |lag: usize| -> f64 {
        let n = centered.len() - lag;
        let sum: f64 = centered[..n]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum();
        sum / n as f64
    };

    let scores: Vec<(usize, f64)> = (min_lag - 1..=max_lag + 1)
        .map(|lag| (lag, autocorr(lag)))
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for window in scores.windows(3) {
        let (lag, value) = window[1];
        if value <= 0.0 || lag < min_lag || lag > max_lag {
            continue;
        }
        let weighted = value * tempo_prior(60.0 * frame_rate / lag as f64);
        if best.map_or(true, |(_, w)| weighted > w) {
            best = Some((lag, weighted));
        }
    }

    let Some((lag, _)) = best else {
        return 0.0;
    };

    let index = lag - (min_lag - 1);
    let (left, center, right) = (scores[index - 1].1, scores[index].1, scores[index + 1].1);
    let denom = left - 2.0 * center + right;
    let offset = if denom.abs() > f64::EPSILON {
        (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    60.0 * frame_rate / (lag as f64 + offset)
}

/// Gaussian smoothing, sigma of one frame
fn smooth(envelope: &[f32]) -> Vec<f64> {
    const RADIUS: isize = 3;
    let kernel: Vec<f64> = (-RADIUS..=RADIUS)
        .map(|d| (-0.5 * (d * d) as f64).exp())
        .collect();
    let len = envelope.len() as isize;
    (0..len)
        .map(|i| {
            (-RADIUS..=RADIUS)
                .zip(&kernel)
                .filter_map(|(d, k)| {
                    let j = i + d;
                    (0..len).contains(&j).then(|| envelope[j as usize] as f64 * k)
                })
                .sum::<f64>()
        })
        .collect()
}

fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_BPM).log2();
    (-0.5 * (octaves / PRIOR_STD_OCTAVES).powi(2)).exp()
}
