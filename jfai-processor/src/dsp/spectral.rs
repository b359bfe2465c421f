//! Frame-wise spectral and time-domain descriptors

const ROLLOFF_FRACTION: f32 = 0.85;
const ZCR_THRESHOLD: f32 = 1e-10;

/// Mean spectral centroid (Hz) over magnitude frames
///
/// Silent frames contribute 0 Hz.
pub fn centroid_mean(magnitudes: &[Vec<f32>], freqs: &[f32]) -> f64 {
    mean(magnitudes.iter().map(|frame| {
        let total: f64 = frame.iter().map(|&m| m as f64).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = frame
            .iter()
            .zip(freqs)
            .map(|(&m, &f)| m as f64 * f as f64)
            .sum();
        weighted / total
    }))
}

/// Mean frequency (Hz) below which 85% of each frame's magnitude lies
pub fn rolloff_mean(magnitudes: &[Vec<f32>], freqs: &[f32]) -> f64 {
    mean(magnitudes.iter().map(|frame| {
        let total: f64 = frame.iter().map(|&m| m as f64).sum();
        let target = total * ROLLOFF_FRACTION as f64;
        let mut cumulative = 0.0_f64;
        for (&m, &f) in frame.iter().zip(freqs) {
            cumulative += m as f64;
            if cumulative >= target {
                return f as f64;
            }
        }
        freqs.last().copied().unwrap_or(0.0) as f64
    }))
}

/// Mean zero-crossing rate over centred frames
///
/// Frames are edge padded by half a frame. Values within ±1e-10 count as
/// zero and zero counts as positive. The rate is crossings per sample.
pub fn zero_crossing_rate_mean(samples: &[f32], frame_length: usize, hop: usize) -> f64 {
    if samples.is_empty() || frame_length == 0 || hop == 0 {
        return 0.0;
    }

    let pad = frame_length / 2;
    let first = samples[0];
    let last = samples[samples.len() - 1];
    let padded: Vec<bool> = std::iter::repeat(first)
        .take(pad)
        .chain(samples.iter().copied())
        .chain(std::iter::repeat(last).take(pad))
        .map(|s| s.abs() <= ZCR_THRESHOLD || s > 0.0)
        .collect();

    if padded.len() < frame_length {
        return 0.0;
    }

    let frames = 1 + (padded.len() - frame_length) / hop;
    mean((0..frames).map(|frame| {
        let window = &padded[frame * hop..frame * hop + frame_length];
        let crossings = window.windows(2).filter(|w| w[0] != w[1]).count();
        crossings as f64 / frame_length as f64
    }))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
