//! Signal processing for audio feature extraction
//!
//! All functions operate on mono f32 samples at a known sample rate and are
//! pure: no I/O, no logging.

pub mod mel;
pub mod spectral;
pub mod stft;
pub mod tempo;

pub use stft::{HOP_LENGTH, N_FFT};
