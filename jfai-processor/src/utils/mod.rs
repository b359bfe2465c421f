//! Utility modules for jfai-processor

pub mod audio_decoder;

pub use audio_decoder::{decode_audio_file, load_mono, resample_mono, DecodedAudio};
