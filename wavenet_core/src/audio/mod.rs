//! Audio decoding, waveform conditioning and spectral features

mod decoder;
mod dsp;
pub mod mel;

pub use decoder::decode_to_f32_mono;
pub use dsp::{
    TRIM_FRAME_LENGTH, TRIM_HOP_LENGTH, crop_offsets, fit_length, normalize_peak, trim_silence,
};
pub use mel::MelSpectrogram;
