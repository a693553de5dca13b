//! Waveform preprocessing for an autoregressive WaveNet-style model.
//!
//! [`Preprocess`] turns an audio file into a model input waveform, a mel
//! spectrogram for conditioning, and a one-sample-ahead target that is
//! either the waveform itself or its quantized bin indices.
//!
//! ```no_run
//! use wavenet_core::{Preprocess, PreprocessConfig};
//!
//! let config = PreprocessConfig::new(22050, 1024, 256, 80, 60.0, Some(16000), Some(256));
//! let preprocess = Preprocess::new(config);
//! let sample = preprocess.process("LJ001-0001.wav")?;
//! assert_eq!(sample.input.dim(), (1, 16000, 1));
//! # Ok::<(), wavenet_core::Error>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod quantize;
pub mod tensor;

pub use config::{OutputMode, PreprocessConfig, Validation};
pub use error::{Degeneracy, Error, Result};
pub use preprocess::{Preprocess, Sample, Target};
pub use tensor::TargetTensor;
