//! Error types for the preprocessing pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Edge cases a real-world corpus can hit that do not abort the pipeline
/// unless strict validation is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degeneracy {
    /// Silence trimming removed every sample.
    EmptyAfterTrim,
    /// Peak amplitude is zero, so normalization produced non-finite samples.
    Silent,
    /// The spectrogram has fewer frames than the configured length asks for.
    ShortSpectrogram { expected: usize, actual: usize },
}

impl std::fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degeneracy::EmptyAfterTrim => write!(f, "waveform is empty after silence trimming"),
            Degeneracy::Silent => write!(f, "waveform peak amplitude is zero"),
            Degeneracy::ShortSpectrogram { expected, actual } => {
                write!(f, "spectrogram has {actual} frames, expected {expected}")
            }
        }
    }
}

/// Main error type for wavenet preprocessing
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decode {}: {source:#}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot compute a spectrogram of an empty signal")]
    EmptySignal,

    #[error("FFT error: {0}")]
    Fft(String),

    #[error("degenerate input: {0}")]
    Degenerate(Degeneracy),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wavenet preprocessing
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<realfft::FftError> for Error {
    fn from(err: realfft::FftError) -> Self {
        Error::Fft(err.to_string())
    }
}
