//! Preprocessing configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// What the transform emits as the prediction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputMode {
    /// Next-sample regression on the normalized waveform.
    #[default]
    Continuous,
    /// Next-sample classification over `bins` amplitude bins.
    Categorical { bins: usize },
}

impl OutputMode {
    /// Map a loosely specified categorical dimension onto an output mode.
    ///
    /// Anything that is not a dimension above one means continuous output.
    pub fn from_categorical_dim(dim: Option<usize>) -> Self {
        match dim {
            Some(bins) if bins > 1 => OutputMode::Categorical { bins },
            _ => OutputMode::Continuous,
        }
    }

    /// Width of the model output: the bin count, or 1 for continuous output.
    pub fn output_dim(&self) -> usize {
        match self {
            OutputMode::Continuous => 1,
            OutputMode::Categorical { bins } => *bins,
        }
    }
}

/// How the transform reacts to degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    /// Keep going and record the degeneracy on the sample.
    #[default]
    Permissive,
    /// Fail with [`crate::Error::Degenerate`].
    Strict,
}

/// Audio and feature parameters, fixed for the lifetime of a
/// [`crate::Preprocess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Sample rate the audio is resampled to
    pub sample_rate: u32,
    /// FFT size
    pub n_fft: usize,
    /// Hop length for STFT
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Silence threshold in dB below the loudest frame
    pub top_db: f32,
    /// Samples per model input; the raw crop is one sample longer
    pub target_length: Option<usize>,
    /// Continuous or categorical targets
    pub output_mode: OutputMode,
    /// Reaction to silent or too-short input
    pub validation: Validation,
    /// Optional floor for the spectrogram, in dB below its peak.
    /// `None` leaves quiet bins below -80 dB negative after rescaling.
    pub spectrogram_top_db: Option<f32>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_fft: 1024,
            hop_length: 256,
            n_mels: 80,
            top_db: 60.0,
            target_length: Some(16000),
            output_mode: OutputMode::Continuous,
            validation: Validation::Permissive,
            spectrogram_top_db: None,
        }
    }
}

impl PreprocessConfig {
    pub fn new(
        sample_rate: u32,
        n_fft: usize,
        hop_length: usize,
        n_mels: usize,
        top_db: f32,
        target_length: Option<usize>,
        categorical_output_dim: Option<usize>,
    ) -> Self {
        Self {
            sample_rate,
            n_fft,
            hop_length,
            n_mels,
            top_db,
            target_length,
            output_mode: OutputMode::from_categorical_dim(categorical_output_dim),
            ..Self::default()
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_spectrogram_top_db(mut self, top_db: Option<f32>) -> Self {
        self.spectrogram_top_db = top_db;
        self
    }

    /// Raw waveform length after padding or cropping: one sample more than
    /// `target_length`, so input and target can be shifted against each other.
    pub fn length(&self) -> Option<usize> {
        self.target_length.map(|length| length + 1)
    }

    pub fn output_dim(&self) -> usize {
        self.output_mode.output_dim()
    }

    /// Spectrogram frames kept when a length is configured.
    pub fn spectrogram_frames(&self) -> Option<usize> {
        self.length().map(|length| length / self.hop_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_length_adds_one_sample() {
        let config = PreprocessConfig::new(22050, 1024, 256, 80, 60.0, Some(16000), None);
        assert_eq!(config.length(), Some(16001));
        assert_eq!(config.spectrogram_frames(), Some(62));

        let config = PreprocessConfig::new(22050, 1024, 256, 80, 60.0, None, None);
        assert_eq!(config.length(), None);
        assert_eq!(config.spectrogram_frames(), None);
    }

    #[test]
    fn categorical_dim_maps_to_output_mode() {
        assert_eq!(OutputMode::from_categorical_dim(None), OutputMode::Continuous);
        assert_eq!(OutputMode::from_categorical_dim(Some(0)), OutputMode::Continuous);
        assert_eq!(OutputMode::from_categorical_dim(Some(1)), OutputMode::Continuous);
        assert_eq!(
            OutputMode::from_categorical_dim(Some(256)),
            OutputMode::Categorical { bins: 256 }
        );
        assert_eq!(OutputMode::Continuous.output_dim(), 1);
        assert_eq!(OutputMode::Categorical { bins: 256 }.output_dim(), 256);
    }

    #[test]
    fn json_config_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preprocess.json");
        std::fs::write(
            &path,
            r#"{ "sample_rate": 16000, "target_length": null,
                 "output_mode": { "mode": "categorical", "bins": 256 } }"#,
        )
        .expect("write config");

        let config = PreprocessConfig::from_json_file(&path).expect("load config");
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.target_length, None);
        assert_eq!(config.output_dim(), 256);
        assert_eq!(config.n_fft, 1024);
        assert_eq!(config.validation, Validation::Permissive);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ sample_rate: ").expect("write config");

        let err = PreprocessConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
