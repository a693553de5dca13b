//! Per-file transform from an audio path to a training sample

use std::path::Path;

use ndarray::{Array1, Array2, Array3, Axis, s};
use rand::Rng;

use crate::audio::{MelSpectrogram, decode_to_f32_mono, fit_length, normalize_peak, trim_silence};
use crate::config::{OutputMode, PreprocessConfig, Validation};
use crate::error::Degeneracy;
use crate::quantize::{digitize, quantization_levels};
use crate::{Error, Result};

/// Prediction target of a [`Sample`].
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Next-sample amplitudes, shaped (1, N-1, 1)
    Continuous(Array3<f32>),
    /// Next-sample bin indices in `[0, bins]`, shaped (1, N-1, 1)
    Categorical(Array3<i64>),
}

impl Target {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Target::Continuous(t) => t.dim(),
            Target::Categorical(t) => t.dim(),
        }
    }

    pub fn as_continuous(&self) -> Option<&Array3<f32>> {
        match self {
            Target::Continuous(t) => Some(t),
            Target::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&Array3<i64>> {
        match self {
            Target::Categorical(t) => Some(t),
            Target::Continuous(_) => None,
        }
    }
}

/// One preprocessed file.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Waveform without its last sample, shaped (1, N-1, 1)
    pub input: Array3<f32>,
    /// Rescaled log-mel spectrogram, shaped (1, n_mels, frames)
    pub spectrogram: Array3<f32>,
    /// Waveform (or its bin indices) without its first sample
    pub target: Target,
    /// Edge cases tolerated under [`Validation::Permissive`]
    pub degeneracies: Vec<Degeneracy>,
}

impl Sample {
    pub fn into_parts(self) -> (Array3<f32>, Array3<f32>, Target) {
        (self.input, self.spectrogram, self.target)
    }

    pub fn is_degenerate(&self) -> bool {
        !self.degeneracies.is_empty()
    }
}

/// Decode, trim, normalize, fit, featurize and split one audio file.
///
/// Holds no per-call state, so one instance can serve any number of callers.
#[derive(Debug, Clone)]
pub struct Preprocess {
    config: PreprocessConfig,
    mel: MelSpectrogram,
}

impl Preprocess {
    pub fn new(config: PreprocessConfig) -> Self {
        let mel = MelSpectrogram::new(
            config.sample_rate,
            config.n_fft,
            config.hop_length,
            config.n_mels,
            config.spectrogram_top_db,
        );
        Self { config, mel }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// [`Preprocess::transform`] with the thread-local generator.
    pub fn process<P: AsRef<Path>>(&self, path: P) -> Result<Sample> {
        self.transform(path, &mut rand::rng())
    }

    /// Turn the audio file at `path` into `(input, spectrogram, target)`.
    ///
    /// `rng` picks the crop offset when the clip is longer than the
    /// configured length; it is not touched otherwise.
    pub fn transform<P: AsRef<Path>, R: Rng>(&self, path: P, rng: &mut R) -> Result<Sample> {
        let path = path.as_ref();
        let mut degeneracies = Vec::new();

        let decoded = decode_to_f32_mono(path, self.config.sample_rate).map_err(|source| {
            Error::Decode {
                path: path.to_path_buf(),
                source: source.into(),
            }
        })?;

        let mut raw = trim_silence(&decoded, self.config.top_db).to_vec();
        tracing::debug!(
            path = %path.display(),
            decoded = decoded.len(),
            trimmed = raw.len(),
            "trimmed silence"
        );
        if raw.is_empty() {
            self.tolerate(Degeneracy::EmptyAfterTrim, path, &mut degeneracies)?;
        }

        let peak = normalize_peak(&mut raw);
        if peak == 0.0 && !raw.is_empty() {
            self.tolerate(Degeneracy::Silent, path, &mut degeneracies)?;
        }

        if let Some(length) = self.config.length() {
            raw = fit_length(raw, length, rng);
        }

        let mut spectrogram = self.mel.compute(&raw)?;
        if let Some(frames) = self.config.spectrogram_frames() {
            let actual = spectrogram.ncols();
            if actual < frames {
                let short = Degeneracy::ShortSpectrogram {
                    expected: frames,
                    actual,
                };
                self.tolerate(short, path, &mut degeneracies)?;
            }
            spectrogram = truncate_frames(spectrogram, frames);
        }

        let waveform = Array1::from(raw).insert_axis(Axis(0)).insert_axis(Axis(2));
        let spectrogram = spectrogram.insert_axis(Axis(0));
        let input = waveform.slice(s![.., ..-1, ..]).to_owned();

        let target = match self.config.output_mode {
            OutputMode::Continuous => Target::Continuous(waveform.slice(s![.., 1.., ..]).to_owned()),
            OutputMode::Categorical { bins } => {
                let levels = quantization_levels(bins);
                let digitized = waveform.mapv(|x| digitize(x, &levels) as i64);
                Target::Categorical(digitized.slice(s![.., 1.., ..]).to_owned())
            }
        };

        tracing::debug!(
            path = %path.display(),
            input = ?input.dim(),
            spectrogram = ?spectrogram.dim(),
            "preprocessed sample"
        );

        Ok(Sample {
            input,
            spectrogram,
            target,
            degeneracies,
        })
    }

    fn tolerate(
        &self,
        degeneracy: Degeneracy,
        path: &Path,
        seen: &mut Vec<Degeneracy>,
    ) -> Result<()> {
        match self.config.validation {
            Validation::Strict => Err(Error::Degenerate(degeneracy)),
            Validation::Permissive => {
                tracing::warn!(path = %path.display(), "{degeneracy}");
                seen.push(degeneracy);
                Ok(())
            }
        }
    }
}

/// Keep at most the first `frames` columns.
fn truncate_frames(spectrogram: Array2<f32>, frames: usize) -> Array2<f32> {
    let keep = frames.min(spectrogram.ncols());
    spectrogram.slice(s![.., ..keep]).to_owned()
}
