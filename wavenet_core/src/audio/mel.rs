//! Mel-spectrogram conditioning features
//!
//! Centred STFT with reflect padding and a periodic Hann window, power
//! spectrum, Slaney mel filterbank from `mel_spec`, then decibels relative
//! to the spectrogram's own peak rescaled by `(db + 80) / 80`.

use std::f32::consts::PI;
use std::sync::Arc;

use ndarray::Array2;
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::{Error, Result};

/// Power floor used before taking logarithms.
const AMIN: f32 = 1e-10;

/// Dynamic range the affine rescale maps onto `[0, 1]`.
const DB_RANGE: f32 = 80.0;

/// Mel spectrogram extractor with its filterbank and FFT plan built once.
#[derive(Clone)]
pub struct MelSpectrogram {
    /// Filterbank matrix (n_mels x n_fft/2+1)
    filters: Array2<f32>,
    window: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    n_fft: usize,
    hop_length: usize,
    top_db: Option<f32>,
}

impl std::fmt::Debug for MelSpectrogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MelSpectrogram")
            .field("n_mels", &self.n_mels())
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .field("top_db", &self.top_db)
            .finish()
    }
}

impl MelSpectrogram {
    pub fn new(
        sample_rate: u32,
        n_fft: usize,
        hop_length: usize,
        n_mels: usize,
        top_db: Option<f32>,
    ) -> Self {
        let filters = mel_spec::mel::mel(sample_rate as f64, n_fft, n_mels, None, None, false, true)
            .mapv(|w| w as f32);
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(n_fft);

        Self {
            filters,
            window: hann_window(n_fft),
            fft,
            n_fft,
            hop_length,
            top_db,
        }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.nrows()
    }

    /// Rescaled log-mel spectrogram shaped (n_mels, 1 + len / hop_length).
    pub fn compute(&self, signal: &[f32]) -> Result<Array2<f32>> {
        let power = self.power_spectrogram(signal)?;
        let mel = self.filters.dot(&power);
        Ok(rescale_db(power_to_db(&mel, self.top_db)))
    }

    /// Power STFT shaped (n_fft/2+1, frames).
    pub fn power_spectrogram(&self, signal: &[f32]) -> Result<Array2<f32>> {
        if signal.is_empty() {
            return Err(Error::EmptySignal);
        }

        let padded = reflect_pad(signal, self.n_fft / 2);
        let num_frames = if padded.len() < self.n_fft {
            0
        } else {
            (padded.len() - self.n_fft) / self.hop_length + 1
        };
        let n_freqs = self.n_fft / 2 + 1;

        let mut power = Array2::zeros((n_freqs, num_frames));
        let mut frame = self.fft.make_input_vec();
        let mut spectrum = vec![Complex::new(0.0f32, 0.0f32); n_freqs];

        for t in 0..num_frames {
            let start = t * self.hop_length;
            for (dst, (&x, &w)) in frame
                .iter_mut()
                .zip(padded[start..start + self.n_fft].iter().zip(&self.window))
            {
                *dst = x * w;
            }

            self.fft.process(&mut frame, &mut spectrum)?;

            for (k, bin) in spectrum.iter().enumerate() {
                power[[k, t]] = bin.norm_sqr();
            }
        }

        Ok(power)
    }
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / size as f32).cos())
        .collect()
}

/// Mirror `pad` samples onto both ends, excluding the edge sample itself.
///
/// Signals shorter than the padding keep bouncing between both ends.
pub(crate) fn reflect_pad(signal: &[f32], pad: usize) -> Vec<f32> {
    let n = signal.len() as isize;
    let pad = pad as isize;
    (-pad..n + pad)
        .map(|i| signal[reflect_index(i, n)])
        .collect()
}

fn reflect_index(i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    if m < n { m as usize } else { (period - m) as usize }
}

/// `10 * log10(S / max(S))` with a power floor of `AMIN`.
///
/// With `top_db` set, values more than `top_db` below the peak are clamped.
pub fn power_to_db(power: &Array2<f32>, top_db: Option<f32>) -> Array2<f32> {
    let peak = power.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let ref_db = 10.0 * floor_amin(peak).log10();

    let mut db = power.mapv(|p| 10.0 * floor_amin(p).log10() - ref_db);

    if let Some(top_db) = top_db {
        let max_db = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        db.mapv_inplace(|v| v.max(max_db - top_db));
    }
    db
}

/// Map decibels from `[-80, 0]` onto `[0, 1]`. Nothing is clamped.
pub fn rescale_db(mut db: Array2<f32>) -> Array2<f32> {
    db.mapv_inplace(|v| (v + DB_RANGE) / DB_RANGE);
    db
}

// NaN propagates, unlike f32::max.
fn floor_amin(p: f32) -> f32 {
    if p < AMIN { AMIN } else { p }
}
