//! Trimming, normalization and length fitting on raw waveforms

use std::ops::RangeInclusive;

use rand::Rng;

use super::mel::reflect_pad;

/// Analysis frame used to detect silence.
pub const TRIM_FRAME_LENGTH: usize = 2048;
/// Hop between silence-detection frames.
pub const TRIM_HOP_LENGTH: usize = 512;

const AMIN: f32 = 1e-10;

/// Cut leading and trailing silence.
///
/// A frame is silent when its mean-square energy sits more than `top_db`
/// below the loudest frame. Frames are centred on multiples of the hop and
/// reflect padded at the edges. Returns an empty slice when every frame is
/// silent.
pub fn trim_silence(signal: &[f32], top_db: f32) -> &[f32] {
    if signal.is_empty() {
        return signal;
    }

    let energy = frame_energy(signal, TRIM_FRAME_LENGTH, TRIM_HOP_LENGTH);
    let peak = energy.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let ref_db = 10.0 * peak.max(AMIN).log10();

    let mut loud = energy
        .iter()
        .enumerate()
        .filter(|&(_, &e)| 10.0 * e.max(AMIN).log10() - ref_db > -top_db)
        .map(|(t, _)| t);

    let Some(first) = loud.next() else {
        return &signal[..0];
    };
    let last = loud.last().unwrap_or(first);

    let start = (first * TRIM_HOP_LENGTH).min(signal.len());
    let end = ((last + 1) * TRIM_HOP_LENGTH).min(signal.len());
    &signal[start..end]
}

/// Mean-square energy of centred frames, `1 + len / hop` of them.
///
/// Edges are reflect padded by half a frame, like the STFT.
fn frame_energy(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let padded = reflect_pad(signal, frame_length / 2);
    let num_frames = 1 + signal.len() / hop_length;

    (0..num_frames)
        .map(|t| {
            let start = t * hop_length;
            let end = (start + frame_length).min(padded.len());
            let sum: f32 = padded[start..end].iter().map(|x| x * x).sum();
            sum / frame_length as f32
        })
        .collect()
}

/// Divide by the peak absolute amplitude so the loudest sample is exactly 1.
///
/// Returns the peak. An all-zero signal has peak 0 and comes back as NaN.
pub fn normalize_peak(signal: &mut [f32]) -> f32 {
    let peak = signal.iter().fold(0.0f32, |m, x| m.max(x.abs()));
    for x in signal.iter_mut() {
        *x /= peak;
    }
    peak
}

/// Start offsets a random crop of `length` out of `len` samples draws from.
///
/// The range stops one short of the last valid offset, `len - length`.
pub fn crop_offsets(len: usize, length: usize) -> RangeInclusive<usize> {
    0..=len - length - 1
}

/// Zero pad on the right up to `length`, or crop a random window of it.
pub fn fit_length<R: Rng>(mut raw: Vec<f32>, length: usize, rng: &mut R) -> Vec<f32> {
    if raw.len() <= length {
        raw.resize(length, 0.0);
        return raw;
    }
    let start = rng.random_range(crop_offsets(raw.len(), length));
    tracing::trace!(start, len = raw.len(), length, "random crop");
    raw[start..start + length].to_vec()
}
